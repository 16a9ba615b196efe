//! 置換表エントリー
//!
//! TTEntry: `AtomicU64` 2語のエントリ
//! TTData: 読み取り用のデータ構造
//!
//! データ語のビット配置:
//!
//! | bit    | 内容                                   |
//! |--------|----------------------------------------|
//! | 0-15   | 最善手（i16）                          |
//! | 16-31  | 探索値（i16）                          |
//! | 32-47  | 評価値（i16）                          |
//! | 48-55  | depth8（`depth - DEPTH_ENTRY_OFFSET`） |
//! | 56-63  | generation(5bit) \| pv(1bit) \| bound(2bit) |

use std::sync::atomic::{AtomicU64, Ordering};

use super::{GENERATION_CYCLE, GENERATION_MASK};
use crate::types::{Bound, DEPTH_ENTRY_OFFSET, Depth, Move, Value};

/// データ語を詰める
#[inline]
const fn pack(mv: Move, value: i16, eval: i16, depth8: u8, gen_bound8: u8) -> u64 {
    (mv.to_i16() as u16 as u64)
        | ((value as u16 as u64) << 16)
        | ((eval as u16 as u64) << 32)
        | ((depth8 as u64) << 48)
        | ((gen_bound8 as u64) << 56)
}

#[inline]
const fn depth8_of(data: u64) -> u8 {
    (data >> 48) as u8
}

#[inline]
const fn gen_bound8_of(data: u64) -> u8 {
    (data >> 56) as u8
}

/// 相対的な世代（0 = 最新）
#[inline]
const fn relative_age_of(gen_bound8: u8, generation8: u8) -> u8 {
    let age = GENERATION_CYCLE
        .wrapping_add(generation8 as u16)
        .wrapping_sub(gen_bound8 as u16);
    (age & GENERATION_MASK) as u8
}

/// 置換表エントリー
///
/// `key_xor` には `key ^ data` を保存する。読み手は2語を別々に読み、
/// XOR して元のキーに戻るものだけを採用する。
#[derive(Default)]
#[repr(C)]
pub struct TTEntry {
    key_xor: AtomicU64,
    data: AtomicU64,
}

// エントリサイズが16バイトであることを保証
const _: () = assert!(std::mem::size_of::<TTEntry>() == 16);

impl TTEntry {
    /// 新しい空のエントリを作成
    #[inline]
    pub const fn new() -> Self {
        Self {
            key_xor: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    /// (キー, データ) を読む
    #[inline]
    fn load(&self) -> (u64, u64) {
        let data = self.data.load(Ordering::Relaxed);
        let key = self.key_xor.load(Ordering::Relaxed) ^ data;
        (key, data)
    }

    #[inline]
    fn store(&self, key: u64, data: u64) {
        self.data.store(data, Ordering::Relaxed);
        self.key_xor.store(key ^ data, Ordering::Relaxed);
    }

    /// 空にする
    #[inline]
    pub(super) fn clear(&self) {
        self.data.store(0, Ordering::Relaxed);
        self.key_xor.store(0, Ordering::Relaxed);
    }

    /// エントリが使用されているか
    #[inline]
    pub fn is_occupied(&self) -> bool {
        depth8_of(self.data.load(Ordering::Relaxed)) != 0
    }

    /// キーが一致すればデータを返す
    #[inline]
    pub fn read_if(&self, key: u64) -> Option<TTData> {
        let (stored, data) = self.load();
        (depth8_of(data) != 0 && stored == key).then(|| TTData::unpack(data))
    }

    /// 置換価値（小さいものから置き換える）
    ///
    /// 空エントリは常に最小。
    #[inline]
    pub(super) fn replace_value(&self, generation8: u8) -> i32 {
        let data = self.data.load(Ordering::Relaxed);
        let depth8 = depth8_of(data);
        if depth8 == 0 {
            return i32::MIN;
        }
        let gen_bound8 = gen_bound8_of(data);
        let exact = Bound::from_u8(gen_bound8) == Bound::Exact;
        depth8 as i32 + 2 * exact as i32 - relative_age_of(gen_bound8, generation8) as i32
    }

    /// 相対的な世代（0 = 最新）
    #[inline]
    pub fn relative_age(&self, generation8: u8) -> u8 {
        relative_age_of(gen_bound8_of(self.data.load(Ordering::Relaxed)), generation8)
    }

    /// エントリに保存
    ///
    /// 同じキーのエントリは、確定値・十分深い探索・古い世代のいずれかのときだけ上書きする。
    /// 新しい手が `Move::NONE` なら既存の手を残す。
    #[allow(clippy::too_many_arguments)]
    pub fn save(
        &self,
        key: u64,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: Depth,
        mv: Move,
        eval: Value,
        generation8: u8,
    ) {
        let (old_key, old) = self.load();
        let same_key = depth8_of(old) != 0 && old_key == key;
        let old_depth8 = depth8_of(old) as i32;

        let mv = if mv.is_none() && same_key {
            Move::from_i16(old as u16 as i16)
        } else {
            mv
        };

        let d8 = depth - DEPTH_ENTRY_OFFSET;
        debug_assert!(d8 > 0 && d8 < 256);

        if bound == Bound::Exact
            || !same_key
            || d8 + 2 * (is_pv as i32) > old_depth8 - 4
            || relative_age_of(gen_bound8_of(old), generation8) != 0
        {
            let gen_bound8 = generation8 | ((is_pv as u8) << 2) | bound as u8;
            let data = pack(
                mv,
                value.raw() as i16,
                eval.raw() as i16,
                d8.clamp(1, 255) as u8,
                gen_bound8,
            );
            self.store(key, data);
        } else if mv != Move::from_i16(old as u16 as i16) {
            // 深いエントリは残し、手だけ差し替える
            let data = (old & !0xFFFF) | (mv.to_i16() as u16 as u64);
            self.store(key, data);
        }
    }
}

/// 置換表から読み取ったデータ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTData {
    /// 最善手
    pub mv: Move,
    /// 探索値
    pub value: Value,
    /// 評価値
    pub eval: Value,
    /// 探索深さ
    pub depth: Depth,
    /// 境界タイプ
    pub bound: Bound,
    /// PVノードかどうか
    pub is_pv: bool,
}

impl TTData {
    /// 空のデータ
    pub const EMPTY: Self = Self {
        mv: Move::NONE,
        value: Value::NONE,
        eval: Value::NONE,
        depth: DEPTH_ENTRY_OFFSET,
        bound: Bound::None,
        is_pv: false,
    };

    #[inline]
    fn unpack(data: u64) -> Self {
        let gen_bound8 = gen_bound8_of(data);
        Self {
            mv: Move::from_i16(data as u16 as i16),
            value: Value::new((data >> 16) as u16 as i16 as i32),
            eval: Value::new((data >> 32) as u16 as i16 as i32),
            depth: depth8_of(data) as Depth + DEPTH_ENTRY_OFFSET,
            bound: Bound::from_u8(gen_bound8),
            is_pv: (gen_bound8 & 0x4) != 0,
        }
    }
}

impl Default for TTData {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_tt_entry_new() {
        let entry = TTEntry::new();
        assert!(!entry.is_occupied());
        assert_eq!(entry.read_if(0), None);
    }

    #[test]
    fn test_tt_entry_save_and_read() {
        let entry = TTEntry::new();
        let key = 0x1234_5678_9abc_def0;
        let mv = Move::new_move(Square::new(3, 0), Square::new(3, 1));

        entry.save(key, Value::new(-120), true, Bound::Exact, 10, mv, Value::new(37), 8);

        let data = entry.read_if(key).unwrap();
        assert_eq!(data.mv, mv);
        assert_eq!(data.value, Value::new(-120));
        assert_eq!(data.eval, Value::new(37));
        assert_eq!(data.depth, 10);
        assert_eq!(data.bound, Bound::Exact);
        assert!(data.is_pv);
        assert_eq!(entry.relative_age(8), 0);

        // 別キーはミス
        assert_eq!(entry.read_if(key ^ 1), None);
    }

    #[test]
    fn test_tt_entry_remove_move_roundtrip() {
        let entry = TTEntry::new();
        let mv = Move::new_remove(Square::new(1, 7));
        entry.save(42, Value::mated_in(3), false, Bound::Upper, 0, mv, Value::NONE, 0);
        let data = entry.read_if(42).unwrap();
        assert_eq!(data.mv, mv);
        assert_eq!(data.value, Value::mated_in(3));
        assert_eq!(data.eval, Value::NONE);
        assert_eq!(data.depth, 0);
    }

    #[test]
    fn test_tt_entry_keeps_deeper_data() {
        let entry = TTEntry::new();
        let key = 99;
        let deep = Move::new_place(Square::new(2, 0));
        entry.save(key, Value::new(50), false, Bound::Lower, 12, deep, Value::ZERO, 0);

        // 浅い非確定値は上書きしない
        entry.save(key, Value::new(-10), false, Bound::Upper, 2, Move::NONE, Value::ZERO, 0);
        let data = entry.read_if(key).unwrap();
        assert_eq!(data.depth, 12);
        assert_eq!(data.value, Value::new(50));
        assert_eq!(data.mv, deep);

        // 確定値は常に上書きし、手が NONE なら既存の手を残す
        entry.save(key, Value::new(7), false, Bound::Exact, 3, Move::NONE, Value::ZERO, 0);
        let data = entry.read_if(key).unwrap();
        assert_eq!(data.depth, 3);
        assert_eq!(data.value, Value::new(7));
        assert_eq!(data.mv, deep);
    }

    #[test]
    fn test_tt_entry_older_generation_is_overwritten() {
        let entry = TTEntry::new();
        entry.save(5, Value::new(1), false, Bound::Lower, 20, Move::NONE, Value::ZERO, 0);
        entry.save(5, Value::new(2), false, Bound::Lower, 1, Move::NONE, Value::ZERO, 8);
        let data = entry.read_if(5).unwrap();
        assert_eq!(data.depth, 1);
        assert_eq!(entry.relative_age(8), 0);
        assert_eq!(entry.relative_age(16), 8);
    }

    #[test]
    fn test_tt_entry_torn_write_is_a_miss() {
        let entry = TTEntry::new();
        entry.save(77, Value::new(1), false, Bound::Exact, 4, Move::NONE, Value::ZERO, 0);
        // データ語だけ書き換わった状態を再現
        entry.data.fetch_xor(1 << 16, Ordering::Relaxed);
        assert_eq!(entry.read_if(77), None);
    }
}

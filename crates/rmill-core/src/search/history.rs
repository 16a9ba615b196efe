//! 履歴統計（History）
//!
//! 静かな手（mill を作らない配置・移動）の β カット実績を記録し、オーダリングに使う。

use crate::types::{Color, Move, MoveType};

/// ButterflyHistory の値域
pub const HISTORY_LIMIT: i32 = 4096;

/// 移動元インデックスの数（0: 配置, 1: 除去, 8..32: 移動元の交点）
const FROM_SIZE: usize = 32;
/// 移動先インデックスの数
const TO_SIZE: usize = 32;

/// 履歴統計の1エントリ
///
/// 値の範囲を [-D, D] に制限しながら更新できる。
#[derive(Clone, Copy, Default)]
pub struct StatsEntry<const D: i32> {
    value: i16,
}

impl<const D: i32> StatsEntry<D> {
    /// 値を取得
    #[inline]
    pub fn get(&self) -> i16 {
        self.value
    }

    /// ボーナス値を加算（範囲制限付き）
    ///
    /// 更新式: entry += clamp(bonus, -D, D) - entry * |clamp(bonus, -D, D)| / D
    #[inline]
    pub fn update(&mut self, bonus: i32) {
        let clamped = bonus.clamp(-D, D);
        let delta = clamped - (self.value as i32) * clamped.abs() / D;
        self.value = (self.value as i32 + delta) as i16;
        debug_assert!(self.value.abs() <= D as i16);
    }
}

/// ButterflyHistory: [Color][from][to] -> score
pub struct ButterflyHistory {
    table: [[[StatsEntry<HISTORY_LIMIT>; TO_SIZE]; FROM_SIZE]; Color::NUM],
}

#[inline]
fn from_index(mv: Move) -> usize {
    match mv.move_type() {
        MoveType::Place => 0,
        MoveType::Remove => 1,
        MoveType::Move => mv.from_sq_raw() as usize,
    }
}

impl ButterflyHistory {
    /// 新しいButterflyHistoryを作成
    pub fn new() -> Self {
        Self {
            table: [[[StatsEntry::default(); TO_SIZE]; FROM_SIZE]; Color::NUM],
        }
    }

    /// 値を取得
    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i16 {
        self.table[color.index()][from_index(mv)][mv.to_sq_raw() as usize].get()
    }

    /// 値を更新
    #[inline]
    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        self.table[color.index()][from_index(mv)][mv.to_sq_raw() as usize].update(bonus);
    }

    /// クリア
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for ButterflyHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// β カットした手へのボーナス
#[inline]
pub fn stat_bonus(depth: i32) -> i32 {
    (32 * depth * depth + 64 * depth).min(1600)
}

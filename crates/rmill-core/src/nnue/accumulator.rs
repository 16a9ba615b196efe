//! Accumulator - 入力特徴量の累積値を保持
//!
//! 特徴量を FeatureTransformer で変換した結果を視点ごとに保持する。
//! 探索中は do_move ごとに `AccumulatorStack` に差分を積み、評価時に
//! 計算済みの祖先から差分を適用する（なければ全計算）。

use super::aligned::Aligned;
use super::constants::TRANSFORMED_FEATURE_DIMENSIONS;
use super::dirty_piece::DirtyPiece;
use crate::types::{Color, MAX_PLY};

/// Accumulatorの構造
#[repr(C, align(64))]
#[derive(Clone)]
pub struct Accumulator {
    /// 累積値 [perspective][dimension]（White=0, Black=1）
    pub accumulation: [Aligned<[i16; TRANSFORMED_FEATURE_DIMENSIONS]>; Color::NUM],
    /// 視点ごとの計算済みフラグ
    pub computed: [bool; Color::NUM],
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            accumulation: [
                Aligned([0i16; TRANSFORMED_FEATURE_DIMENSIONS]),
                Aligned([0i16; TRANSFORMED_FEATURE_DIMENSIONS]),
            ],
            computed: [false; Color::NUM],
        }
    }
}

impl Accumulator {
    /// 視点ごとの累積値への参照を取得
    #[inline]
    pub fn get(&self, perspective: Color) -> &[i16; TRANSFORMED_FEATURE_DIMENSIONS] {
        &self.accumulation[perspective.index()].0
    }

    /// 視点ごとの累積値への可変参照を取得
    #[inline]
    pub fn get_mut(&mut self, perspective: Color) -> &mut [i16; TRANSFORMED_FEATURE_DIMENSIONS] {
        &mut self.accumulation[perspective.index()].0
    }
}

/// スタックの1要素
#[derive(Clone, Default)]
pub struct StackEntry {
    pub accumulator: Accumulator,
    /// この局面に至った手の差分
    pub dirty: DirtyPiece,
}

/// do_move/undo_move と対になる Accumulator のスタック
#[derive(Clone)]
pub struct AccumulatorStack {
    entries: Vec<StackEntry>,
    current: usize,
}

impl AccumulatorStack {
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_PLY as usize + 8);
        entries.push(StackEntry::default());
        Self {
            entries,
            current: 0,
        }
    }

    /// ルート局面に戻す（計算済みフラグをクリア）
    pub fn reset(&mut self) {
        self.current = 0;
        self.entries[0].accumulator.computed = [false; Color::NUM];
    }

    /// do_move に合わせて積む
    #[inline]
    pub fn push(&mut self, dirty: DirtyPiece) {
        self.current += 1;
        if self.current == self.entries.len() {
            self.entries.push(StackEntry::default());
        }
        let entry = &mut self.entries[self.current];
        entry.dirty = dirty;
        entry.accumulator.computed = [false; Color::NUM];
    }

    /// undo_move に合わせて降ろす
    #[inline]
    pub fn pop(&mut self) {
        debug_assert!(self.current > 0, "accumulator stack underflow");
        self.current = self.current.saturating_sub(1);
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn current(&self) -> &StackEntry {
        &self.entries[self.current]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut StackEntry {
        &mut self.entries[self.current]
    }

    #[inline]
    pub fn entry(&self, index: usize) -> &StackEntry {
        &self.entries[index]
    }

    /// (index - 1, index) の組を借りる
    #[inline]
    pub fn pair_mut(&mut self, index: usize) -> (&StackEntry, &mut StackEntry) {
        debug_assert!(index > 0);
        let (left, right) = self.entries.split_at_mut(index);
        (&left[index - 1], &mut right[0])
    }

    /// 視点 perspective について差分更新の起点になる計算済みエントリーを探す
    ///
    /// 途中にアンカーが変わった手があれば None（全計算が必要）。
    pub fn find_usable(&self, perspective: Color) -> Option<usize> {
        let p = perspective.index();
        let mut i = self.current;
        loop {
            let entry = &self.entries[i];
            if entry.accumulator.computed[p] {
                return Some(i);
            }
            if i == 0 || entry.dirty.requires_refresh(perspective) {
                return None;
            }
            i -= 1;
        }
    }
}

impl Default for AccumulatorStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_alignment() {
        let acc = Accumulator::default();
        let addr = &acc as *const _ as usize;
        assert_eq!(addr % 64, 0);
    }

    #[test]
    fn test_find_usable() {
        let mut stack = AccumulatorStack::new();
        assert_eq!(stack.find_usable(Color::White), None);
        stack.current_mut().accumulator.computed = [true; Color::NUM];

        stack.push(DirtyPiece::default());
        stack.push(DirtyPiece::default());
        assert_eq!(stack.find_usable(Color::White), Some(0));

        let mut dp = DirtyPiece::default();
        dp.anchor_changed[Color::Black.index()] = true;
        stack.push(dp);
        assert_eq!(stack.find_usable(Color::White), Some(0));
        assert_eq!(stack.find_usable(Color::Black), None);

        stack.pop();
        assert_eq!(stack.current_index(), 2);
        assert_eq!(stack.find_usable(Color::Black), Some(0));
    }
}

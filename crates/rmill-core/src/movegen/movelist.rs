//! 指し手リスト
//!
//! 固定長配列に合法手を詰める。生成後はスライス（`Deref`）として扱う。

use std::ops::Deref;

use crate::types::{MAX_MOVES, Move};

/// 指し手生成バッファ
pub struct MoveList {
    buf: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    #[inline]
    pub const fn new() -> Self {
        Self {
            buf: [Move::NONE; MAX_MOVES],
            len: 0,
        }
    }

    /// 指定された指し手が含まれているか
    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    /// 指し手を追加（`MAX_MOVES` を超えないこと）
    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES, "move list overflow");
        self.buf[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.buf[..self.len]
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MoveList {
    type Target = [Move];

    #[inline]
    fn deref(&self) -> &[Move] {
        self.as_slice()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

/// オーダリング用のスコア付き指し手
#[derive(Debug, Clone, Copy)]
pub struct ExtMove {
    pub mv: Move,
    pub value: i32,
}

impl ExtMove {
    #[inline]
    pub const fn new(mv: Move, value: i32) -> Self {
        Self { mv, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_movelist_push() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let mv = Move::new_place(Square::from_index(3));
        list.push(mv);
        list.push(Move::new_remove(Square::from_index(4)));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], mv);
        assert!(list.contains(mv));
        assert!(!list.contains(Move::NULL));
        assert_eq!(list.iter().filter(|m| m.is_remove()).count(), 1);
    }
}

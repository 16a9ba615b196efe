//! 1手で変化した駒の記録（差分更新用）

use crate::types::{Color, Piece, Square};

/// 盤上の1交点の変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardChange {
    pub sq: Square,
    pub old: Piece,
    pub new: Piece,
}

impl Default for BoardChange {
    fn default() -> Self {
        BoardChange {
            sq: Square::NONE,
            old: Piece::Empty,
            new: Piece::Empty,
        }
    }
}

/// 手駒数の変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandChange {
    pub color: Color,
    pub old: u8,
    pub new: u8,
}

/// do_move が返す差分
///
/// 盤上の変化は最大2交点（移動元と移動先）、手駒の変化は最大1つ。
/// `anchor_changed[c]` が立っている視点は差分更新できないので全計算する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyPiece {
    board: [BoardChange; 2],
    board_len: u8,
    pub hand: Option<HandChange>,
    pub anchor_changed: [bool; Color::NUM],
}

impl DirtyPiece {
    /// 盤上の変化を追加
    #[inline]
    pub fn push_board(&mut self, sq: Square, old: Piece, new: Piece) {
        debug_assert!((self.board_len as usize) < self.board.len());
        self.board[self.board_len as usize] = BoardChange { sq, old, new };
        self.board_len += 1;
    }

    /// 盤上の変化
    #[inline]
    pub fn board_changes(&self) -> &[BoardChange] {
        &self.board[..self.board_len as usize]
    }

    /// 視点 c の全計算が必要か
    #[inline]
    pub fn requires_refresh(&self, c: Color) -> bool {
        self.anchor_changed[c.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_board() {
        let mut dp = DirtyPiece::default();
        assert!(dp.board_changes().is_empty());
        let a = Square::from_index(0);
        let b = Square::from_index(1);
        dp.push_board(a, Piece::White, Piece::Empty);
        dp.push_board(b, Piece::Empty, Piece::White);
        assert_eq!(dp.board_changes().len(), 2);
        assert_eq!(dp.board_changes()[1].sq, b);
        assert!(!dp.requires_refresh(Color::White));
    }
}

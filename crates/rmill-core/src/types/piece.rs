//! 駒（Piece）

use super::Color;

/// 交点上の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Piece {
    #[default]
    Empty = 0,
    White = 1,
    Black = 2,
    /// 配置フェーズ中に除去された跡（禁止点ルール）
    Ban = 3,
}

impl Piece {
    /// Zobrist/特徴量テーブルの駒種数（Empty を除く）
    pub const NUM: usize = 3;

    /// 手番の駒
    #[inline]
    pub const fn from_color(c: Color) -> Piece {
        match c {
            Color::White => Piece::White,
            Color::Black => Piece::Black,
        }
    }

    /// 駒の持ち主（Empty/Ban は None）
    #[inline]
    pub const fn color(self) -> Option<Color> {
        match self {
            Piece::White => Some(Color::White),
            Piece::Black => Some(Color::Black),
            Piece::Empty | Piece::Ban => None,
        }
    }

    /// テーブル用インデックス（White=0, Black=1, Ban=2）
    #[inline]
    pub const fn table_index(self) -> usize {
        debug_assert!(!matches!(self, Piece::Empty));
        self as usize - 1
    }

    /// FEN 文字
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Piece::Empty => '*',
            Piece::White => 'O',
            Piece::Black => '@',
            Piece::Ban => 'X',
        }
    }

    /// FEN 文字から変換
    #[inline]
    pub const fn from_char(c: char) -> Option<Piece> {
        match c {
            '*' => Some(Piece::Empty),
            'O' => Some(Piece::White),
            '@' => Some(Piece::Black),
            'X' => Some(Piece::Ban),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_color() {
        assert_eq!(Piece::from_color(Color::White).color(), Some(Color::White));
        assert_eq!(Piece::from_color(Color::Black).color(), Some(Color::Black));
        assert_eq!(Piece::Ban.color(), None);
        assert_eq!(Piece::Empty.color(), None);
    }

    #[test]
    fn test_piece_char_roundtrip() {
        for pc in [Piece::Empty, Piece::White, Piece::Black, Piece::Ban] {
            assert_eq!(Piece::from_char(pc.to_char()), Some(pc));
        }
        assert_eq!(Piece::from_char('x'), None);
    }
}

//! 交点（Square）

/// 盤上の交点数（標準盤）
pub const SQUARE_NB: usize = 24;

/// 交点（8..=31）
///
/// 配置: 3重の正方形を内側から ring 1..=3 とし、各 ring を上辺中央から時計回りに 0..=7。
/// `sq = ring * 8 + pos`。偶数 pos は辺の中央（ring 間を結ぶ点）、奇数 pos は角。
///
/// ```text
/// a7 ----- d7 ----- g7      31 ----- 24 ----- 25
/// |  b6 -- d6 -- f6  |      |  23 -- 16 -- 17  |
/// |  |  c5-d5-e5  |  |      |  |  15- 8 - 9  |  |
/// a4-b4-c4    e4-f4-g4      30-22-14    10-18-26
/// |  |  c3-d3-e3  |  |      |  |  13-12-11   |  |
/// |  b2 -- d2 -- f2  |      |  21 -- 20 -- 19  |
/// a1 ----- d1 ----- g1      29 ----- 28 ----- 27
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Square(u8);

/// ring ごとの代数表記（pos 0..=7 の順）
const SQUARE_NAMES: [[&str; 8]; 3] = [
    ["d5", "e5", "e4", "e3", "d3", "c3", "c4", "c5"],
    ["d6", "f6", "f4", "f2", "d2", "b2", "b4", "b6"],
    ["d7", "g7", "g4", "g1", "d1", "a1", "a4", "a7"],
];

impl Square {
    /// 番兵（配置手の移動元など）
    pub const NONE: Square = Square(0);
    /// 最初の交点
    pub const BEGIN: u8 = 8;
    /// 最後の交点 + 1
    pub const END: u8 = 32;

    /// ring (1..=3) と ring 上の位置 (0..=7) から生成
    #[inline]
    pub const fn new(ring: u8, pos: u8) -> Square {
        debug_assert!(ring >= 1 && ring <= 3 && pos < 8);
        Square(ring * 8 + pos)
    }

    /// 盤内かどうか
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 >= Self::BEGIN && self.0 < Self::END
    }

    /// ring（1: 内側, 2: 中間, 3: 外側）
    #[inline]
    pub const fn ring(self) -> u8 {
        self.0 >> 3
    }

    /// ring 上の位置（上辺中央から時計回り）
    #[inline]
    pub const fn pos(self) -> u8 {
        self.0 & 7
    }

    /// 角の交点か
    #[inline]
    pub const fn is_corner(self) -> bool {
        self.0 & 1 == 1
    }

    /// 内部値（Bitboard のビット位置、Move のエンコードに使用）
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 0..24 の連番（特徴量・配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        debug_assert!(self.is_ok());
        (self.0 - Self::BEGIN) as usize
    }

    /// 連番から生成
    #[inline]
    pub const fn from_index(index: usize) -> Square {
        debug_assert!(index < SQUARE_NB);
        Square(index as u8 + Self::BEGIN)
    }

    /// u8から生成（範囲チェックあり）
    #[inline]
    pub const fn from_u8(n: u8) -> Option<Square> {
        if n >= Self::BEGIN && n < Self::END {
            Some(Square(n))
        } else {
            None
        }
    }

    /// 全交点を昇順に列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (Self::BEGIN..Self::END).map(Square)
    }

    /// 代数表記（"d5" 等）に変換
    pub fn name(self) -> &'static str {
        if self.is_ok() {
            SQUARE_NAMES[(self.ring() - 1) as usize][self.pos() as usize]
        } else {
            "-"
        }
    }

    /// 代数表記から変換
    pub fn from_name(s: &str) -> Option<Square> {
        SQUARE_NAMES.iter().enumerate().find_map(|(r, names)| {
            names
                .iter()
                .position(|&n| n == s)
                .map(|p| Square::new(r as u8 + 1, p as u8))
        })
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_range() {
        assert_eq!(Square::all().count(), SQUARE_NB);
        assert!(!Square::NONE.is_ok());
        assert!(Square::from_u8(7).is_none());
        assert!(Square::from_u8(32).is_none());
        assert_eq!(Square::from_u8(8), Some(Square::new(1, 0)));
    }

    #[test]
    fn test_square_ring_pos() {
        let sq = Square::new(3, 5);
        assert_eq!(sq.raw(), 29);
        assert_eq!(sq.ring(), 3);
        assert_eq!(sq.pos(), 5);
        assert!(sq.is_corner());
        assert!(!Square::new(2, 2).is_corner());
    }

    #[test]
    fn test_square_index_roundtrip() {
        for (i, sq) in Square::all().enumerate() {
            assert_eq!(sq.index(), i);
            assert_eq!(Square::from_index(i), sq);
        }
    }

    #[test]
    fn test_square_names() {
        assert_eq!(Square::new(1, 0).name(), "d5");
        assert_eq!(Square::new(3, 5).name(), "a1");
        assert_eq!(Square::from_name("g7"), Some(Square::new(3, 1)));
        assert_eq!(Square::from_name("d4"), None);
        for sq in Square::all() {
            assert_eq!(Square::from_name(sq.name()), Some(sq));
        }
    }
}

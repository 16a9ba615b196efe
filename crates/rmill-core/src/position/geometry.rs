//! 盤の幾何（隣接関係と mill のライン）
//!
//! 標準盤と斜め線付きの盤の2種類を LazyLock で遅延初期化する。

use std::sync::LazyLock;

use smallvec::SmallVec;

use crate::types::{Bitboard, Square, square_bb};

/// 盤の幾何情報
pub struct Geometry {
    /// 各交点から1歩で行ける交点
    adjacent: [Bitboard; 32],
    /// 各交点を含む mill ライン（3点の Bitboard）
    mills_of: [SmallVec<[Bitboard; 3]>; 32],
    /// 全 mill ライン
    lines: Vec<Bitboard>,
}

static STANDARD: LazyLock<Geometry> = LazyLock::new(|| Geometry::build(false));
static DIAGONAL: LazyLock<Geometry> = LazyLock::new(|| Geometry::build(true));

impl Geometry {
    /// 盤の種類に応じた幾何情報を取得
    pub fn get(has_diagonal_lines: bool) -> &'static Geometry {
        if has_diagonal_lines { &DIAGONAL } else { &STANDARD }
    }

    fn build(diagonal: bool) -> Geometry {
        let mut adjacent = [Bitboard::EMPTY; 32];
        let mut lines = Vec::new();

        for sq in Square::all() {
            let ring = sq.ring();
            let pos = sq.pos();
            let mut adj = square_bb(Square::new(ring, (pos + 1) % 8))
                | square_bb(Square::new(ring, (pos + 7) % 8));
            // 辺の中央は常に、角は斜め線があるときだけ隣の ring とつながる
            if !sq.is_corner() || diagonal {
                if ring > 1 {
                    adj |= square_bb(Square::new(ring - 1, pos));
                }
                if ring < 3 {
                    adj |= square_bb(Square::new(ring + 1, pos));
                }
            }
            adjacent[sq.raw() as usize] = adj;
        }

        // 各 ring の4辺（角-中央-角）
        for ring in 1..=3u8 {
            for mid in [0u8, 2, 4, 6] {
                lines.push(
                    square_bb(Square::new(ring, (mid + 7) % 8))
                        | square_bb(Square::new(ring, mid))
                        | square_bb(Square::new(ring, mid + 1)),
                );
            }
        }
        // ring をまたぐライン
        let radial: &[u8] = if diagonal {
            &[0, 1, 2, 3, 4, 5, 6, 7]
        } else {
            &[0, 2, 4, 6]
        };
        for &pos in radial {
            lines.push(
                square_bb(Square::new(1, pos))
                    | square_bb(Square::new(2, pos))
                    | square_bb(Square::new(3, pos)),
            );
        }

        let mills_of = std::array::from_fn(|i| {
            lines
                .iter()
                .copied()
                .filter(|line| Square::from_u8(i as u8).is_some_and(|sq| line.contains(sq)))
                .collect()
        });

        Geometry {
            adjacent,
            mills_of,
            lines,
        }
    }

    /// 隣接交点
    #[inline]
    pub fn adjacent(&self, sq: Square) -> Bitboard {
        self.adjacent[sq.raw() as usize]
    }

    /// sq を含む mill ライン
    #[inline]
    pub fn mills_of(&self, sq: Square) -> &[Bitboard] {
        &self.mills_of[sq.raw() as usize]
    }

    /// 全 mill ライン
    #[inline]
    pub fn lines(&self) -> &[Bitboard] {
        &self.lines
    }

    /// `occupied` の上で sq を含む完成した mill の数
    #[inline]
    pub fn mills_at(&self, sq: Square, occupied: Bitboard) -> u8 {
        self.mills_of(sq)
            .iter()
            .filter(|&&line| line & occupied == line)
            .count() as u8
    }

    /// sq に置けば完成する mill の数（sq 自体は空であること）
    #[inline]
    pub fn potential_mills_at(&self, sq: Square, occupied: Bitboard) -> u8 {
        self.mills_at(sq, occupied | square_bb(sq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_geometry() {
        let geo = Geometry::get(false);
        assert_eq!(geo.lines().len(), 16);
        let degree_sum: u32 = Square::all().map(|sq| geo.adjacent(sq).count()).sum();
        // 標準盤の辺は32本
        assert_eq!(degree_sum, 64);
        for sq in Square::all() {
            assert_eq!(geo.mills_of(sq).len(), 2, "{sq}");
            for to in geo.adjacent(sq) {
                assert!(geo.adjacent(to).contains(sq), "adjacency must be symmetric");
            }
        }
    }

    #[test]
    fn test_diagonal_geometry() {
        let geo = Geometry::get(true);
        assert_eq!(geo.lines().len(), 20);
        // 中間 ring の角は4方向に動ける
        let f6 = Square::from_name("f6").unwrap();
        assert_eq!(geo.adjacent(f6).count(), 4);
        assert_eq!(geo.mills_of(f6).len(), 3);
    }

    #[test]
    fn test_corner_and_middle_degree() {
        let geo = Geometry::get(false);
        let a7 = Square::from_name("a7").unwrap();
        let d6 = Square::from_name("d6").unwrap();
        let d7 = Square::from_name("d7").unwrap();
        assert_eq!(geo.adjacent(a7).count(), 2);
        assert_eq!(geo.adjacent(d6).count(), 4);
        assert_eq!(geo.adjacent(d7).count(), 3);
    }

    #[test]
    fn test_mills_at() {
        let geo = Geometry::get(false);
        let sq = |n: &str| Square::from_name(n).unwrap();
        let occ = square_bb(sq("a7")) | square_bb(sq("d7")) | square_bb(sq("g7"));
        assert_eq!(geo.mills_at(sq("d7"), occ), 1);
        let occ2 = square_bb(sq("a7")) | square_bb(sq("g7"));
        assert_eq!(geo.potential_mills_at(sq("d7"), occ2), 1);
        assert_eq!(geo.mills_at(sq("d7"), occ2), 0);
    }
}

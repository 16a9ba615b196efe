//! 駒の位置評価（中盤/終盤の2値）
//!
//! 隣接交点の多い交点ほど価値が高い。手駒は盤上の駒と同じ基本価値を持つ。

use crate::position::Geometry;
use crate::types::{Score, Square, Value};

/// 駒1枚の基本価値
pub const PIECE_SCORE: Score = Score::new(Value::PIECE_VALUE, Value::PIECE_VALUE);

/// 手駒1枚の価値
pub const HAND_SCORE: Score = PIECE_SCORE;

/// 盤上の駒1枚の価値（隣接数によるボーナス込み）
#[inline]
pub fn psq(geo: &Geometry, sq: Square) -> Score {
    let degree = geo.adjacent(sq).count() as i32;
    PIECE_SCORE + Score::new(4 * (degree - 2), 2 * (degree - 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psq_prefers_crossings() {
        let geo = Geometry::get(false);
        let corner = psq(geo, Square::from_name("a7").unwrap());
        let cross = psq(geo, Square::from_name("d6").unwrap());
        assert!(cross.mg() > corner.mg());
        assert_eq!(corner, PIECE_SCORE);
    }
}

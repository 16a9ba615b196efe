//! (mg, eg) を1つの整数に詰めたスコア
//!
//! 下位16bitに中盤（配置フェーズ）値、上位16bitに終盤（移動フェーズ）値を持つ。
//! 符号付き値の左シフトを避けるため、パックは u32 経由で行う。
//!
//! `Score` 同士の乗算は意味を持たないため実装していない:
//!
//! ```compile_fail
//! use rmill_core::types::Score;
//! let a = Score::new(1, 2);
//! let _ = a * a;
//! ```

/// 中盤・終盤の2値を持つスコア
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Score(i32);

impl Score {
    pub const ZERO: Score = Score(0);

    /// (mg, eg) から生成
    #[inline]
    pub const fn new(mg: i32, eg: i32) -> Score {
        debug_assert!(mg >= i16::MIN as i32 && mg <= i16::MAX as i32);
        debug_assert!(eg >= i16::MIN as i32 && eg <= i16::MAX as i32);
        Score(((eg as u32) << 16).wrapping_add(mg as u32) as i32)
    }

    /// 中盤値
    #[inline]
    pub const fn mg(self) -> i32 {
        self.0 as u32 as u16 as i16 as i32
    }

    /// 終盤値
    ///
    /// 下位16bitが負の場合の借りを 0x8000 の加算で打ち消してから取り出す。
    #[inline]
    pub const fn eg(self) -> i32 {
        ((self.0 as u32).wrapping_add(0x8000) >> 16) as u16 as i16 as i32
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl std::ops::Add for Score {
    type Output = Score;

    #[inline]
    fn add(self, rhs: Score) -> Score {
        Score(self.0.wrapping_add(rhs.0))
    }
}

impl std::ops::Sub for Score {
    type Output = Score;

    #[inline]
    fn sub(self, rhs: Score) -> Score {
        Score(self.0.wrapping_sub(rhs.0))
    }
}

impl std::ops::Neg for Score {
    type Output = Score;

    #[inline]
    fn neg(self) -> Score {
        Score(self.0.wrapping_neg())
    }
}

impl std::ops::AddAssign for Score {
    #[inline]
    fn add_assign(&mut self, rhs: Score) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl std::ops::SubAssign for Score {
    #[inline]
    fn sub_assign(&mut self, rhs: Score) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

/// 整数倍（両半分に分配される。オーバーフローは debug で検出）
impl std::ops::Mul<i32> for Score {
    type Output = Score;

    #[inline]
    fn mul(self, rhs: i32) -> Score {
        let result = Score(self.0.wrapping_mul(rhs));
        debug_assert_eq!(result.mg(), self.mg() * rhs);
        debug_assert_eq!(result.eg(), self.eg() * rhs);
        result
    }
}

impl std::ops::Mul<bool> for Score {
    type Output = Score;

    #[inline]
    fn mul(self, rhs: bool) -> Score {
        if rhs { self } else { Score::ZERO }
    }
}

/// 除算は各半分で個別に行う
impl std::ops::Div<i32> for Score {
    type Output = Score;

    #[inline]
    fn div(self, rhs: i32) -> Score {
        Score::new(self.mg() / rhs, self.eg() / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_roundtrip_all_pairs_sampled() {
        let samples = [i16::MIN as i32, -32767, -1000, -1, 0, 1, 999, 32766, i16::MAX as i32];
        for &mg in &samples {
            for &eg in &samples {
                let s = Score::new(mg, eg);
                assert_eq!((s.mg(), s.eg()), (mg, eg), "mg={mg} eg={eg}");
            }
        }
    }

    #[test]
    fn test_score_add_sub() {
        let a = Score::new(10, -20);
        let b = Score::new(-3, 7);
        assert_eq!(a + b, Score::new(7, -13));
        assert_eq!(a - b, Score::new(13, -27));
        assert_eq!(-a, Score::new(-10, 20));
    }

    #[test]
    fn test_score_mul_int_distributes() {
        let s = Score::new(-12, 34);
        let r = s * 5;
        assert_eq!(r.mg(), -60);
        assert_eq!(r.eg(), 170);
        assert_eq!(s * 0, Score::ZERO);
        assert_eq!(s * true, s);
        assert_eq!(s * false, Score::ZERO);
    }

    #[test]
    fn test_score_div() {
        let s = Score::new(-100, 51);
        let r = s / 2;
        assert_eq!(r.mg(), -50);
        assert_eq!(r.eg(), 25);
    }
}

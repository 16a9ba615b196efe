//! 置換表の境界種別（Bound）

/// 探索値の境界
///
/// ビット配置は `Upper = 1`, `Lower = 2`, `Exact = Upper | Lower`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Bound {
    #[default]
    None = 0,
    /// 真の値 <= 保存値
    Upper = 1,
    /// 真の値 >= 保存値
    Lower = 2,
    /// 真の値 == 保存値
    Exact = 3,
}

impl Bound {
    /// u8 から変換（下位2bitのみ使用）
    #[inline]
    pub const fn from_u8(v: u8) -> Bound {
        match v & 0x3 {
            1 => Bound::Upper,
            2 => Bound::Lower,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    /// 下限を含む（Lower / Exact）
    #[inline]
    pub const fn includes_lower(self) -> bool {
        (self as u8) & (Bound::Lower as u8) != 0
    }

    /// 上限を含む（Upper / Exact）
    #[inline]
    pub const fn includes_upper(self) -> bool {
        (self as u8) & (Bound::Upper as u8) != 0
    }

    /// 窓 `(alpha, beta)` に対してこの境界の値 `v` で枝刈りできるか
    ///
    /// - Exact は常に使える
    /// - Lower は `v >= beta` のときのみ
    /// - Upper は `v <= alpha` のときのみ
    #[inline]
    pub fn can_cutoff(self, v: i32, alpha: i32, beta: i32) -> bool {
        match self {
            Bound::Exact => true,
            Bound::Lower => v >= beta,
            Bound::Upper => v <= alpha,
            Bound::None => false,
        }
    }
}

//! 指し手（Move）
//!
//! 32bit 整数に詰めた値型。
//!
//! | 種類   | エンコード            |
//! |--------|-----------------------|
//! | 配置   | `to`                  |
//! | 移動   | `(from << 8) \| to`   |
//! | 除去   | `-to`                 |
//!
//! 通常の指し手は必ず移動元 != 移動先になる（配置・除去の移動元は 0）。
//! `NONE` と `NULL` は移動元 == 移動先で区別する。

use super::Square;

/// 指し手の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveType {
    Place,
    Move,
    Remove,
}

/// 指し手
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(i32);

impl Move {
    /// 指し手なし
    pub const NONE: Move = Move(0);
    /// パス（from == to == 1）
    pub const NULL: Move = Move((1 << 8) | 1);

    /// 配置手
    #[inline]
    pub const fn new_place(to: Square) -> Move {
        Move(to.raw() as i32)
    }

    /// 移動手（スライド・飛び）
    #[inline]
    pub const fn new_move(from: Square, to: Square) -> Move {
        Move(((from.raw() as i32) << 8) | to.raw() as i32)
    }

    /// 除去手
    #[inline]
    pub const fn new_remove(sq: Square) -> Move {
        Move(-(sq.raw() as i32))
    }

    /// 生の値から生成（検証なし）
    #[inline]
    pub const fn from_raw(raw: i32) -> Move {
        Move(raw)
    }

    /// 生の値
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// 指し手の種類
    #[inline]
    pub const fn move_type(self) -> MoveType {
        if self.0 < 0 {
            MoveType::Remove
        } else if self.0 & 0x1f00 != 0 {
            MoveType::Move
        } else {
            MoveType::Place
        }
    }

    /// 移動先（除去手では除去する交点）
    #[inline]
    pub const fn to_sq_raw(self) -> u8 {
        (self.0.unsigned_abs() & 0xFF) as u8
    }

    /// 移動元（配置・除去手では 0）
    #[inline]
    pub const fn from_sq_raw(self) -> u8 {
        (self.0.unsigned_abs() >> 8) as u8
    }

    /// 移動先の交点
    #[inline]
    pub const fn to(self) -> Square {
        match Square::from_u8(self.to_sq_raw()) {
            Some(sq) => sq,
            None => Square::NONE,
        }
    }

    /// 移動元の交点（配置・除去手では `Square::NONE`）
    #[inline]
    pub const fn from(self) -> Square {
        match Square::from_u8(self.from_sq_raw()) {
            Some(sq) => sq,
            None => Square::NONE,
        }
    }

    /// NONE/NULL 以外の指し手か
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.from_sq_raw() != self.to_sq_raw()
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != Self::NONE.0
    }

    #[inline]
    pub const fn is_remove(self) -> bool {
        self.0 < 0
    }

    /// 置換表格納用の16bit表現（|raw| <= 0x1F1F なので損失なし）
    #[inline]
    pub const fn to_i16(self) -> i16 {
        self.0 as i16
    }

    /// 16bit表現から復元
    #[inline]
    pub const fn from_i16(v: i16) -> Move {
        Move(v as i32)
    }

    /// 文字列表記から変換（"d5", "d5-e5", "xd5"）
    pub fn from_notation(s: &str) -> Option<Move> {
        if let Some(rest) = s.strip_prefix('x') {
            return Square::from_name(rest).map(Move::new_remove);
        }
        match s.split_once('-') {
            Some((from, to)) => {
                let from = Square::from_name(from)?;
                let to = Square::from_name(to)?;
                (from != to).then(|| Move::new_move(from, to))
            }
            None => Square::from_name(s).map(Move::new_place),
        }
    }

    /// 文字列表記
    pub fn to_notation(self) -> String {
        if !self.is_ok() {
            return if self == Self::NULL { "null".to_string() } else { "none".to_string() };
        }
        match self.move_type() {
            MoveType::Place => self.to().name().to_string(),
            MoveType::Move => format!("{}-{}", self.from(), self.to()),
            MoveType::Remove => format!("x{}", self.to()),
        }
    }
}

impl std::fmt::Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move({})", self.to_notation())
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_notation())
    }
}

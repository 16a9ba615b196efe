//! 基本型
//!
//! - `Color`: 手番（白が先手）
//! - `Square`: 交点（8..=31、`Square::NONE = 0`）
//! - `Piece`: 交点上の駒（空・白・黒・禁止点）
//! - `Move`: 指し手（配置・移動・除去を 32bit に詰めた値型）
//! - `Value` / `Score`: 評価値と (mg, eg) の詰め合わせ
//! - `Bound`: 置換表に保存する値の境界種別
//! - `Phase` / `Action`: 局面のフェーズと手番側に要求される行動

mod bitboard;
mod bound;
mod color;
mod moves;
mod phase;
mod piece;
mod score;
mod square;
mod value;

pub use bitboard::{Bitboard, BitboardIter, square_bb};
pub use bound::Bound;
pub use color::Color;
pub use moves::{Move, MoveType};
pub use phase::{Action, GameOutcome, GameOverReason, GameResult, Phase};
pub use piece::Piece;
pub use score::Score;
pub use square::{SQUARE_NB, Square};
pub use value::Value;

/// 探索深さ
pub type Depth = i32;

/// 最大探索手数（探索スタックの長さ）
pub const MAX_PLY: i32 = 64;

/// 1局面あたりの最大合法手数
///
/// 飛び駒数を 8 まで許すと 8 × 16 = 128 手になる。
pub const MAX_MOVES: usize = 128;

/// 静止探索の深さ
pub const DEPTH_QS: Depth = 0;

/// 静止探索で mill 完成手を打ち切る深さ
pub const DEPTH_QS_MIN: Depth = -4;

/// 未探索を表す深さ
pub const DEPTH_UNSEARCHED: Depth = -6;

/// 置換表エントリーの深さオフセット（depth8 == 0 を空エントリーとして予約）
pub const DEPTH_ENTRY_OFFSET: Depth = -7;

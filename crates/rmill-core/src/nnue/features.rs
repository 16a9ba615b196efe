//! HalfMill 特徴量
//!
//! 視点ごとに「アンカー」（配置・移動・飛びのどの局面か）でバケットを分け、
//! バケット内に次の特徴を持つ。
//!
//! - 盤上: 駒種（自分/相手/禁止点）× 24交点 = 72
//! - 手駒: 手番側/相手側の手駒数の one-hot（0..=12）= 26
//!
//! 入力次元は 3バケット × 98 = 294。

use smallvec::SmallVec;

use super::dirty_piece::DirtyPiece;
use crate::position::{HAND_SLOTS, Position};
use crate::types::{Color, Piece, SQUARE_NB, Square};

/// アンカーの数（配置・移動・飛び）
pub const NUM_ANCHORS: usize = 3;

/// 盤上の駒種（自分・相手・禁止点）
const BOARD_KINDS: usize = 3;

/// 盤上特徴の数
const BOARD_FEATURES: usize = BOARD_KINDS * SQUARE_NB;

/// 1バケットあたりの特徴数
pub const FEATURES_PER_ANCHOR: usize = BOARD_FEATURES + Color::NUM * HAND_SLOTS;

/// 入力次元
pub const INPUT_DIMENSIONS: usize = NUM_ANCHORS * FEATURES_PER_ANCHOR;

/// 同時にアクティブな特徴の最大数（24交点 + 手駒2）
pub const MAX_ACTIVE_FEATURES: usize = SQUARE_NB + Color::NUM;

/// 特徴量ハッシュ
pub const HASH_VALUE: u32 = 0x4D49_4C4C;

/// 特徴インデックスのリスト
pub type IndexList = SmallVec<[usize; MAX_ACTIVE_FEATURES]>;

/// 盤上の駒の特徴インデックス（空なら None）
#[inline]
pub fn board_index(perspective: Color, anchor: usize, sq: Square, pc: Piece) -> Option<usize> {
    let kind = match pc {
        Piece::Empty => return None,
        Piece::Ban => 2,
        _ if pc.color() == Some(perspective) => 0,
        _ => 1,
    };
    Some(anchor * FEATURES_PER_ANCHOR + kind * SQUARE_NB + sq.index())
}

/// 手駒数の特徴インデックス
#[inline]
pub fn hand_index(perspective: Color, anchor: usize, owner: Color, count: u8) -> usize {
    let side = (owner != perspective) as usize;
    let count = (count as usize).min(HAND_SLOTS - 1);
    anchor * FEATURES_PER_ANCHOR + BOARD_FEATURES + side * HAND_SLOTS + count
}

/// 局面のアクティブな特徴を列挙
pub fn append_active_indices(pos: &Position, perspective: Color, active: &mut IndexList) {
    let anchor = pos.anchor(perspective);
    for sq in Square::all() {
        if let Some(idx) = board_index(perspective, anchor, sq, pos.piece_on(sq)) {
            active.push(idx);
        }
    }
    for c in Color::ALL {
        active.push(hand_index(perspective, anchor, c, pos.in_hand(c)));
    }
}

/// 差分から消える特徴と増える特徴を列挙（アンカーは変わっていないこと）
pub fn append_changed_indices(
    dp: &DirtyPiece,
    perspective: Color,
    anchor: usize,
    removed: &mut IndexList,
    added: &mut IndexList,
) {
    debug_assert!(!dp.requires_refresh(perspective));
    for change in dp.board_changes() {
        if let Some(idx) = board_index(perspective, anchor, change.sq, change.old) {
            removed.push(idx);
        }
        if let Some(idx) = board_index(perspective, anchor, change.sq, change.new) {
            added.push(idx);
        }
    }
    if let Some(hand) = dp.hand {
        removed.push(hand_index(perspective, anchor, hand.color, hand.old));
        added.push(hand_index(perspective, anchor, hand.color, hand.new));
    }
}

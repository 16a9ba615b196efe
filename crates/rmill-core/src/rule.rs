//! ルール設定
//!
//! 盤の形（斜め線の有無）・駒数・飛びの条件・引き分け規定をまとめたもの。
//! 局面は `Arc<Rule>` を共有し、探索中に書き換えることはない。
//! 設定ファイルからの読み込みは呼び出し側の責務（serde でそのまま読める）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MAX_MOVES;

/// 配置中に盤が埋まったときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoardFullAction {
    /// 先手（白）の負け
    FirstPlayerLose,
    /// 引き分け
    AgreeToDraw,
}

/// 動かせる手がないときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StalemateAction {
    /// 動けない側の負け
    EndWithStalemateLoss,
    /// 引き分け
    EndWithStalemateDraw,
}

/// ルール設定の不整合
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("piece count {0} is out of range (3..=12)")]
    PieceCount(u8),
    #[error("pieces-at-least count {at_least} must be in 1..={piece_count}")]
    AtLeastCount { at_least: u8, piece_count: u8 },
    #[error("fly piece count {0} would exceed the move buffer")]
    FlyPieceCount(u8),
    #[error("n-move rule must be positive")]
    NMoveRule,
}

/// ルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    /// 各手番の駒数
    pub piece_count: u8,
    /// この枚数以下になると飛べる
    pub fly_piece_count: u8,
    /// 盤上+手駒がこの枚数を下回ると負け
    pub pieces_at_least_count: u8,
    /// 角を結ぶ斜め線（Twelve Men's Morris）
    pub has_diagonal_lines: bool,
    /// 配置中に取られた交点を禁止点にする
    pub has_banned_locations: bool,
    pub board_full_action: BoardFullAction,
    pub stalemate_action: StalemateAction,
    /// 飛びを許可する
    pub may_fly: bool,
    /// mill を構成する駒も常に取れる
    pub may_remove_from_mills_always: bool,
    /// 同時に2つの mill を作ったら2枚取れる
    pub may_remove_multiple: bool,
    /// 除去なしでこの手数（ply）が続くと引き分け
    pub n_move_rule: u32,
    /// どちらかが飛べる終盤での引き分け手数
    pub endgame_n_move_rule: u32,
    pub threefold_repetition_rule: bool,
}

impl Rule {
    /// Nine Men's Morris
    pub fn nine_mens_morris() -> Self {
        Self {
            name: "Nine Men's Morris".to_string(),
            piece_count: 9,
            fly_piece_count: 3,
            pieces_at_least_count: 3,
            has_diagonal_lines: false,
            has_banned_locations: false,
            board_full_action: BoardFullAction::FirstPlayerLose,
            stalemate_action: StalemateAction::EndWithStalemateLoss,
            may_fly: true,
            may_remove_from_mills_always: false,
            may_remove_multiple: false,
            n_move_rule: 100,
            endgame_n_move_rule: 100,
            threefold_repetition_rule: true,
        }
    }

    /// Twelve Men's Morris（斜め線あり、配置中の除去は禁止点になる）
    pub fn twelve_mens_morris() -> Self {
        Self {
            name: "Twelve Men's Morris".to_string(),
            piece_count: 12,
            has_diagonal_lines: true,
            has_banned_locations: true,
            ..Self::nine_mens_morris()
        }
    }

    /// 設定の整合性を検査
    pub fn validate(&self) -> Result<(), RuleError> {
        if !(3..=12).contains(&self.piece_count) {
            return Err(RuleError::PieceCount(self.piece_count));
        }
        if self.pieces_at_least_count == 0 || self.pieces_at_least_count > self.piece_count {
            return Err(RuleError::AtLeastCount {
                at_least: self.pieces_at_least_count,
                piece_count: self.piece_count,
            });
        }
        // 飛び手の最大数 = 駒数 × 空き交点数
        let fly = self.fly_piece_count as usize;
        if fly * (24usize.saturating_sub(fly)) > MAX_MOVES {
            return Err(RuleError::FlyPieceCount(self.fly_piece_count));
        }
        if self.n_move_rule == 0 || self.endgame_n_move_rule == 0 {
            return Err(RuleError::NMoveRule);
        }
        Ok(())
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::nine_mens_morris()
    }
}

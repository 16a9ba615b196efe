//! 局面状態（StateInfo）

use crate::types::{Action, Bitboard, Color, GameOutcome, Move, Phase, Score};

/// do_move で変化する局面状態
///
/// 盤面配列以外の状態はすべてここに持ち、`Position` は do_move の前に
/// 現在の `StateInfo` を履歴に積む。undo_move はそれを戻すだけで済む。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    /// Zobristハッシュ
    pub key: u64,
    /// 駒割り（白視点）
    pub psq: Score,
    pub side_to_move: Color,
    pub phase: Phase,
    pub action: Action,
    pub piece_in_hand: [u8; Color::NUM],
    pub piece_on_board: [u8; Color::NUM],
    /// 未処理の除去数
    pub need_remove: u8,
    /// 禁止点
    pub banned: Bitboard,
    /// 除去なしで続いている移動手の数
    pub rule50: u32,
    /// 開始局面からの手数（ply）
    pub game_ply: u32,
    /// 終局していれば結果
    pub outcome: Option<GameOutcome>,
    /// この局面に至った手
    pub last_move: Move,
}

impl Default for StateInfo {
    fn default() -> Self {
        StateInfo {
            key: 0,
            psq: Score::ZERO,
            side_to_move: Color::White,
            phase: Phase::Ready,
            action: Action::Place,
            piece_in_hand: [0; Color::NUM],
            piece_on_board: [0; Color::NUM],
            need_remove: 0,
            banned: Bitboard::EMPTY,
            rule50: 0,
            game_ply: 0,
            outcome: None,
            last_move: Move::NONE,
        }
    }
}

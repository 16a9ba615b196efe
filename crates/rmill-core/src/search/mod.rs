//! 探索モジュール
//!
//! - `alpha_beta`: 反復深化 + PVS、置換表カット、Mate Distance Pruning
//! - `qsearch`: 静止探索（除去手・mill 完成手）
//! - `movepicker`: 指し手オーダリング
//! - `history`: 静かな手の履歴統計
//! - `time_manager`: 打ち切り判定（停止要求・思考時間・ノード数）
//! - `engine`: LazySMP による並列探索と結果の集約
//!
//! 評価値は常に手番側視点。mill を完成させた手の後は同じ側が続けて指すため、
//! 子ノードの値を反転するのは手番が変わったときだけ。

mod alpha_beta;
mod engine;
mod history;
mod limits;
mod movepicker;
mod qsearch;
mod time_manager;
mod types;

#[cfg(test)]
mod tests;

pub use alpha_beta::{SearchContext, SearchState, SearchWorker};
pub use engine::{Engine, EngineError, EngineOptions, SearchOutcome, SearchResult};
pub use history::{ButterflyHistory, HISTORY_LIMIT, StatsEntry, stat_bonus};
pub use limits::{LimitsType, TimePoint};
pub use movepicker::{MovePicker, score_move};
pub use time_manager::{CHECK_INTERVAL, TimeManagement};
pub use types::{NodeType, RootMove, RootMoves, value_from_tt, value_to_tt};

//! 探索制限（LimitsType）
//!
//! `go` 要求のパラメータを表現する。0 の項目は無制限。

use crate::types::{Depth, MAX_PLY, Move};

/// 時間（ミリ秒）
pub type TimePoint = i64;

/// 探索制限条件
#[derive(Clone, Debug, Default)]
pub struct LimitsType {
    /// 探索深さ固定（0以外なら有効）
    pub depth: Depth,

    /// 探索ノード数制限（全スレッド合計、0以外なら有効）
    pub nodes: u64,

    /// 思考時間固定（ミリ秒、0以外なら有効）
    pub movetime: TimePoint,

    /// 探索対象の手のリスト
    /// 空なら全合法手を探索
    pub search_moves: Vec<Move>,
}

impl LimitsType {
    /// 新しいLimitsTypeを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 深さだけを制限する
    pub fn depth(depth: Depth) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// ノード数だけを制限する
    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    /// 思考時間だけを制限する
    pub fn movetime(movetime: TimePoint) -> Self {
        Self {
            movetime,
            ..Self::default()
        }
    }

    /// 反復深化の最大深さ
    #[inline]
    pub fn max_depth(&self) -> Depth {
        if self.depth > 0 {
            self.depth.min(MAX_PLY - 1)
        } else {
            MAX_PLY - 1
        }
    }

    /// 停止要求以外に打ち切り条件がないか
    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.depth == 0 && self.nodes == 0 && self.movetime == 0
    }
}

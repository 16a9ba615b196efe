//! 評価関数
//!
//! - `psqt`: 駒の基本価値と位置ボーナス
//! - `Evaluator`: 評価器の種類（駒割りのみ / NNUE）。探索全体で共有する
//! - `ThreadEvaluator`: 探索スレッドごとの評価状態（NNUE では Accumulator のスタック）

pub mod psqt;

use std::path::Path;
use std::sync::Arc;

use crate::nnue::{DirtyPiece, Network, NnueEvaluator, NnueResult};
use crate::position::Position;
use crate::types::{Color, Value};

/// 評価器の種類
#[derive(Clone, Default)]
pub enum Evaluator {
    /// 駒割りと位置評価だけ
    #[default]
    Material,
    /// NNUE（駒割りに加算）
    Nnue(Arc<Network>),
}

impl Evaluator {
    /// 評価関数ファイルから NNUE 評価器を作る
    pub fn from_file<P: AsRef<Path>>(path: P) -> NnueResult<Self> {
        Ok(Evaluator::Nnue(Arc::new(Network::load(path)?)))
    }

    pub fn is_nnue(&self) -> bool {
        matches!(self, Evaluator::Nnue(_))
    }

    /// 探索スレッド用の評価状態を作る
    pub fn thread_evaluator(&self, pos: &Position) -> ThreadEvaluator {
        match self {
            Evaluator::Material => ThreadEvaluator::Material,
            Evaluator::Nnue(net) => ThreadEvaluator::Nnue(Box::new(NnueEvaluator::new(net.clone(), pos))),
        }
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluator::Material => f.write_str("Material"),
            Evaluator::Nnue(_) => f.write_str("Nnue"),
        }
    }
}

/// 探索スレッドごとの評価状態
pub enum ThreadEvaluator {
    Material,
    Nnue(Box<NnueEvaluator>),
}

impl ThreadEvaluator {
    /// ルート局面で初期化し直す
    pub fn reset(&mut self, pos: &Position) {
        if let ThreadEvaluator::Nnue(e) = self {
            e.reset(pos);
        }
    }

    #[inline]
    pub fn push(&mut self, dirty: DirtyPiece) {
        if let ThreadEvaluator::Nnue(e) = self {
            e.push(dirty);
        }
    }

    #[inline]
    pub fn pop(&mut self) {
        if let ThreadEvaluator::Nnue(e) = self {
            e.pop();
        }
    }

    /// 手番側視点の評価値（勝敗確定スコアの範囲には入らない）
    pub fn evaluate(&mut self, pos: &Position) -> Value {
        let nnue = match self {
            ThreadEvaluator::Material => 0,
            ThreadEvaluator::Nnue(e) => e.evaluate(pos),
        };
        let v = material(pos) + nnue;
        let limit = Value::MATE_IN_MAX_PLY.raw() - 1;
        Value::new(v.clamp(-limit, limit))
    }
}

/// 駒割り・位置評価（手番側視点）
///
/// 配置フェーズは中盤値、それ以降は終盤値を使う。除去待ちの手番側には取る駒の分を加える。
pub fn material(pos: &Position) -> i32 {
    let psq = pos.psq();
    let white = if pos.is_placing() { psq.mg() } else { psq.eg() };
    let v = match pos.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    };
    v + pos.need_remove() as i32 * Value::PIECE_VALUE
}

//! NNUE 評価器
//!
//! Network と AccumulatorStack の組をスレッドごとに持つ。
//! `net` は `Arc` で共有し、`stack` は探索文脈ごとに独立させる。

use std::sync::Arc;

use super::accumulator::AccumulatorStack;
use super::dirty_piece::DirtyPiece;
use super::network::Network;
use crate::position::Position;
use crate::types::Color;

/// NNUE 評価器
pub struct NnueEvaluator {
    net: Arc<Network>,
    stack: AccumulatorStack,
}

impl NnueEvaluator {
    /// 局面を指定して作成（そのまま evaluate できる）
    pub fn new(net: Arc<Network>, pos: &Position) -> Self {
        let mut evaluator = Self {
            net,
            stack: AccumulatorStack::new(),
        };
        evaluator.reset(pos);
        evaluator
    }

    /// ルート局面で初期化し直す
    pub fn reset(&mut self, pos: &Position) {
        self.stack.reset();
        for c in Color::ALL {
            self.net.feature_transformer.refresh_accumulator(
                pos,
                c,
                &mut self.stack.current_mut().accumulator,
            );
        }
    }

    /// do_move 時
    #[inline]
    pub fn push(&mut self, dirty: DirtyPiece) {
        self.stack.push(dirty);
    }

    /// undo_move 時
    #[inline]
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// 手番側視点のネットワーク出力
    pub fn evaluate(&mut self, pos: &Position) -> i32 {
        for c in Color::ALL {
            self.net.feature_transformer.update_accumulator(pos, c, &mut self.stack);
        }
        self.net.evaluate(&self.stack.current().accumulator, pos.side_to_move())
    }

    /// 差分を使わずに全計算した場合の出力（検証用）
    pub fn evaluate_from_scratch(&self, pos: &Position) -> i32 {
        let mut stack = AccumulatorStack::new();
        for c in Color::ALL {
            self.net.feature_transformer.refresh_accumulator(
                pos,
                c,
                &mut stack.current_mut().accumulator,
            );
        }
        self.net.evaluate(&stack.current().accumulator, pos.side_to_move())
    }

    /// 現在の Accumulator（差分更新後）と全計算の結果が一致するか
    pub fn accumulator_matches_refresh(&mut self, pos: &Position) -> bool {
        for c in Color::ALL {
            self.net.feature_transformer.update_accumulator(pos, c, &mut self.stack);
        }
        let mut fresh = AccumulatorStack::new();
        for c in Color::ALL {
            self.net.feature_transformer.refresh_accumulator(
                pos,
                c,
                &mut fresh.current_mut().accumulator,
            );
        }
        let ours = &self.stack.current().accumulator;
        let theirs = &fresh.current().accumulator;
        Color::ALL.iter().all(|&c| ours.get(c) == theirs.get(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal_moves;
    use crate::rule::Rule;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_incremental_matches_refresh_along_random_game() {
        let net = Arc::new(Network::random(11));
        let mut pos = Position::new(Arc::new(Rule::default()));
        let mut evaluator = NnueEvaluator::new(net, &pos);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);

        let mut plies = 0;
        while plies < 120 {
            let list = legal_moves(&pos);
            if list.is_empty() {
                break;
            }
            let m = list[rng.random_range(0..list.len())];
            let dp = pos.do_move(m);
            evaluator.push(dp);
            plies += 1;
            // 数手おきにだけ評価して、遅延更新の経路も通す
            if plies % 3 == 0 {
                assert!(evaluator.accumulator_matches_refresh(&pos), "ply {plies}");
                assert_eq!(evaluator.evaluate(&pos), evaluator.evaluate_from_scratch(&pos));
            }
        }
        while pos.history_len() > 0 {
            pos.undo_move();
            evaluator.pop();
            assert!(evaluator.accumulator_matches_refresh(&pos));
        }
    }
}

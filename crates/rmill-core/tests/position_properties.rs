//! 局面操作・差分評価の性質テスト（ランダムな手順で検証）

use std::sync::Arc;

use proptest::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use rmill_core::movegen::legal_moves;
use rmill_core::nnue::{Network, NnueEvaluator};
use rmill_core::position::Position;
use rmill_core::rule::Rule;
use rmill_core::types::Move;

fn rule(twelve: bool) -> Arc<Rule> {
    Arc::new(if twelve {
        Rule::twelve_mens_morris()
    } else {
        Rule::nine_mens_morris()
    })
}

/// ランダムな合法手（終局なら None）
fn random_move(pos: &Position, rng: &mut Xoshiro256PlusPlus) -> Option<Move> {
    if pos.is_game_over() {
        return None;
    }
    let moves = legal_moves(pos);
    if moves.is_empty() {
        return None;
    }
    Some(moves.as_slice()[rng.random_range(0..moves.len())])
}

/// FEN の手数以外の欄
fn fen_without_fullmove(fen: &str) -> Vec<String> {
    fen.split_whitespace().take(10).map(str::to_string).collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    /// do_move → undo_move で FEN とキーが完全に戻り、キーは常に全計算と一致する
    #[test]
    fn prop_do_undo_restores_position(seed in any::<u64>(), twelve in any::<bool>(), plies in 1usize..120) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut pos = Position::new(rule(twelve));
        let mut trail = vec![(pos.to_fen(), pos.key())];

        for _ in 0..plies {
            let Some(mv) = random_move(&pos, &mut rng) else { break };
            prop_assert!(pos.is_legal(mv));
            pos.do_move(mv);
            prop_assert_eq!(pos.key(), pos.compute_key());
            trail.push((pos.to_fen(), pos.key()));
        }

        trail.pop();
        while let Some((fen, key)) = trail.pop() {
            pos.undo_move();
            prop_assert_eq!(pos.to_fen(), fen);
            prop_assert_eq!(pos.key(), key);
        }
        prop_assert_eq!(pos.history_len(), 0);
    }

    /// FEN を経由しても同じ局面になる
    #[test]
    fn prop_fen_round_trip(seed in any::<u64>(), plies in 0usize..80) {
        let rule = rule(false);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut pos = Position::new(Arc::clone(&rule));
        for _ in 0..plies {
            let Some(mv) = random_move(&pos, &mut rng) else { break };
            pos.do_move(mv);
        }
        prop_assume!(!pos.is_game_over());

        let fen = pos.to_fen();
        let parsed = Position::from_fen(&fen, rule).unwrap();
        prop_assert_eq!(parsed.key(), pos.key());
        prop_assert_eq!(fen_without_fullmove(&parsed.to_fen()), fen_without_fullmove(&fen));
        let parsed_moves = legal_moves(&parsed);
        let moves = legal_moves(&pos);
        prop_assert_eq!(parsed_moves.as_slice(), moves.as_slice());
    }

    /// NNUE の差分更新と全計算が一致する（undo 後も）
    #[test]
    fn prop_nnue_incremental_matches_refresh(seed in any::<u64>(), twelve in any::<bool>()) {
        let net = Arc::new(Network::random(seed ^ 0x5eed));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut pos = Position::new(rule(twelve));
        let mut evaluator = NnueEvaluator::new(net, &pos);
        let mut depth = 0;

        for _ in 0..60 {
            let Some(mv) = random_move(&pos, &mut rng) else { break };
            evaluator.push(pos.do_move(mv));
            depth += 1;
            let incremental = evaluator.evaluate(&pos);
            prop_assert_eq!(incremental, evaluator.evaluate_from_scratch(&pos));
        }

        for _ in 0..depth {
            pos.undo_move();
            evaluator.pop();
            prop_assert_eq!(evaluator.evaluate(&pos), evaluator.evaluate_from_scratch(&pos));
        }
    }
}

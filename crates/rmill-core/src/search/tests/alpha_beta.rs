//! alpha_beta / qsearch のテスト

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::eval::Evaluator;
use crate::movegen::legal_moves;
use crate::position::{Position, START_FEN};
use crate::rule::Rule;
use crate::search::alpha_beta::{SearchContext, SearchState, SearchWorker, terminal_value};
use crate::search::qsearch::qsearch;
use crate::search::{LimitsType, NodeType, TimeManagement, value_from_tt};
use crate::tt::TranspositionTable;
use crate::types::{Bound, MAX_PLY, Move, Value};

const PV: u8 = NodeType::PV as u8;

fn position(fen: &str) -> Position {
    Position::from_fen(fen, Arc::new(Rule::default())).unwrap()
}

fn new_time() -> TimeManagement {
    TimeManagement::new(&LimitsType::new(), Arc::new(AtomicBool::new(false)))
}

/// 枝刈りなしの minimax（葉は静止探索を全幅で呼ぶ）
fn minimax(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: i32,
    ply: i32,
) -> Value {
    if depth <= 0 {
        return qsearch::<PV>(st, ctx, pos, depth, -Value::INFINITE, Value::INFINITE, ply);
    }
    if pos.is_game_over() {
        return terminal_value(pos.outcome(), pos, ply);
    }
    if !pos.is_placing() && pos.has_repeated() {
        return Value::DRAW;
    }
    if ply >= MAX_PLY - 1 {
        return st.evaluator.evaluate(pos);
    }

    let us = pos.side_to_move();
    let mut best = -Value::INFINITE;
    for &mv in legal_moves(pos).iter() {
        let dirty = pos.do_move(mv);
        st.evaluator.push(dirty);
        let same_side = pos.side_to_move() == us;
        let v = minimax(st, ctx, pos, depth - 1, ply + 1);
        let v = if same_side { v } else { -v };
        st.evaluator.pop();
        pos.undo_move();
        best = best.max(v);
    }
    best
}

fn worker(pos: &Position) -> SearchWorker {
    let tt = Arc::new(TranspositionTable::new(1).unwrap());
    SearchWorker::new(tt, &Evaluator::Material, pos, 0)
}

/// 全幅ウィンドウの PVS（置換表・オーダリングあり）が minimax と一致する
#[test]
fn test_pvs_matches_minimax() {
    let fens = [
        START_FEN,
        // 白は a7 で mill、黒は b6 で mill 目前
        "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
        // 白の除去待ち
        "@@*****@/********/OO*****O w p r 3 5 3 6 1 0 4",
    ];
    let time = new_time();

    for fen in fens {
        for depth in 1..=3 {
            let mut pos = position(fen);
            let before = pos.to_fen();

            let mut reference = worker(&pos);
            let ctx = SearchContext {
                tt: &reference.tt,
                time: &time,
                thread_id: 0,
            };
            let expected = minimax(&mut reference.state, &ctx, &mut pos, depth, 0);

            let mut searcher = worker(&pos);
            let ctx = SearchContext {
                tt: &searcher.tt,
                time: &time,
                thread_id: 0,
            };
            let actual = SearchWorker::search_node::<PV>(
                &mut searcher.state,
                &ctx,
                &mut pos,
                depth,
                -Value::INFINITE,
                Value::INFINITE,
                0,
            );

            assert_eq!(actual, expected, "fen {fen} depth {depth}");
            assert_eq!(pos.to_fen(), before);
        }
    }
}

/// 置換表に残った各局面の値を、保存された深さの minimax と照合する
#[allow(clippy::too_many_arguments)]
fn check_tt_subtree(
    tt: &TranspositionTable,
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    ply: i32,
    max_ply: i32,
    seen: &mut HashSet<u64>,
    checked: &mut usize,
) {
    if pos.is_game_over() || !seen.insert(pos.key()) {
        return;
    }

    let tte = tt.probe(pos.key());
    if tte.found {
        let stored = value_from_tt(tte.data.value, ply);
        let exact = minimax(st, ctx, pos, tte.data.depth, ply);
        let fen = pos.to_fen();
        match tte.data.bound {
            Bound::Exact => assert_eq!(stored, exact, "exact entry {fen}"),
            Bound::Lower => assert!(exact >= stored, "lower bound {stored} > {exact}: {fen}"),
            Bound::Upper => assert!(exact <= stored, "upper bound {stored} < {exact}: {fen}"),
            Bound::None => {}
        }
        *checked += 1;
    }

    if ply == max_ply {
        return;
    }
    for &mv in legal_moves(pos).iter() {
        let dirty = pos.do_move(mv);
        st.evaluator.push(dirty);
        check_tt_subtree(tt, st, ctx, pos, ply + 1, max_ply, seen, checked);
        st.evaluator.pop();
        pos.undo_move();
    }
}

/// 固定深さの探索で書かれた置換表エントリは、境界の向きも含めて minimax と矛盾しない
///
/// 配置フェーズでは局面から手数が決まるので、同じ局面は常に同じ残り深さで読まれる。
#[test]
fn test_tt_entries_agree_with_minimax() {
    let fens = [
        START_FEN,
        "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
        "@@*****@/********/OO*****O w p r 3 5 3 6 1 0 4",
    ];
    let depth = 3;
    let time = new_time();

    for fen in fens {
        let mut pos = position(fen);
        let mut searcher = worker(&pos);
        let ctx = SearchContext {
            tt: &searcher.tt,
            time: &time,
            thread_id: 0,
        };
        SearchWorker::search_node::<PV>(
            &mut searcher.state,
            &ctx,
            &mut pos,
            depth,
            -Value::INFINITE,
            Value::INFINITE,
            0,
        );

        let mut reference = worker(&pos);
        let ref_ctx = SearchContext {
            tt: &reference.tt,
            time: &time,
            thread_id: 0,
        };
        let mut seen = HashSet::new();
        let mut checked = 0;
        check_tt_subtree(
            &searcher.tt,
            &mut reference.state,
            &ref_ctx,
            &mut pos,
            0,
            depth,
            &mut seen,
            &mut checked,
        );
        assert!(checked > depth as usize, "{fen}: only {checked} entries");
        assert_eq!(pos.to_fen(), position(fen).to_fen());
    }
}

/// mill を完成させて相手を2枚にする手を見つける
#[test]
fn test_finds_winning_mill() {
    // 白: d7 g7 a4（3枚で飛べる）、黒: d5 e4 d3
    let mut pos = position("@*@*@***/********/OO****O* w m s 3 0 3 0 0 0 30");
    let mut w = worker(&pos);
    let time = new_time();
    w.search(&mut pos, &LimitsType::depth(6), &time);

    assert_eq!(w.best_move(), Move::from_notation("a4-a7").unwrap());
    // 移動 → 除去 → 相手番で終局
    assert_eq!(w.state.best_score, Value::mate_in(2));
    assert_eq!(w.completed_depth(), 2);
    assert_eq!(w.pv()[0], w.best_move());
    assert!(w.pv().len() >= 2);
    assert!(w.pv()[1].is_remove());
}

#[test]
fn test_search_restores_position() {
    let mut pos = position("@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4");
    let before = pos.to_fen();
    let key = pos.key();
    let mut w = worker(&pos);
    let time = new_time();
    w.search(&mut pos, &LimitsType::depth(4), &time);

    assert_eq!(pos.to_fen(), before);
    assert_eq!(pos.key(), key);
    assert_eq!(w.completed_depth(), 4);
    assert!(legal_moves(&pos).contains(w.best_move()));
    assert!(w.nodes() > 0);
    assert_eq!(time.nodes(), w.nodes());
}

#[test]
fn test_search_moves_restricts_root() {
    let mut pos = position(START_FEN);
    let only = Move::from_notation("d6").unwrap();
    let limits = LimitsType {
        depth: 3,
        search_moves: vec![only],
        ..LimitsType::default()
    };
    let mut w = worker(&pos);
    w.search(&mut pos, &limits, &new_time());
    assert_eq!(w.best_move(), only);
    assert_eq!(w.state.root_moves.len(), 1);
}

#[test]
fn test_search_moves_without_legal_entry_falls_back() {
    let mut pos = position(START_FEN);
    let limits = LimitsType {
        depth: 2,
        search_moves: vec![Move::from_notation("xd6").unwrap()],
        ..LimitsType::default()
    };
    let mut w = worker(&pos);
    w.search(&mut pos, &limits, &new_time());
    assert_eq!(w.state.root_moves.len(), 24);
    assert!(legal_moves(&pos).contains(w.best_move()));
}

#[test]
fn test_node_limit_still_returns_move() {
    let mut pos = position(START_FEN);
    let limits = LimitsType::nodes(64);
    let time = TimeManagement::new(&limits, Arc::new(AtomicBool::new(false)));
    let mut w = worker(&pos);
    w.search(&mut pos, &limits, &time);

    assert!(w.state.abort);
    assert!(legal_moves(&pos).contains(w.best_move()));
    assert!(w.completed_depth() < limits.max_depth());
}

#[test]
fn test_stop_before_search_keeps_fallback_move() {
    let mut pos = position(START_FEN);
    let limits = LimitsType::new();
    let time = TimeManagement::new(&limits, Arc::new(AtomicBool::new(true)));
    let mut w = worker(&pos);
    w.search(&mut pos, &limits, &time);

    assert_eq!(w.completed_depth(), 0);
    assert!(legal_moves(&pos).contains(w.best_move()));
}

#[test]
fn test_terminal_value_perspective() {
    // 黒が2枚、白番
    let pos = position("O*O*O*O*/********/@*@***** w m s 4 0 2 0 0 0 30");
    assert_eq!(terminal_value(pos.outcome(), &pos, 3), Value::mate_in(3));
    assert_eq!(terminal_value(None, &pos, 3), Value::DRAW);
}

//! 静止探索 (Quiescence Search)
//!
//! 深さ0以下で、局面が落ち着くまで除去手と mill 完成手だけを読む。
//!
//! - 除去待ちの局面では stand pat しない（取る駒を選ぶまで評価しない）
//! - mill 完成手は `DEPTH_QS_MIN` より深いところまで
//! - 置換表は `DEPTH_QS_MIN` 以上の深さで読み書きする

use crate::position::Position;
use crate::types::{Action, Bound, DEPTH_QS_MIN, Depth, MAX_PLY, Move, Value};

use super::alpha_beta::{SearchContext, SearchState, check_abort, terminal_value, update_pv};
use super::movepicker::MovePicker;
use super::types::{NodeType, value_from_tt, value_to_tt};

/// 静止探索の子ノード
#[inline]
#[allow(clippy::too_many_arguments)]
fn qsearch_child<const NT: u8>(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: Depth,
    alpha: Value,
    beta: Value,
    ply: i32,
    same_side: bool,
) -> Value {
    if same_side {
        qsearch::<NT>(st, ctx, pos, depth, alpha, beta, ply)
    } else {
        -qsearch::<NT>(st, ctx, pos, depth, -beta, -alpha, ply)
    }
}

/// 静止探索
pub(super) fn qsearch<const NT: u8>(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: Depth,
    alpha: Value,
    beta: Value,
    ply: i32,
) -> Value {
    let pv_node = NT == NodeType::PV as u8;
    let depth = depth.max(DEPTH_QS_MIN);

    st.nodes += 1;
    if pv_node {
        st.stack[ply as usize].pv.clear();
        if st.sel_depth < ply + 1 {
            st.sel_depth = ply + 1;
        }
    }

    if check_abort(st, ctx) {
        return Value::ZERO;
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

    let mut alpha = alpha;

    // 置換表
    let key = pos.key();
    let tte = ctx.tt.probe(key);
    let tt_value = if tte.found {
        value_from_tt(tte.data.value, ply)
    } else {
        Value::NONE
    };
    if !pv_node
        && tte.found
        && tte.data.depth >= depth
        && tt_value != Value::NONE
        && tte.data.bound.can_cutoff(tt_value.raw(), alpha.raw(), beta.raw())
    {
        return tt_value;
    }

    // stand pat
    let removing = pos.action() == Action::Remove;
    let mut best_value = -Value::INFINITE;
    let mut static_eval = Value::NONE;
    if !removing {
        static_eval = st.evaluator.evaluate(pos);
        best_value = static_eval;
        if best_value >= beta {
            if !tte.found {
                tte.write(
                    key,
                    value_to_tt(best_value, ply),
                    false,
                    Bound::Lower,
                    DEPTH_QS_MIN,
                    Move::NONE,
                    static_eval,
                    ctx.tt.generation(),
                );
            }
            return best_value;
        }
        if best_value > alpha {
            alpha = best_value;
        }
    }

    let us = pos.side_to_move();
    let original_alpha = alpha;
    let mut best_move = Move::NONE;
    let mut picker = MovePicker::new_qsearch(pos, tte.data.mv, depth);

    while let Some(mv) = picker.next_move(pos, &st.history, None) {
        if pv_node {
            st.stack[ply as usize + 1].pv.clear();
        }
        let dirty = pos.do_move(mv);
        st.evaluator.push(dirty);
        let same_side = pos.side_to_move() == us;

        let value = qsearch_child::<NT>(st, ctx, pos, depth - 1, alpha, beta, ply + 1, same_side);

        st.evaluator.pop();
        pos.undo_move();

        if st.abort {
            return Value::ZERO;
        }

        if value > best_value {
            best_value = value;
            if value > alpha {
                best_move = mv;
                if pv_node {
                    update_pv(st, ply as usize, mv);
                }
                if value >= beta {
                    break;
                }
                alpha = value;
            }
        }
    }

    // 読む手がなかった
    if best_value == -Value::INFINITE {
        return st.evaluator.evaluate(pos);
    }

    let bound = if best_value >= beta {
        Bound::Lower
    } else if pv_node && best_value > original_alpha {
        Bound::Exact
    } else {
        Bound::Upper
    };
    tte.write(
        key,
        value_to_tt(best_value, ply),
        pv_node,
        bound,
        depth,
        best_move,
        static_eval,
        ctx.tt.generation(),
    );

    best_value
}

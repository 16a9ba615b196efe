//! Alpha-Beta探索の実装
//!
//! - 反復深化 + Aspiration Window（深さ4から）
//! - Principal Variation Search (PVS)
//! - Mate Distance Pruning
//! - 置換表カット
//! - 静止探索 (Quiescence Search) は `qsearch.rs`
//!
//! # 手番の継続
//!
//! mill を完成させた手の後は同じ側が除去手を指す。このとき子ノードの値は
//! 同じ視点なので符号を反転せず、ウィンドウもそのまま渡す。

use std::sync::Arc;

use log::{debug, info};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use smallvec::SmallVec;

use crate::eval::{Evaluator, ThreadEvaluator};
use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{
    Bound, DEPTH_QS, Depth, GameOutcome, MAX_PLY, Move, MoveType, Value,
};

use super::history::{ButterflyHistory, stat_bonus};
use super::movepicker::MovePicker;
use super::qsearch::qsearch;
use super::types::{
    NodeType, RootMove, RootMoves, Stack, init_stack_array, value_from_tt, value_to_tt,
};
use super::{LimitsType, TimeManagement};

/// Aspiration Window の初期幅
const ASPIRATION_DELTA: i32 = 25;

// =============================================================================
// SearchContext / SearchState
// =============================================================================

/// 探索中に変化しない共有データ
pub struct SearchContext<'a> {
    /// 置換表への参照
    pub tt: &'a TranspositionTable,
    /// 打ち切り判定
    pub time: &'a TimeManagement,
    /// スレッドID（0=main）
    pub thread_id: usize,
}

/// 探索中に変化する状態
///
/// 各探索スレッドが持つ可変状態。
pub struct SearchState {
    /// 探索ノード数
    pub nodes: u64,
    /// TimeManagement に報告済みのノード数
    nodes_reported: u64,
    /// 探索スタック
    pub(super) stack: Vec<Stack>,
    /// 中断フラグ
    pub abort: bool,
    /// 選択的深さ
    pub sel_depth: i32,
    /// ルート深さ
    pub root_depth: Depth,
    /// 完了済み深さ
    pub completed_depth: Depth,
    /// 最善手
    pub best_move: Move,
    /// 最後に完了した反復の評価値
    pub best_score: Value,
    /// 最後に完了した反復の読み筋（中断された反復では更新しない）
    pub best_pv: Vec<Move>,
    /// 最後に完了した反復の最善手の選択的深さ
    pub best_sel_depth: i32,
    /// ルート手
    pub root_moves: RootMoves,
    /// 評価器（NNUE Accumulator スタック）
    pub(super) evaluator: ThreadEvaluator,
    /// 静かな手の履歴
    pub(super) history: Box<ButterflyHistory>,
    /// オーダリング用の乱数（ヘルパースレッドのみ）
    pub(super) noise: Option<Xoshiro256PlusPlus>,
    /// check_abort呼び出しカウンター
    calls_cnt: i32,
}

impl SearchState {
    fn new(evaluator: ThreadEvaluator, noise: Option<Xoshiro256PlusPlus>) -> Self {
        Self {
            nodes: 0,
            nodes_reported: 0,
            stack: init_stack_array(),
            abort: false,
            sel_depth: 0,
            root_depth: 0,
            completed_depth: 0,
            best_move: Move::NONE,
            best_score: Value::ZERO,
            best_pv: Vec::new(),
            best_sel_depth: 0,
            root_moves: RootMoves::new(),
            evaluator,
            history: Box::new(ButterflyHistory::new()),
            noise,
            calls_cnt: 0,
        }
    }
}

/// 終局局面の値（手番側視点）
#[inline]
pub(super) fn terminal_value(outcome: Option<GameOutcome>, pos: &Position, ply: i32) -> Value {
    match outcome.and_then(GameOutcome::winner) {
        Some(winner) if winner == pos.side_to_move() => Value::mate_in(ply),
        Some(_) => Value::mated_in(ply),
        None => Value::DRAW,
    }
}

/// 中断チェック
///
/// `TimeManagement::check_interval()` ノードに1回だけ実際の判定を行う。
#[inline]
pub(super) fn check_abort(st: &mut SearchState, ctx: &SearchContext<'_>) -> bool {
    if st.abort {
        return true;
    }

    st.calls_cnt -= 1;
    if st.calls_cnt > 0 {
        return false;
    }
    st.calls_cnt = ctx.time.check_interval();

    let total = ctx.time.add_nodes(st.nodes - st.nodes_reported);
    st.nodes_reported = st.nodes;
    if ctx.time.should_stop(total) {
        st.abort = true;
    }
    st.abort
}

/// 子ノードの探索
///
/// 手番が変わったときだけ符号とウィンドウを反転する。
#[inline]
#[allow(clippy::too_many_arguments)]
pub(super) fn search_child<const NT: u8>(
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
        SearchWorker::search_node::<NT>(st, ctx, pos, depth, alpha, beta, ply)
    } else {
        -SearchWorker::search_node::<NT>(st, ctx, pos, depth, -beta, -alpha, ply)
    }
}

/// PV を ply の位置に更新（mv + 子ノードの PV）
#[inline]
pub(super) fn update_pv(st: &mut SearchState, ply: usize, mv: Move) {
    let (head, tail) = st.stack.split_at_mut(ply + 1);
    let pv = &mut head[ply].pv;
    pv.clear();
    pv.push(mv);
    pv.extend_from_slice(&tail[0].pv);
}

// =============================================================================
// SearchWorker
// =============================================================================

/// 探索用のワーカー
///
/// 1回の `go` ごとに各スレッドで作り、局面のコピーを探索する。
pub struct SearchWorker {
    /// 置換表への共有参照（Arc）
    pub tt: Arc<TranspositionTable>,
    /// スレッドID（0=main）
    pub thread_id: usize,
    /// 探索中に変化する状態
    pub state: SearchState,
}

impl SearchWorker {
    /// 新しいSearchWorkerを作成
    ///
    /// ヘルパースレッド（thread_id > 0）はスレッドIDを種にした乱数でオーダリングをずらす。
    pub fn new(
        tt: Arc<TranspositionTable>,
        evaluator: &Evaluator,
        pos: &Position,
        thread_id: usize,
    ) -> Self {
        let noise = (thread_id > 0).then(|| Xoshiro256PlusPlus::seed_from_u64(thread_id as u64));
        Self {
            tt,
            thread_id,
            state: SearchState::new(evaluator.thread_evaluator(pos), noise),
        }
    }

    /// 探索前の状態リセット
    fn prepare_search(&mut self, pos: &Position) {
        let st = &mut self.state;
        st.nodes = 0;
        st.nodes_reported = 0;
        st.abort = false;
        st.sel_depth = 0;
        st.root_depth = 0;
        st.completed_depth = 0;
        st.best_move = Move::NONE;
        st.best_pv.clear();
        st.best_sel_depth = 0;
        st.calls_cnt = 0;
        st.evaluator.reset(pos);
        st.best_score = st.evaluator.evaluate(pos);
        for s in st.stack.iter_mut() {
            s.pv.clear();
        }
    }

    /// ルート手を生成し、オーダリング順に並べる
    ///
    /// `search_moves` に合法手が1つもなければ全合法手を使う。
    fn init_root_moves(&mut self, pos: &Position, limits: &LimitsType) {
        let st = &mut self.state;
        let tt_move = self.tt.probe(pos.key()).data.mv;
        let mut picker = MovePicker::new(pos, tt_move);
        let mut all = RootMoves::new();
        while let Some(mv) = picker.next_move(pos, &st.history, st.noise.as_mut()) {
            all.push(RootMove::new(mv));
        }

        st.root_moves.clear();
        for rm in all.iter() {
            if limits.search_moves.contains(&rm.mv()) {
                st.root_moves.push(rm.clone());
            }
        }
        if st.root_moves.is_empty() {
            st.root_moves = all;
        }
    }

    /// 探索のメインエントリーポイント
    ///
    /// 反復深化で `limits.max_depth()` まで探索する。中断された反復の結果は捨て、
    /// 最後に完了した反復の最善手を残す。1回も完了しなければ、途中まで読めた手か
    /// オーダリング先頭の手を最善手とする。
    pub fn search(&mut self, pos: &mut Position, limits: &LimitsType, time: &TimeManagement) {
        self.prepare_search(pos);
        self.init_root_moves(pos, limits);

        if self.state.root_moves.is_empty() {
            // 合法手がない場合
            return;
        }
        self.state.best_move = self.state.root_moves[0].mv();
        self.state.best_pv = vec![self.state.best_move];

        let ctx = SearchContext {
            tt: &self.tt,
            time,
            thread_id: self.thread_id,
        };
        let st = &mut self.state;

        for d in 1..=limits.max_depth() {
            if st.abort {
                break;
            }

            for rm in st.root_moves.iter_mut() {
                rm.previous_score = rm.score;
                rm.score = -Value::INFINITE;
            }
            st.root_depth = d;
            st.sel_depth = 0;

            // Aspiration Window
            let prev_score = st.root_moves[0].previous_score;
            let use_window = d >= 4 && !prev_score.is_mate_score();
            let mut delta = ASPIRATION_DELTA;
            let (mut alpha, mut beta) = if use_window {
                (
                    Value::new((prev_score.raw() - delta).max(-Value::INFINITE.raw())),
                    Value::new((prev_score.raw() + delta).min(Value::INFINITE.raw())),
                )
            } else {
                (-Value::INFINITE, Value::INFINITE)
            };

            loop {
                let score = Self::search_root(st, &ctx, pos, d, alpha, beta);
                st.root_moves.stable_sort();

                if st.abort {
                    break;
                }

                // Window調整
                if score <= alpha {
                    beta = Value::new((alpha.raw() + beta.raw()) / 2);
                    alpha = Value::new((score.raw() - delta).max(-Value::INFINITE.raw()));
                } else if score >= beta {
                    beta = Value::new((score.raw() + delta).min(Value::INFINITE.raw()));
                } else {
                    break;
                }

                delta += delta / 2;
            }

            if st.abort {
                if st.completed_depth == 0 && st.root_moves[0].score > -Value::INFINITE {
                    st.best_move = st.root_moves[0].mv();
                    st.best_pv = st.root_moves[0].pv.clone();
                    st.best_sel_depth = st.root_moves[0].sel_depth;
                }
                debug!("thread {} aborted iteration at depth {d}", ctx.thread_id);
                break;
            }

            st.completed_depth = d;
            st.best_move = st.root_moves[0].mv();
            st.best_score = st.root_moves[0].score;
            st.best_pv.clone_from(&st.root_moves[0].pv);
            st.best_sel_depth = st.root_moves[0].sel_depth;
            let pv: Vec<String> = st.best_pv.iter().map(|m| m.to_string()).collect();
            if ctx.thread_id == 0 {
                info!(
                    "depth {d} seldepth {} score {} nodes {} pv {}",
                    st.best_sel_depth,
                    st.best_score,
                    st.nodes,
                    pv.join(" ")
                );
            } else {
                debug!(
                    "thread {} depth {d} score {} pv {}",
                    ctx.thread_id,
                    st.best_score,
                    pv.join(" ")
                );
            }

            // 読み切った詰みはそれ以上深く読んでも変わらない
            if st.best_score.is_mate_score() && st.best_score.mate_ply() <= d {
                break;
            }
        }

        // 残りのノード数を報告
        time.add_nodes(st.nodes - st.nodes_reported);
        st.nodes_reported = st.nodes;
    }

    /// ルート探索
    fn search_root(
        st: &mut SearchState,
        ctx: &SearchContext<'_>,
        pos: &mut Position,
        depth: Depth,
        alpha: Value,
        beta: Value,
    ) -> Value {
        let us = pos.side_to_move();
        let original_alpha = alpha;
        let mut alpha = alpha;
        let mut best_value = -Value::INFINITE;
        let mut best_move = Move::NONE;
        st.nodes += 1;
        st.stack[0].pv.clear();

        for i in 0..st.root_moves.len() {
            let mv = st.root_moves[i].mv();
            st.sel_depth = 0;
            st.stack[1].pv.clear();

            let dirty = pos.do_move(mv);
            st.evaluator.push(dirty);
            let same_side = pos.side_to_move() == us;

            let value = if i == 0 {
                search_child::<{ NodeType::PV as u8 }>(
                    st, ctx, pos, depth - 1, alpha, beta, 1, same_side,
                )
            } else {
                let v = search_child::<{ NodeType::NonPV as u8 }>(
                    st,
                    ctx,
                    pos,
                    depth - 1,
                    alpha,
                    Value::new(alpha.raw() + 1),
                    1,
                    same_side,
                );
                if v > alpha && v < beta {
                    st.stack[1].pv.clear();
                    search_child::<{ NodeType::PV as u8 }>(
                        st, ctx, pos, depth - 1, alpha, beta, 1, same_side,
                    )
                } else {
                    v
                }
            };

            st.evaluator.pop();
            pos.undo_move();

            if st.abort {
                break;
            }

            let rm = &mut st.root_moves[i];
            if i == 0 || value > alpha {
                rm.score = value;
                rm.sel_depth = st.sel_depth;
                rm.pv.truncate(1);
                rm.pv.extend_from_slice(&st.stack[1].pv);
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = mv;
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        if !st.abort && best_move.is_some() {
            let bound = if best_value >= beta {
                Bound::Lower
            } else if best_value > original_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            let key = pos.key();
            ctx.tt.probe(key).write(
                key,
                value_to_tt(best_value, 0),
                true,
                bound,
                depth,
                best_move,
                Value::NONE,
                ctx.tt.generation(),
            );
        }

        best_value
    }

    /// 通常探索ノード
    ///
    /// NTは NodeType を const genericで受け取る
    pub(super) fn search_node<const NT: u8>(
        st: &mut SearchState,
        ctx: &SearchContext<'_>,
        pos: &mut Position,
        depth: Depth,
        alpha: Value,
        beta: Value,
        ply: i32,
    ) -> Value {
        let pv_node = NT == NodeType::PV as u8;

        // 深さが0以下なら静止探索へ
        if depth <= DEPTH_QS {
            return qsearch::<NT>(st, ctx, pos, depth, alpha, beta, ply);
        }

        st.nodes += 1;
        if pv_node {
            st.stack[ply as usize].pv.clear();
            if st.sel_depth < ply + 1 {
                st.sel_depth = ply + 1;
            }
        }

        // 中断チェック
        if check_abort(st, ctx) {
            return Value::ZERO;
        }

        // 終局
        if pos.is_game_over() {
            return terminal_value(pos.outcome(), pos, ply);
        }
        // 探索木内の同一局面は引き分け
        if !pos.is_placing() && pos.has_repeated() {
            return Value::DRAW;
        }
        // 最大深さチェック
        if ply >= MAX_PLY - 1 {
            return st.evaluator.evaluate(pos);
        }

        // =====================================================================
        // Mate Distance Pruning
        // =====================================================================
        let mut alpha = alpha.max(Value::mated_in(ply));
        let beta = beta.min(Value::mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        // =====================================================================
        // 置換表
        // =====================================================================
        let key = pos.key();
        let tte = ctx.tt.probe(key);
        let tt_value = if tte.found {
            value_from_tt(tte.data.value, ply)
        } else {
            Value::NONE
        };
        if tte.found
            && tte.data.depth >= depth
            && tt_value != Value::NONE
            && tte.data.bound.can_cutoff(tt_value.raw(), alpha.raw(), beta.raw())
        {
            return tt_value;
        }

        // =====================================================================
        // 指し手ループ
        // =====================================================================
        let us = pos.side_to_move();
        let original_alpha = alpha;
        let mut best_value = -Value::INFINITE;
        let mut best_move = Move::NONE;
        let mut move_count = 0;
        let mut quiets_tried: SmallVec<[Move; 32]> = SmallVec::new();
        let mut picker = MovePicker::new(pos, tte.data.mv);

        while let Some(mv) = picker.next_move(pos, &st.history, st.noise.as_mut()) {
            move_count += 1;
            let quiet = mv.move_type() != MoveType::Remove && pos.mills_closed_by(mv) == 0;

            st.stack[ply as usize + 1].pv.clear();
            let dirty = pos.do_move(mv);
            st.evaluator.push(dirty);
            let same_side = pos.side_to_move() == us;

            let value = if !pv_node || move_count > 1 {
                let v = search_child::<{ NodeType::NonPV as u8 }>(
                    st,
                    ctx,
                    pos,
                    depth - 1,
                    alpha,
                    Value::new(alpha.raw() + 1),
                    ply + 1,
                    same_side,
                );
                if pv_node && v > alpha && v < beta {
                    search_child::<{ NodeType::PV as u8 }>(
                        st,
                        ctx,
                        pos,
                        depth - 1,
                        alpha,
                        beta,
                        ply + 1,
                        same_side,
                    )
                } else {
                    v
                }
            } else {
                search_child::<{ NodeType::PV as u8 }>(
                    st,
                    ctx,
                    pos,
                    depth - 1,
                    alpha,
                    beta,
                    ply + 1,
                    same_side,
                )
            };

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
                        if quiet {
                            let bonus = stat_bonus(depth);
                            st.history.update(us, mv, bonus);
                            for &q in &quiets_tried {
                                st.history.update(us, q, -bonus);
                            }
                        }
                        break;
                    }
                    alpha = value;
                }
            }

            if quiet && quiets_tried.len() < 32 {
                quiets_tried.push(mv);
            }
        }

        if move_count == 0 {
            // 終局判定済みなので通常は起きない
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
            Value::NONE,
            ctx.tt.generation(),
        );

        best_value
    }

    /// 探索結果のスナップショット
    pub fn best_move(&self) -> Move {
        self.state.best_move
    }

    pub fn completed_depth(&self) -> Depth {
        self.state.completed_depth
    }

    pub fn nodes(&self) -> u64 {
        self.state.nodes
    }

    /// 最善手の読み筋
    pub fn pv(&self) -> Vec<Move> {
        self.state.best_pv.clone()
    }
}

//! MovePicker（指し手オーダリング）
//!
//! 探索中に指し手を段階的に返す。β カットを起こしやすい手を先に返す。
//!
//! ## Stage
//!
//! ### 通常探索
//! 1. MainTT - 置換表の指し手
//! 2. Init - 合法手の生成とスコア付け
//! 3. Main - スコア順に返す
//!
//! ### 静止探索
//! 1. QSearchTT - 置換表の指し手（除去手・mill 完成手のときだけ）
//! 2. QInit - 除去手・mill 完成手の生成
//! 3. QMain - スコア順に返す
//!
//! ## スコア
//!
//! 除去手・mill 完成手 > 相手の mill を塞ぐ手 > その他（history + 隣接点の数）。
//! ヘルパースレッドは静かな手に小さな乱数を加え、探索順をばらけさせる。
//! History 参照は保持せず、`next_move()` で受け取る。

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::history::ButterflyHistory;
use crate::movegen::{ExtMove, MoveList, generate_legal};
use crate::position::Position;
use crate::types::{Action, DEPTH_QS_MIN, Depth, MAX_MOVES, Move, MoveType};

/// 除去手・mill 完成手の基礎点
pub const MILL_BONUS: i32 = 10_000;
/// 相手の mill を塞ぐ手の基礎点
pub const BLOCK_BONUS: i32 = 5_000;
/// 静かな手の隣接点1つあたりの加点
pub const ADJACENCY_WEIGHT: i32 = 32;
/// ヘルパースレッドの乱数幅
pub const NOISE_RANGE: i32 = 64;

/// 指し手生成の段階
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stage {
    MainTT,
    Init,
    Main,
    QSearchTT,
    QInit,
    QMain,
}

/// 静止探索で読む手か
#[inline]
fn is_tactical(pos: &Position, mv: Move, depth: Depth) -> bool {
    mv.is_remove() || (depth > DEPTH_QS_MIN && pos.mills_closed_by(mv) > 0)
}

/// 指し手のオーダリング用スコア（乱数を除く）
pub fn score_move(pos: &Position, mv: Move, history: &ButterflyHistory) -> i32 {
    let geo = pos.geometry();
    let us = pos.side_to_move();
    let them = !us;
    let empty = pos.empty_squares();

    match mv.move_type() {
        MoveType::Remove => {
            let sq = mv.to();
            let theirs = pos.pieces(them);
            // あと1手で mill になる並びの駒を優先
            let threats = geo
                .mills_of(sq)
                .iter()
                .filter(|&&line| (line & theirs).count() == 2 && (line & empty).count() == 1)
                .count() as i32;
            MILL_BONUS + 200 * threats + 16 * (geo.adjacent(sq) & empty).count() as i32
        }
        MoveType::Place | MoveType::Move => {
            let mills = pos.mills_closed_by(mv) as i32;
            if mills > 0 {
                MILL_BONUS + 1000 * mills
            } else if pos.blocks_mill(mv) {
                BLOCK_BONUS
            } else {
                let free = geo.adjacent(mv.to()) & !pos.pieces(them);
                history.get(us, mv) as i32 + ADJACENCY_WEIGHT * free.count() as i32
            }
        }
    }
}

/// 指し手オーダリング
pub struct MovePicker {
    moves: [ExtMove; MAX_MOVES],
    len: usize,
    cur: usize,
    tt_move: Move,
    depth: Depth,
    stage: Stage,
}

impl MovePicker {
    /// 通常探索用
    pub fn new(pos: &Position, tt_move: Move) -> Self {
        let tt_ok = pos.is_legal(tt_move);
        Self {
            moves: [ExtMove::new(Move::NONE, 0); MAX_MOVES],
            len: 0,
            cur: 0,
            tt_move: if tt_ok { tt_move } else { Move::NONE },
            depth: 0,
            stage: if tt_ok { Stage::MainTT } else { Stage::Init },
        }
    }

    /// 静止探索用
    ///
    /// 除去待ちなら全除去手、それ以外は `depth > DEPTH_QS_MIN` のときだけ mill 完成手を返す。
    pub fn new_qsearch(pos: &Position, tt_move: Move, depth: Depth) -> Self {
        let tt_ok = pos.is_legal(tt_move) && is_tactical(pos, tt_move, depth);
        Self {
            moves: [ExtMove::new(Move::NONE, 0); MAX_MOVES],
            len: 0,
            cur: 0,
            tt_move: if tt_ok { tt_move } else { Move::NONE },
            depth,
            stage: if tt_ok { Stage::QSearchTT } else { Stage::QInit },
        }
    }

    /// 次の指し手（なければ None）
    pub fn next_move(
        &mut self,
        pos: &Position,
        history: &ButterflyHistory,
        mut noise: Option<&mut Xoshiro256PlusPlus>,
    ) -> Option<Move> {
        loop {
            match self.stage {
                Stage::MainTT => {
                    self.stage = Stage::Init;
                    return Some(self.tt_move);
                }
                Stage::QSearchTT => {
                    self.stage = Stage::QInit;
                    return Some(self.tt_move);
                }
                Stage::Init => {
                    let mut list = MoveList::new();
                    generate_legal(pos, &mut list);
                    for &mv in &list {
                        if mv == self.tt_move {
                            continue;
                        }
                        let mut value = score_move(pos, mv, history);
                        if value < BLOCK_BONUS {
                            if let Some(rng) = noise.as_deref_mut() {
                                value += rng.random_range(0..NOISE_RANGE);
                            }
                        }
                        self.push(mv, value);
                    }
                    self.stage = Stage::Main;
                }
                Stage::QInit => {
                    if pos.action() == Action::Remove || self.depth > DEPTH_QS_MIN {
                        let mut list = MoveList::new();
                        generate_legal(pos, &mut list);
                        for &mv in &list {
                            if mv != self.tt_move && is_tactical(pos, mv, self.depth) {
                                self.push(mv, score_move(pos, mv, history));
                            }
                        }
                    }
                    self.stage = Stage::QMain;
                }
                Stage::Main | Stage::QMain => return self.select_best(),
            }
        }
    }

    #[inline]
    fn push(&mut self, mv: Move, value: i32) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = ExtMove::new(mv, value);
        self.len += 1;
    }

    /// 残りから最大スコアの手を取り出す（同点は先に生成した手）
    fn select_best(&mut self) -> Option<Move> {
        if self.cur >= self.len {
            return None;
        }
        let mut best = self.cur;
        for i in self.cur + 1..self.len {
            if self.moves[i].value > self.moves[best].value {
                best = i;
            }
        }
        self.moves.swap(self.cur, best);
        let mv = self.moves[self.cur].mv;
        self.cur += 1;
        Some(mv)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;

    use super::*;
    use crate::movegen::legal_moves;
    use crate::rule::Rule;
    use crate::types::Square;

    fn collect(pos: &Position, picker: &mut MovePicker) -> Vec<Move> {
        let history = ButterflyHistory::new();
        let mut out = Vec::new();
        while let Some(mv) = picker.next_move(pos, &history, None) {
            out.push(mv);
        }
        out
    }

    #[test]
    fn test_picker_returns_every_legal_move_once() {
        let pos = Position::new(Arc::new(Rule::default()));
        let tt_move = Move::new_place(Square::new(2, 2));
        let moves = collect(&pos, &mut MovePicker::new(&pos, tt_move));
        assert_eq!(moves.len(), 24);
        assert_eq!(moves[0], tt_move);
        let legal = legal_moves(&pos);
        for mv in &moves {
            assert!(legal.contains(*mv));
        }
        let mut dedup = moves.clone();
        dedup.sort_by_key(|m| m.raw());
        dedup.dedup();
        assert_eq!(dedup.len(), moves.len());
    }

    #[test]
    fn test_picker_ignores_illegal_tt_move() {
        let pos = Position::new(Arc::new(Rule::default()));
        let bogus = Move::new_remove(Square::new(1, 0));
        let moves = collect(&pos, &mut MovePicker::new(&pos, bogus));
        assert_eq!(moves.len(), 24);
        assert!(!moves.contains(&bogus));
    }

    #[test]
    fn test_mill_closing_move_comes_first() {
        // 白: d7 g7 c3、黒: d5 d6 f6。a7 に置けば mill、黒は b6 で mill 目前
        let pos = Position::from_fen(
            "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
            Arc::new(Rule::default()),
        )
        .unwrap();
        let moves = collect(&pos, &mut MovePicker::new(&pos, Move::NONE));
        assert_eq!(moves[0], Move::from_notation("a7").unwrap());
        // 次は黒の mill を塞ぐ手
        let history = ButterflyHistory::new();
        assert!(score_move(&pos, moves[1], &history) >= BLOCK_BONUS);
    }

    #[test]
    fn test_qsearch_picker_only_tactical_moves() {
        let pos = Position::from_fen(
            "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
            Arc::new(Rule::default()),
        )
        .unwrap();
        let moves = collect(&pos, &mut MovePicker::new_qsearch(&pos, Move::NONE, 0));
        assert_eq!(moves, vec![Move::from_notation("a7").unwrap()]);

        let moves = collect(&pos, &mut MovePicker::new_qsearch(&pos, Move::NONE, DEPTH_QS_MIN));
        assert!(moves.is_empty());
    }

    #[test]
    fn test_qsearch_picker_returns_all_removals() {
        let pos = Position::from_fen(
            "@@*****@/********/OO**O*@O w m r 4 0 4 0 1 0 20",
            Arc::new(Rule::default()),
        )
        .unwrap();
        let moves = collect(&pos, &mut MovePicker::new_qsearch(&pos, Move::NONE, DEPTH_QS_MIN));
        assert_eq!(moves.len(), legal_moves(&pos).len());
        assert!(moves.iter().all(|m| m.is_remove()));
    }

    #[test]
    fn test_noise_keeps_tactical_order() {
        let pos = Position::from_fen(
            "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
            Arc::new(Rule::default()),
        )
        .unwrap();
        let history = ButterflyHistory::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut picker = MovePicker::new(&pos, Move::NONE);
        let first = picker.next_move(&pos, &history, Some(&mut rng));
        assert_eq!(first, Move::from_notation("a7"));
    }
}

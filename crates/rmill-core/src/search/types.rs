//! 探索で使う補助型
//!
//! - `NodeType`: ノード種別（const generic で渡す）
//! - `Stack`: ply ごとの探索スタック
//! - `RootMove` / `RootMoves`: ルート手とそのスコア・PV
//! - 置換表に保存する詰みスコアの ply 補正

use crate::types::{MAX_PLY, Move, Value};

/// ノード種別
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// ゼロウィンドウで探索するノード
    NonPV = 0,
    /// PV ノード
    PV = 1,
}

/// 探索スタックの長さ（ply + 1 まで参照する）
pub(super) const STACK_SIZE: usize = MAX_PLY as usize + 2;

/// ply ごとの探索情報
#[derive(Clone, Default)]
pub(super) struct Stack {
    /// このノード以下の読み筋
    pub pv: Vec<Move>,
}

pub(super) fn init_stack_array() -> Vec<Stack> {
    vec![Stack::default(); STACK_SIZE]
}

/// 詰みスコアを「現局面から」の手数に直して置換表へ保存する
#[inline]
pub fn value_to_tt(v: Value, ply: i32) -> Value {
    debug_assert!(v != Value::NONE);
    if v.is_win() {
        Value::new(v.raw() + ply)
    } else if v.is_loss() {
        Value::new(v.raw() - ply)
    } else {
        v
    }
}

/// 置換表の詰みスコアを「ルートから」の手数に戻す
#[inline]
pub fn value_from_tt(v: Value, ply: i32) -> Value {
    if v == Value::NONE {
        Value::NONE
    } else if v.is_win() {
        Value::new(v.raw() - ply)
    } else if v.is_loss() {
        Value::new(v.raw() + ply)
    } else {
        v
    }
}

/// ルート手
#[derive(Clone, Debug)]
pub struct RootMove {
    /// 今回の反復での評価値（未確定なら -INFINITE）
    pub score: Value,
    /// 前回の反復での評価値
    pub previous_score: Value,
    /// 選択的深さ
    pub sel_depth: i32,
    /// 読み筋（先頭がこの手）
    pub pv: Vec<Move>,
}

impl RootMove {
    pub fn new(mv: Move) -> Self {
        Self {
            score: -Value::INFINITE,
            previous_score: -Value::INFINITE,
            sel_depth: 0,
            pv: vec![mv],
        }
    }

    /// 指し手
    #[inline]
    pub fn mv(&self) -> Move {
        self.pv[0]
    }
}

/// ルート手のリスト
#[derive(Clone, Debug, Default)]
pub struct RootMoves {
    moves: Vec<RootMove>,
}

impl RootMoves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rm: RootMove) {
        self.moves.push(rm);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RootMove> {
        self.moves.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RootMove> {
        self.moves.iter_mut()
    }

    /// スコア降順の安定ソート（同点は前回の順序を保つ）
    pub fn stable_sort(&mut self) {
        self.moves.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.previous_score.cmp(&a.previous_score))
        });
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.moves.iter().any(|rm| rm.mv() == mv)
    }
}

impl std::ops::Index<usize> for RootMoves {
    type Output = RootMove;

    fn index(&self, index: usize) -> &RootMove {
        &self.moves[index]
    }
}

impl std::ops::IndexMut<usize> for RootMoves {
    fn index_mut(&mut self, index: usize) -> &mut RootMove {
        &mut self.moves[index]
    }
}

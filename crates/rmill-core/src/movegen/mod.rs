//! 合法手生成
//!
//! 手番側に要求されている行動（配置・移動・除去）に応じて合法手だけを生成する。
//! ミルでは擬似合法手と合法手の区別がないので、生成した手はすべて `Position::is_legal` を満たす。

mod movelist;

pub use movelist::{ExtMove, MoveList};

use crate::position::Position;
use crate::types::{Action, Move};

/// 合法手を list に追加する
pub fn generate_legal(pos: &Position, list: &mut MoveList) {
    if pos.is_game_over() {
        return;
    }
    let us = pos.side_to_move();
    let empty = pos.empty_squares();

    match pos.action() {
        Action::Place => {
            if pos.in_hand(us) == 0 {
                return;
            }
            for to in empty {
                list.push(Move::new_place(to));
            }
        }
        Action::Select => {
            let fly = pos.can_fly(us);
            for from in pos.pieces(us) {
                let targets = if fly {
                    empty
                } else {
                    pos.geometry().adjacent(from) & empty
                };
                for to in targets {
                    list.push(Move::new_move(from, to));
                }
            }
        }
        Action::Remove => {
            let them = !us;
            let anything_goes =
                pos.rule().may_remove_from_mills_always || pos.all_in_mills(them);
            for sq in pos.pieces(them) {
                if anything_goes || !pos.in_mill(sq) {
                    list.push(Move::new_remove(sq));
                }
            }
        }
    }
}

/// 合法手の一覧
pub fn legal_moves(pos: &Position) -> MoveList {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    list
}

/// 葉ノード数を数える（終局局面は葉として数えない）
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let list = legal_moves(pos);
    if depth == 1 {
        return list.len() as u64;
    }
    let mut nodes = 0;
    for &m in &list {
        pos.do_move(m);
        nodes += perft(pos, depth - 1);
        pos.undo_move();
    }
    nodes
}

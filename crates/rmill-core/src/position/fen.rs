//! FEN形式の解析・出力
//!
//! `<内側>/<中間>/<外側> <手番> <フェーズ> <行動> <白盤上> <白手駒> <黒盤上> <黒手駒> <除去数> <rule50> <手数>`
//!
//! 各 ring は上辺中央から時計回りに8文字（`*` 空, `O` 白, `@` 黒, `X` 禁止点）。

use std::sync::Arc;

use thiserror::Error;

use super::pos::Position;
use super::state::StateInfo;
use crate::rule::Rule;
use crate::types::{Action, Color, Phase, Piece, Square};

/// Nine Men's Morris の開始局面
pub const START_FEN: &str = "********/********/******** w p p 0 9 0 9 0 0 1";

/// FEN の解析エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 9 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid board: {0}")]
    Board(String),
    #[error("invalid side to move: {0}")]
    SideToMove(String),
    #[error("invalid phase: {0}")]
    Phase(String),
    #[error("invalid action: {0}")]
    Action(String),
    #[error("invalid {field}: {value}")]
    Number { field: &'static str, value: String },
    #[error("piece count mismatch for {0}")]
    PieceCount(Color),
    #[error("inconsistent position: {0}")]
    Inconsistent(&'static str),
}

fn parse_num<T: std::str::FromStr>(field: &'static str, s: &str) -> Result<T, FenError> {
    s.parse().map_err(|_| FenError::Number {
        field,
        value: s.to_string(),
    })
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

impl Position {
    /// FEN から局面を作る
    pub fn from_fen(fen: &str, rule: Arc<Rule>) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut pos = Position::empty(rule);

        let rings: Vec<&str> = fields[0].split('/').collect();
        if rings.len() != 3 {
            return Err(FenError::Board(fields[0].to_string()));
        }
        for (r, ring) in rings.iter().enumerate() {
            let chars: Vec<char> = ring.chars().collect();
            if chars.len() != 8 {
                return Err(FenError::Board(ring.to_string()));
            }
            for (p, &ch) in chars.iter().enumerate() {
                let pc = Piece::from_char(ch).ok_or_else(|| FenError::Board(ring.to_string()))?;
                pos.set_square(Square::new(r as u8 + 1, p as u8), pc);
            }
        }

        let side_to_move = match single_char(fields[1]) {
            Some('w') => Color::White,
            Some('b') => Color::Black,
            _ => return Err(FenError::SideToMove(fields[1].to_string())),
        };
        let phase = single_char(fields[2])
            .and_then(Phase::from_char)
            .ok_or_else(|| FenError::Phase(fields[2].to_string()))?;
        let action = single_char(fields[3])
            .and_then(Action::from_char)
            .ok_or_else(|| FenError::Action(fields[3].to_string()))?;

        let on_board: [u8; Color::NUM] = [
            parse_num("white on-board count", fields[4])?,
            parse_num("black on-board count", fields[6])?,
        ];
        let in_hand: [u8; Color::NUM] = [
            parse_num("white in-hand count", fields[5])?,
            parse_num("black in-hand count", fields[7])?,
        ];
        let need_remove: u8 = parse_num("remove count", fields[8])?;
        let rule50: u32 = match fields.get(9) {
            Some(s) => parse_num("rule50", s)?,
            None => 0,
        };
        let fullmove: u32 = match fields.get(10) {
            Some(s) => parse_num("fullmove", s)?,
            None => 1,
        };

        let piece_count = pos.rule().piece_count;
        for c in Color::ALL {
            let i = c.index();
            if pos.pieces(c).count() != on_board[i] as u32
                || on_board[i] as u32 + in_hand[i] as u32 > piece_count as u32
            {
                return Err(FenError::PieceCount(c));
            }
        }
        if need_remove as usize >= super::zobrist::NEED_REMOVE_SLOTS {
            return Err(FenError::Inconsistent("too many pending removals"));
        }
        if (need_remove > 0) != (action == Action::Remove) && phase != Phase::GameOver {
            return Err(FenError::Inconsistent("remove count does not match action"));
        }
        match phase {
            Phase::Ready | Phase::Placing => {
                if action == Action::Select {
                    return Err(FenError::Inconsistent("select action during placing"));
                }
                if action == Action::Place && in_hand[side_to_move.index()] == 0 {
                    return Err(FenError::Inconsistent("side to move has nothing to place"));
                }
                // 配置は白から交互。黒番の配置中と白の除去中は白が1枚多く置いている
                let white_ahead = (side_to_move == Color::Black) != (action == Action::Remove);
                let white = in_hand[Color::White.index()] as u32 + white_ahead as u32;
                if white != in_hand[Color::Black.index()] as u32 {
                    return Err(FenError::Inconsistent("pieces in hand do not alternate"));
                }
            }
            Phase::Moving => {
                if action == Action::Place {
                    return Err(FenError::Inconsistent("place action during moving"));
                }
                if in_hand != [0; Color::NUM] {
                    return Err(FenError::Inconsistent("pieces in hand during moving"));
                }
            }
            Phase::GameOver => {}
        }
        if !pos.banned().is_empty() && !matches!(phase, Phase::Ready | Phase::Placing) {
            return Err(FenError::Inconsistent("banned squares outside placing"));
        }

        let mut st = StateInfo {
            side_to_move,
            phase,
            action,
            piece_in_hand: in_hand,
            piece_on_board: on_board,
            need_remove,
            banned: pos.banned(),
            rule50,
            game_ply: fullmove.saturating_sub(1) * 2 + (side_to_move == Color::Black) as u32,
            ..StateInfo::default()
        };
        pos.set_state(st);
        st.key = pos.compute_key();
        st.psq = pos.compute_psq();

        // 終局判定は通常フェーズとして行う
        if phase == Phase::GameOver {
            let board_full = pos.empty_squares().is_empty() && pos.banned().is_empty();
            st.phase = if in_hand == [0; Color::NUM] && !board_full {
                Phase::Moving
            } else {
                Phase::Placing
            };
        }
        pos.set_state(st);
        st.outcome = pos.compute_outcome();
        match (phase, st.outcome) {
            (Phase::GameOver, None) => {
                return Err(FenError::Inconsistent("game over without a decided outcome"));
            }
            (_, Some(_)) => st.phase = Phase::GameOver,
            _ => {}
        }
        pos.set_state(st);
        Ok(pos)
    }

    /// FEN 文字列に変換
    pub fn to_fen(&self) -> String {
        let mut board = String::with_capacity(26);
        for ring in 1..=3u8 {
            if ring > 1 {
                board.push('/');
            }
            for p in 0..8u8 {
                board.push(self.piece_on(Square::new(ring, p)).to_char());
            }
        }
        let st = self.state();
        format!(
            "{} {} {} {} {} {} {} {} {} {} {}",
            board,
            st.side_to_move.to_char(),
            st.phase.to_char(),
            st.action.to_char(),
            st.piece_on_board[0],
            st.piece_in_hand[0],
            st.piece_on_board[1],
            st.piece_in_hand[1],
            st.need_remove,
            st.rule50,
            st.game_ply / 2 + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameOverReason;

    fn nine() -> Arc<Rule> {
        Arc::new(Rule::nine_mens_morris())
    }

    #[test]
    fn test_start_fen_matches_new() {
        let pos = Position::from_fen(START_FEN, nine()).unwrap();
        assert_eq!(pos, Position::new(nine()));
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn test_fen_roundtrip() {
        let fens = [
            "@@*****@/********/OO**O*@O w m r 4 0 4 0 1 7 20",
            "O*O*O*O*/********/@*@*@*@* b m s 4 0 4 0 0 12 31",
            "********/********/O*O*@*@* w p p 2 1 2 1 0 0 9",
        ];
        for fen in fens {
            let pos = Position::from_fen(fen, nine()).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_invalid_fens() {
        let cases = [
            ("", FenError::FieldCount(0)),
            (
                "********/********/******* w p p 0 9 0 9 0 0 1",
                FenError::Board("*******".to_string()),
            ),
            (
                "********/********/******** x p p 0 9 0 9 0 0 1",
                FenError::SideToMove("x".to_string()),
            ),
            (
                "********/********/******** w q p 0 9 0 9 0 0 1",
                FenError::Phase("q".to_string()),
            ),
            (
                "O*******/********/******** w p p 0 9 0 9 0 0 1",
                FenError::PieceCount(Color::White),
            ),
            (
                "********/********/******** w p p 0 10 0 9 0 0 1",
                FenError::PieceCount(Color::White),
            ),
        ];
        for (fen, err) in cases {
            assert_eq!(Position::from_fen(fen, nine()).unwrap_err(), err, "{fen}");
        }
        assert!(matches!(
            Position::from_fen("********/********/******** w p r 0 9 0 9 0 0 1", nine()),
            Err(FenError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_hand_counts_must_alternate() {
        let invalid = [
            // 黒番なのに白の手駒が残り、黒は打ち切っている
            "********/O*******/@******* b p r 1 1 1 0 1 0 9",
            // 白番で黒のほうが多く置いている
            "@*******/@@******/OO****** w p p 2 7 3 6 0 0 3",
            // 黒番で両者の置いた数が同じ
            "********/********/O*@***** b p p 1 8 1 8 0 0 2",
        ];
        for fen in invalid {
            assert_eq!(
                Position::from_fen(fen, nine()).unwrap_err(),
                FenError::Inconsistent("pieces in hand do not alternate"),
                "{fen}"
            );
        }

        let valid = [
            "********/********/O******* b p p 1 8 0 9 0 0 1",
            "********/@*****@*/OO*****O w p r 3 6 2 7 1 0 3",
            "@****O**/@@******/OO****** w p p 3 6 3 6 0 0 4",
        ];
        for fen in valid {
            assert!(Position::from_fen(fen, nine()).is_ok(), "{fen}");
        }
    }

    #[test]
    fn test_decided_position_becomes_game_over() {
        // 黒の盤上2枚・手駒なし
        let pos = Position::from_fen("O*O*O*O*/********/@*@***** w m s 4 0 2 0 0 0 30", nine())
            .unwrap();
        assert_eq!(pos.phase(), Phase::GameOver);
        let outcome = pos.outcome().unwrap();
        assert_eq!(outcome.reason, GameOverReason::LoseLessThanThree);
        assert_eq!(outcome.winner(), Some(Color::White));
    }

    #[test]
    fn test_blocked_side_loses() {
        // 外側 d7 g7 a7 が白、黒が d6 f6 b6 g4 a4 で隣を塞ぐ
        let pos = Position::from_fen(
            "********/@@*****@/OO@***@O w m s 3 0 5 0 0 0 30",
            nine(),
        )
        .unwrap();
        // 白は3枚なので飛べる
        assert!(pos.outcome().is_none());

        let rule = Arc::new(Rule {
            may_fly: false,
            ..Rule::nine_mens_morris()
        });
        let pos = Position::from_fen("********/@@*****@/OO@***@O w m s 3 0 5 0 0 0 30", rule)
            .unwrap();
        let outcome = pos.outcome().unwrap();
        assert_eq!(outcome.reason, GameOverReason::LoseNoWay);
        assert_eq!(outcome.winner(), Some(Color::Black));
    }
}

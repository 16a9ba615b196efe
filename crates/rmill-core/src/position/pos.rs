//! 局面（Position）

use std::sync::Arc;

use thiserror::Error;

use super::geometry::Geometry;
use super::state::StateInfo;
use super::zobrist::ZOBRIST;
use crate::eval::psqt::{self, HAND_SCORE};
use crate::nnue::{DirtyPiece, HandChange};
use crate::rule::{BoardFullAction, Rule, StalemateAction};
use crate::types::{
    Action, Bitboard, Color, GameOutcome, GameOverReason, Move, MoveType, Phase, Piece, Score,
    Square, square_bb,
};

/// 指し手を適用できない理由
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,
    #[error("illegal move: {0}")]
    Illegal(Move),
}

/// 局面
#[derive(Clone)]
pub struct Position {
    rule: Arc<Rule>,
    geometry: &'static Geometry,
    /// 盤面配列（添字は Square の内部値）
    board: [Piece; 32],
    by_color: [Bitboard; Color::NUM],
    st: StateInfo,
    /// do_move 前の StateInfo のスタック
    history: Vec<StateInfo>,
}

impl Position {
    /// ルールに従った開始局面
    pub fn new(rule: Arc<Rule>) -> Position {
        let hand = rule.piece_count;
        let mut pos = Position::empty(rule);
        pos.st.phase = Phase::Placing;
        pos.st.action = Action::Place;
        pos.st.piece_in_hand = [hand; Color::NUM];
        pos.st.key = pos.compute_key();
        pos.st.psq = pos.compute_psq();
        pos
    }

    /// 駒も手駒もない局面（FEN 解析の出発点）
    pub(super) fn empty(rule: Arc<Rule>) -> Position {
        let geometry = Geometry::get(rule.has_diagonal_lines);
        Position {
            rule,
            geometry,
            board: [Piece::Empty; 32],
            by_color: [Bitboard::EMPTY; Color::NUM],
            st: StateInfo::default(),
            history: Vec::with_capacity(256),
        }
    }

    // =========================================================================
    // 参照系
    // =========================================================================

    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[inline]
    pub fn rule_arc(&self) -> &Arc<Rule> {
        &self.rule
    }

    #[inline]
    pub fn geometry(&self) -> &'static Geometry {
        self.geometry
    }

    #[inline]
    pub fn state(&self) -> &StateInfo {
        &self.st
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.st.side_to_move
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.st.phase
    }

    #[inline]
    pub fn action(&self) -> Action {
        self.st.action
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.st.key
    }

    /// 駒割り（白視点、中盤/終盤）
    #[inline]
    pub fn psq(&self) -> Score {
        self.st.psq
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.raw() as usize]
    }

    #[inline]
    pub fn pieces(&self, c: Color) -> Bitboard {
        self.by_color[c.index()]
    }

    #[inline]
    pub fn banned(&self) -> Bitboard {
        self.st.banned
    }

    /// 空いている交点（禁止点を除く）
    #[inline]
    pub fn empty_squares(&self) -> Bitboard {
        !(self.by_color[0] | self.by_color[1] | self.st.banned)
    }

    #[inline]
    pub fn in_hand(&self, c: Color) -> u8 {
        self.st.piece_in_hand[c.index()]
    }

    #[inline]
    pub fn on_board(&self, c: Color) -> u8 {
        self.st.piece_on_board[c.index()]
    }

    #[inline]
    pub fn need_remove(&self) -> u8 {
        self.st.need_remove
    }

    #[inline]
    pub fn rule50(&self) -> u32 {
        self.st.rule50
    }

    #[inline]
    pub fn game_ply(&self) -> u32 {
        self.st.game_ply
    }

    #[inline]
    pub fn last_move(&self) -> Move {
        self.st.last_move
    }

    /// 巻き戻せる手数
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 配置フェーズ（開始前を含む）か
    #[inline]
    pub fn is_placing(&self) -> bool {
        matches!(self.st.phase, Phase::Ready | Phase::Placing)
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.st.phase == Phase::GameOver
    }

    /// 両者とも手駒を使い切ったか
    #[inline]
    fn hands_empty(&self) -> bool {
        self.st.piece_in_hand == [0; Color::NUM]
    }

    /// c が飛べるか
    #[inline]
    pub fn can_fly(&self, c: Color) -> bool {
        self.rule.may_fly
            && self.st.piece_in_hand[c.index()] == 0
            && self.st.piece_on_board[c.index()] <= self.rule.fly_piece_count
    }

    /// 視点 c の特徴量バケット（0: 配置, 1: 移動, 2: 飛び）
    #[inline]
    pub fn anchor(&self, c: Color) -> usize {
        if !self.hands_empty() {
            0
        } else if self.can_fly(c) {
            2
        } else {
            1
        }
    }

    /// どちらかが飛べる終盤か
    #[inline]
    pub fn is_endgame(&self) -> bool {
        !self.is_placing() && (self.can_fly(Color::White) || self.can_fly(Color::Black))
    }

    // =========================================================================
    // mill 関連
    // =========================================================================

    /// sq の駒が mill の一部か
    #[inline]
    pub fn in_mill(&self, sq: Square) -> bool {
        match self.piece_on(sq).color() {
            Some(c) => self.geometry.mills_at(sq, self.pieces(c)) > 0,
            None => false,
        }
    }

    /// c の駒がすべて mill の一部か
    pub fn all_in_mills(&self, c: Color) -> bool {
        self.pieces(c).iter().all(|sq| self.in_mill(sq))
    }

    /// sq の駒を取れるか
    pub fn is_removable(&self, sq: Square) -> bool {
        let Some(c) = self.piece_on(sq).color() else {
            return false;
        };
        self.rule.may_remove_from_mills_always || !self.in_mill(sq) || self.all_in_mills(c)
    }

    /// 配置・移動手で完成する手番側の mill の数
    pub fn mills_closed_by(&self, m: Move) -> u8 {
        let us = self.side_to_move();
        match m.move_type() {
            MoveType::Place => self.geometry.potential_mills_at(m.to(), self.pieces(us)),
            MoveType::Move => {
                let ours = self.pieces(us) & !square_bb(m.from());
                self.geometry.potential_mills_at(m.to(), ours)
            }
            MoveType::Remove => 0,
        }
    }

    /// 配置・移動先が相手の mill 完成を妨げるか
    pub fn blocks_mill(&self, m: Move) -> bool {
        if m.is_remove() {
            return false;
        }
        let them = !self.side_to_move();
        self.geometry.potential_mills_at(m.to(), self.pieces(them)) > 0
    }

    /// c に移動手があるか
    pub fn has_legal_slide(&self, c: Color) -> bool {
        let empty = self.empty_squares();
        if self.can_fly(c) {
            return !empty.is_empty() && !self.pieces(c).is_empty();
        }
        self.pieces(c)
            .iter()
            .any(|sq| !(self.geometry.adjacent(sq) & empty).is_empty())
    }

    // =========================================================================
    // 合法性
    // =========================================================================

    /// 現局面で m が合法か
    pub fn is_legal(&self, m: Move) -> bool {
        if self.is_game_over() || !m.is_ok() {
            return false;
        }
        let us = self.side_to_move();
        let to = m.to();
        if !to.is_ok() {
            return false;
        }
        match (self.st.action, m.move_type()) {
            (Action::Remove, MoveType::Remove) => {
                m == Move::new_remove(to)
                    && self.pieces(!us).contains(to)
                    && self.is_removable(to)
            }
            (Action::Place, MoveType::Place) => {
                m == Move::new_place(to) && self.in_hand(us) > 0 && self.empty_squares().contains(to)
            }
            (Action::Select, MoveType::Move) => {
                let from = m.from();
                from.is_ok()
                    && m == Move::new_move(from, to)
                    && self.pieces(us).contains(from)
                    && self.empty_squares().contains(to)
                    && (self.can_fly(us) || self.geometry.adjacent(from).contains(to))
            }
            _ => false,
        }
    }

    // =========================================================================
    // 手の実行と巻き戻し
    // =========================================================================

    /// 合法性を検査してから手を進める
    pub fn make_move(&mut self, m: Move) -> Result<(), MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if !self.is_legal(m) {
            return Err(MoveError::Illegal(m));
        }
        self.do_move(m);
        Ok(())
    }

    /// 手を進める（m は合法手であること）
    ///
    /// mill を完成させた手では手番が変わらず、`Action::Remove` になる。
    pub fn do_move(&mut self, m: Move) -> DirtyPiece {
        debug_assert!(self.is_legal(m), "illegal move {m} in {}", self.to_fen());

        let us = self.side_to_move();
        let them = !us;
        let anchors_before = [self.anchor(Color::White), self.anchor(Color::Black)];

        self.history.push(self.st);
        let mut dp = DirtyPiece::default();

        self.st.last_move = m;
        self.st.game_ply += 1;
        if self.st.phase == Phase::Ready {
            self.st.phase = Phase::Placing;
        }

        match m.move_type() {
            MoveType::Place => {
                let to = m.to();
                let pc = Piece::from_color(us);
                self.put_piece(pc, to);
                dp.push_board(to, Piece::Empty, pc);
                let old = self.in_hand(us);
                self.set_hand(us, old - 1);
                dp.hand = Some(HandChange {
                    color: us,
                    old,
                    new: old - 1,
                });
                self.st.piece_on_board[us.index()] += 1;
                self.after_arrival(to, &mut dp);
            }
            MoveType::Move => {
                let from = m.from();
                let to = m.to();
                let pc = Piece::from_color(us);
                self.remove_piece(from);
                self.put_piece(pc, to);
                dp.push_board(from, pc, Piece::Empty);
                dp.push_board(to, Piece::Empty, pc);
                self.st.rule50 += 1;
                self.after_arrival(to, &mut dp);
            }
            MoveType::Remove => {
                let sq = m.to();
                let pc = self.piece_on(sq);
                self.remove_piece(sq);
                let replaced = if self.is_placing() && self.rule.has_banned_locations {
                    self.put_ban(sq);
                    Piece::Ban
                } else {
                    Piece::Empty
                };
                dp.push_board(sq, pc, replaced);
                self.st.piece_on_board[them.index()] -= 1;
                self.st.rule50 = 0;
                let rest = self.st.need_remove - 1;
                self.set_need_remove(rest);
                let total = self.on_board(them) + self.in_hand(them);
                if rest == 0
                    || self.on_board(them) == 0
                    || total < self.rule.pieces_at_least_count
                {
                    self.set_need_remove(0);
                    self.end_turn(&mut dp);
                }
            }
        }

        for c in Color::ALL {
            if self.anchor(c) != anchors_before[c.index()] {
                dp.anchor_changed[c.index()] = true;
            }
        }

        self.debug_check_consistency();
        dp
    }

    /// 直前の手を戻す
    pub fn undo_move(&mut self) {
        let Some(prev) = self.history.pop() else {
            debug_assert!(false, "undo_move without history");
            return;
        };
        let m = self.st.last_move;
        let us = prev.side_to_move;

        match m.move_type() {
            MoveType::Place => {
                let to = m.to();
                self.board[to.raw() as usize] = Piece::Empty;
                self.by_color[us.index()] ^= square_bb(to);
            }
            MoveType::Move => {
                let from = m.from();
                let to = m.to();
                self.board[to.raw() as usize] = Piece::Empty;
                self.by_color[us.index()] ^= square_bb(to);
                self.board[from.raw() as usize] = Piece::from_color(us);
                self.by_color[us.index()] |= square_bb(from);
            }
            MoveType::Remove => {
                let sq = m.to();
                self.board[sq.raw() as usize] = Piece::from_color(!us);
                self.by_color[(!us).index()] |= square_bb(sq);
            }
        }
        // フェーズ移行で消えた禁止点を戻す
        for sq in prev.banned & !self.st.banned {
            self.board[sq.raw() as usize] = Piece::Ban;
        }
        // この手で置いた禁止点は上の Remove 処理で上書き済み
        self.st = prev;

        self.debug_check_consistency();
    }

    /// 置いた・動かした駒が mill を作ったかを見て、除去待ちか手番交代にする
    fn after_arrival(&mut self, to: Square, dp: &mut DirtyPiece) {
        let us = self.side_to_move();
        let them = !us;
        let mills = self.geometry.mills_at(to, self.pieces(us));
        if mills > 0 && self.on_board(them) > 0 {
            let n = if self.rule.may_remove_multiple { mills } else { 1 };
            self.set_need_remove(n);
            self.st.action = Action::Remove;
            self.st.outcome = None;
        } else {
            self.end_turn(dp);
        }
    }

    /// 盤が埋まって置けなくなったか（禁止点が残っていれば移動フェーズで空く）
    #[inline]
    fn is_board_full(&self) -> bool {
        self.empty_squares().is_empty() && self.st.banned.is_empty()
    }

    /// 手番を渡し、フェーズ移行と終局を判定する
    ///
    /// 配置で盤が埋まった場合は移動フェーズに移らず、配置フェーズのまま終局判定する。
    fn end_turn(&mut self, dp: &mut DirtyPiece) {
        if self.st.phase == Phase::Placing && self.hands_empty() && !self.is_board_full() {
            self.st.phase = Phase::Moving;
            if !self.st.banned.is_empty() {
                for sq in self.st.banned {
                    self.board[sq.raw() as usize] = Piece::Empty;
                    self.st.key ^= ZOBRIST.psq(Piece::Ban, sq);
                }
                self.st.banned = Bitboard::EMPTY;
                dp.anchor_changed = [true; Color::NUM];
            }
        }

        self.st.side_to_move = !self.st.side_to_move;
        self.st.key ^= ZOBRIST.side();
        self.st.action = if self.is_placing() {
            Action::Place
        } else {
            Action::Select
        };

        self.st.outcome = self.compute_outcome();
        if self.st.outcome.is_some() {
            self.st.phase = Phase::GameOver;
        }
    }

    // =========================================================================
    // 盤面更新（キーと駒割りを同時に更新）
    // =========================================================================

    #[inline]
    fn put_piece(&mut self, pc: Piece, sq: Square) {
        let Some(c) = pc.color() else {
            return;
        };
        self.board[sq.raw() as usize] = pc;
        self.by_color[c.index()] |= square_bb(sq);
        self.st.key ^= ZOBRIST.psq(pc, sq);
        let s = psqt::psq(self.geometry, sq);
        match c {
            Color::White => self.st.psq += s,
            Color::Black => self.st.psq -= s,
        }
    }

    #[inline]
    fn remove_piece(&mut self, sq: Square) {
        let pc = self.piece_on(sq);
        let Some(c) = pc.color() else {
            return;
        };
        self.board[sq.raw() as usize] = Piece::Empty;
        self.by_color[c.index()] ^= square_bb(sq);
        self.st.key ^= ZOBRIST.psq(pc, sq);
        let s = psqt::psq(self.geometry, sq);
        match c {
            Color::White => self.st.psq -= s,
            Color::Black => self.st.psq += s,
        }
    }

    #[inline]
    fn put_ban(&mut self, sq: Square) {
        self.board[sq.raw() as usize] = Piece::Ban;
        self.st.banned |= square_bb(sq);
        self.st.key ^= ZOBRIST.psq(Piece::Ban, sq);
    }

    #[inline]
    fn set_hand(&mut self, c: Color, n: u8) {
        let old = self.st.piece_in_hand[c.index()];
        self.st.key ^= ZOBRIST.hand(c, old) ^ ZOBRIST.hand(c, n);
        let delta = HAND_SCORE * (n as i32 - old as i32);
        match c {
            Color::White => self.st.psq += delta,
            Color::Black => self.st.psq -= delta,
        }
        self.st.piece_in_hand[c.index()] = n;
    }

    #[inline]
    fn set_need_remove(&mut self, n: u8) {
        self.st.key ^= ZOBRIST.need_remove(self.st.need_remove) ^ ZOBRIST.need_remove(n);
        self.st.need_remove = n;
    }

    // =========================================================================
    // 再計算・検証
    // =========================================================================

    /// Zobristキーを盤面から計算し直す
    pub fn compute_key(&self) -> u64 {
        let mut key = 0;
        for sq in Square::all() {
            key ^= ZOBRIST.psq(self.piece_on(sq), sq);
        }
        if self.st.side_to_move == Color::Black {
            key ^= ZOBRIST.side();
        }
        for c in Color::ALL {
            key ^= ZOBRIST.hand(c, self.in_hand(c));
        }
        key ^ ZOBRIST.need_remove(self.st.need_remove)
    }

    /// 駒割りを盤面から計算し直す
    pub fn compute_psq(&self) -> Score {
        let mut s = Score::ZERO;
        for sq in self.pieces(Color::White) {
            s += psqt::psq(self.geometry, sq);
        }
        for sq in self.pieces(Color::Black) {
            s -= psqt::psq(self.geometry, sq);
        }
        s + HAND_SCORE * (self.in_hand(Color::White) as i32 - self.in_hand(Color::Black) as i32)
    }

    #[inline]
    fn debug_check_consistency(&self) {
        if cfg!(any(debug_assertions, feature = "debug")) {
            assert_eq!(self.st.key, self.compute_key(), "zobrist key diverged: {}", self.to_fen());
            assert_eq!(self.st.psq, self.compute_psq(), "psq diverged: {}", self.to_fen());
        }
    }

    // =========================================================================
    // 終局判定
    // =========================================================================

    /// 現局面が同一局面として過去に現れた回数（除去以降の移動手の範囲）
    pub fn repetition_count(&self) -> usize {
        let window = (self.st.rule50 as usize).min(self.history.len());
        let start = self.history.len() - window;
        self.history[start..]
            .iter()
            .filter(|s| s.key == self.st.key)
            .count()
    }

    /// 現局面が過去に一度でも現れたか
    #[inline]
    pub fn has_repeated(&self) -> bool {
        self.repetition_count() > 0
    }

    /// 終局判定
    ///
    /// 局面状態だけで決まる。終局していなければ None。
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.st.outcome.or_else(|| self.compute_outcome())
    }

    pub(super) fn compute_outcome(&self) -> Option<GameOutcome> {
        let rule = &*self.rule;
        let side = self.side_to_move();

        for c in [side, !side] {
            let total = self.on_board(c) as u32 + self.in_hand(c) as u32;
            if total < rule.pieces_at_least_count as u32 {
                return Some(GameOutcome::win(!c, GameOverReason::LoseLessThanThree));
            }
        }

        // 除去待ちは必ず取れる駒がある
        if self.st.action == Action::Remove {
            return None;
        }

        if self.is_placing() {
            if self.empty_squares().is_empty() {
                return Some(match rule.board_full_action {
                    BoardFullAction::FirstPlayerLose => {
                        GameOutcome::win(Color::Black, GameOverReason::LoseBoardIsFull)
                    }
                    BoardFullAction::AgreeToDraw => {
                        GameOutcome::draw(GameOverReason::DrawBoardIsFull)
                    }
                });
            }
            return None;
        }

        if !self.has_legal_slide(side) {
            return Some(match rule.stalemate_action {
                StalemateAction::EndWithStalemateLoss => {
                    GameOutcome::win(!side, GameOverReason::LoseNoWay)
                }
                StalemateAction::EndWithStalemateDraw => GameOutcome::draw(GameOverReason::DrawNoWay),
            });
        }

        if rule.n_move_rule > 0 && self.st.rule50 >= rule.n_move_rule {
            return Some(GameOutcome::draw(GameOverReason::DrawRule50));
        }
        if rule.endgame_n_move_rule > 0
            && self.is_endgame()
            && self.st.rule50 >= rule.endgame_n_move_rule
        {
            return Some(GameOutcome::draw(GameOverReason::DrawEndgameRule50));
        }
        if rule.threefold_repetition_rule && self.repetition_count() >= 2 {
            return Some(GameOutcome::draw(GameOverReason::DrawThreefoldRepetition));
        }
        None
    }

    /// FEN 解析時に状態をまとめて設定する
    pub(super) fn set_state(&mut self, st: StateInfo) {
        self.st = st;
    }

    /// FEN 解析時に盤面を設定する
    pub(super) fn set_square(&mut self, sq: Square, pc: Piece) {
        self.board[sq.raw() as usize] = pc;
        match pc.color() {
            Some(c) => self.by_color[c.index()] |= square_bb(sq),
            None if pc == Piece::Ban => self.st.banned |= square_bb(sq),
            None => {}
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.by_color == other.by_color
            && self.st == other.st
            && self.history == other.history
            && self.rule == other.rule
    }
}

impl Eq for Position {}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Position").field("fen", &self.to_fen()).finish()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = |name: &str| {
            Square::from_name(name)
                .map(|sq| self.piece_on(sq).to_char())
                .unwrap_or(' ')
        };
        writeln!(f, "{}-----{}-----{}", c("a7"), c("d7"), c("g7"))?;
        writeln!(f, "| {}---{}---{} |", c("b6"), c("d6"), c("f6"))?;
        writeln!(f, "| | {}-{}-{} | |", c("c5"), c("d5"), c("e5"))?;
        writeln!(
            f,
            "{}-{}-{}   {}-{}-{}",
            c("a4"),
            c("b4"),
            c("c4"),
            c("e4"),
            c("f4"),
            c("g4")
        )?;
        writeln!(f, "| | {}-{}-{} | |", c("c3"), c("d3"), c("e3"))?;
        writeln!(f, "| {}---{}---{} |", c("b2"), c("d2"), c("f2"))?;
        writeln!(f, "{}-----{}-----{}", c("a1"), c("d1"), c("g1"))?;
        write!(f, "{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal_moves;

    fn sq(name: &str) -> Square {
        Square::from_name(name).unwrap()
    }

    fn nine() -> Arc<Rule> {
        Arc::new(Rule::nine_mens_morris())
    }

    #[test]
    fn test_start_position() {
        let pos = Position::new(nine());
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.phase(), Phase::Placing);
        assert_eq!(pos.action(), Action::Place);
        assert_eq!(pos.in_hand(Color::White), 9);
        assert_eq!(pos.in_hand(Color::Black), 9);
        assert_eq!(pos.empty_squares().count(), 24);
        assert_eq!(pos.key(), pos.compute_key());
        assert_eq!(pos.psq(), Score::ZERO);
        assert!(pos.outcome().is_none());
    }

    #[test]
    fn test_place_and_undo_restores_everything() {
        let mut pos = Position::new(nine());
        let before = pos.clone();
        let dp = pos.do_move(Move::new_place(sq("d7")));
        assert_eq!(pos.piece_on(sq("d7")), Piece::White);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.in_hand(Color::White), 8);
        assert_eq!(dp.board_changes().len(), 1);
        assert_eq!(
            dp.hand,
            Some(HandChange {
                color: Color::White,
                old: 9,
                new: 8
            })
        );
        pos.undo_move();
        assert_eq!(pos, before);
    }

    #[test]
    fn test_mill_keeps_side_and_requires_remove() {
        let mut pos = Position::new(nine());
        for m in ["a7", "a1", "d7", "d1"] {
            pos.make_move(Move::from_notation(m).unwrap()).unwrap();
        }
        pos.make_move(Move::new_place(sq("g7"))).unwrap();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.action(), Action::Remove);
        assert_eq!(pos.need_remove(), 1);
        assert!(pos.is_legal(Move::new_remove(sq("a1"))));
        assert!(!pos.is_legal(Move::new_place(sq("g1"))));

        pos.make_move(Move::new_remove(sq("a1"))).unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.on_board(Color::Black), 1);
        assert_eq!(pos.piece_on(sq("a1")), Piece::Empty);
        assert_eq!(pos.rule50(), 0);
    }

    #[test]
    fn test_pieces_in_mill_are_protected() {
        // 黒: c5 d5 e5 が mill、a4 は単独
        let pos = Position::from_fen(
            "@@*****@/********/OO**O*@O w m r 4 0 4 0 1 0 20",
            nine(),
        )
        .unwrap();
        assert!(pos.in_mill(sq("d5")));
        assert!(!pos.in_mill(sq("a4")));
        assert!(pos.is_legal(Move::new_remove(sq("a4"))));
        assert!(!pos.is_legal(Move::new_remove(sq("d5"))));
        assert!(!pos.is_legal(Move::new_remove(sq("d7"))), "cannot remove own piece");
    }

    #[test]
    fn test_remove_from_mill_when_all_in_mills() {
        let pos = Position::from_fen(
            "@@*****@/********/OO**O**O w m r 4 0 3 0 1 0 20",
            nine(),
        )
        .unwrap();
        assert!(pos.all_in_mills(Color::Black));
        assert!(pos.is_legal(Move::new_remove(sq("d5"))));
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let mut pos = Position::from_fen(
            "@@*****@/********/OO**O**O w m r 4 0 3 0 1 0 20",
            nine(),
        )
        .unwrap();
        pos.make_move(Move::new_remove(sq("d5"))).unwrap();
        assert_eq!(pos.phase(), Phase::GameOver);
        let outcome = pos.outcome().unwrap();
        assert_eq!(outcome.reason, GameOverReason::LoseLessThanThree);
        assert_eq!(outcome.winner(), Some(Color::White));
        assert_eq!(
            pos.make_move(Move::new_move(sq("c5"), sq("c4"))),
            Err(MoveError::GameOver)
        );
        assert!(legal_moves(&pos).is_empty());
    }

    #[test]
    fn test_phase_transition_after_last_placement() {
        let mut pos = Position::from_fen(
            "********/********/O*O*@*@* w p p 2 1 2 1 0 0 9",
            nine(),
        )
        .unwrap();
        pos.make_move(Move::new_place(sq("g7"))).unwrap();
        assert_eq!(pos.phase(), Phase::Placing);
        let dp = pos.do_move(Move::new_place(sq("a1")));
        assert_eq!(pos.phase(), Phase::Moving);
        assert_eq!(pos.action(), Action::Select);
        assert_eq!(pos.side_to_move(), Color::White);
        assert!(dp.anchor_changed.iter().all(|&c| c));
        assert!(pos.outcome().is_none());
    }

    #[test]
    fn test_banned_squares_cleared_when_moving_starts() {
        let rule = Arc::new(Rule::twelve_mens_morris());
        let mut pos = Position::from_fen(
            "@*******/********/*OOO@*@* w p r 3 0 3 1 1 0 9",
            rule,
        )
        .unwrap();
        let start = pos.clone();

        pos.make_move(Move::new_remove(sq("a4"))).unwrap();
        assert_eq!(pos.piece_on(sq("a4")), Piece::Ban);
        assert!(pos.banned().contains(sq("a4")));
        assert!(!pos.is_legal(Move::new_place(sq("a4"))));
        assert_eq!(pos.phase(), Phase::Placing);

        pos.make_move(Move::new_place(sq("d6"))).unwrap();
        assert_eq!(pos.phase(), Phase::Moving);
        assert!(pos.banned().is_empty());
        assert_eq!(pos.piece_on(sq("a4")), Piece::Empty);

        pos.undo_move();
        assert_eq!(pos.piece_on(sq("a4")), Piece::Ban);
        assert_eq!(pos.phase(), Phase::Placing);
        pos.undo_move();
        assert_eq!(pos, start);
    }

    #[test]
    fn test_board_full_after_last_placement() {
        // 12個制: 黒が最後の1枚を e3 に置くと盤が埋まる（mill はできない）
        let fen = "OOO*O@O@/@@OO@O@O/O@@O@@@O b p p 12 0 11 1 0 0 12";
        let cases = [
            (
                BoardFullAction::FirstPlayerLose,
                GameOutcome::win(Color::Black, GameOverReason::LoseBoardIsFull),
            ),
            (
                BoardFullAction::AgreeToDraw,
                GameOutcome::draw(GameOverReason::DrawBoardIsFull),
            ),
        ];
        for (action, expected) in cases {
            let rule = Arc::new(Rule {
                board_full_action: action,
                ..Rule::twelve_mens_morris()
            });
            let mut pos = Position::from_fen(fen, Arc::clone(&rule)).unwrap();
            let start = pos.clone();

            pos.make_move(Move::new_place(sq("e3"))).unwrap();
            assert!(pos.empty_squares().is_empty());
            assert_eq!(pos.phase(), Phase::GameOver);
            assert_eq!(pos.outcome(), Some(expected), "{action:?}");
            assert_eq!(pos.make_move(Move::new_place(sq("e3"))), Err(MoveError::GameOver));
            assert!(legal_moves(&pos).is_empty());

            // FEN を経由しても同じ判定になる
            let parsed = Position::from_fen(&pos.to_fen(), rule).unwrap();
            assert_eq!(parsed.outcome(), Some(expected));

            pos.undo_move();
            assert_eq!(pos, start);
        }
    }

    #[test]
    fn test_remove_below_minimum_ends_game_with_removals_pending() {
        let rule = Arc::new(Rule {
            may_remove_multiple: true,
            ..Rule::nine_mens_morris()
        });
        // 白が2個の除去待ち、黒は3枚
        let mut pos = Position::from_fen(
            "@*@*@***/********/OOOOO*** w m r 5 0 3 0 2 0 30",
            rule,
        )
        .unwrap();
        let start = pos.clone();

        pos.make_move(Move::new_remove(sq("d5"))).unwrap();
        assert_eq!(pos.need_remove(), 0);
        assert!(pos.is_game_over());
        let outcome = pos.outcome().unwrap();
        assert_eq!(outcome.reason, GameOverReason::LoseLessThanThree);
        assert_eq!(outcome.winner(), Some(Color::White));
        assert!(legal_moves(&pos).is_empty());
        assert_eq!(pos.make_move(Move::new_remove(sq("e4"))), Err(MoveError::GameOver));
        assert_eq!(pos.key(), pos.compute_key());

        pos.undo_move();
        assert_eq!(pos, start);
        assert_eq!(pos.need_remove(), 2);
    }

    #[test]
    fn test_illegal_move_is_rejected_without_mutation() {
        let mut pos = Position::new(nine());
        let before = pos.clone();
        assert_eq!(
            pos.make_move(Move::new_move(sq("d7"), sq("a7"))),
            Err(MoveError::Illegal(Move::new_move(sq("d7"), sq("a7"))))
        );
        assert_eq!(pos.make_move(Move::NULL), Err(MoveError::Illegal(Move::NULL)));
        assert_eq!(pos, before);
    }

    #[test]
    fn test_threefold_repetition() {
        let mut pos = Position::from_fen(
            "O*O*O*O*/********/@*@*@*@* w m s 4 0 4 0 0 0 40",
            nine(),
        )
        .unwrap();
        let shuffle = ["d5-e5", "d7-g7", "e5-d5", "g7-d7"];
        let mut count = 0;
        'outer: for _ in 0..3 {
            for m in shuffle {
                pos.make_move(Move::from_notation(m).unwrap()).unwrap();
                count += 1;
                if pos.is_game_over() {
                    break 'outer;
                }
            }
        }
        assert_eq!(count, 8);
        assert_eq!(
            pos.outcome().map(|o| o.reason),
            Some(GameOverReason::DrawThreefoldRepetition)
        );
    }
}

//! フェーズ・行動・終局理由

use super::Color;

/// ゲームのフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// 開始前（最初の着手で配置フェーズになる）
    Ready,
    /// 手駒を配置するフェーズ
    #[default]
    Placing,
    /// 盤上の駒を動かすフェーズ
    Moving,
    /// 終局
    GameOver,
}

impl Phase {
    pub const fn to_char(self) -> char {
        match self {
            Phase::Ready => 'r',
            Phase::Placing => 'p',
            Phase::Moving => 'm',
            Phase::GameOver => 'o',
        }
    }

    pub const fn from_char(c: char) -> Option<Phase> {
        match c {
            'r' => Some(Phase::Ready),
            'p' => Some(Phase::Placing),
            'm' => Some(Phase::Moving),
            'o' => Some(Phase::GameOver),
            _ => None,
        }
    }
}

/// 手番側に要求されている行動
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// 盤上の駒を選んで動かす
    Select,
    /// 手駒を置く
    #[default]
    Place,
    /// mill を作ったので相手の駒を取る
    Remove,
}

impl Action {
    pub const fn to_char(self) -> char {
        match self {
            Action::Select => 's',
            Action::Place => 'p',
            Action::Remove => 'r',
        }
    }

    pub const fn from_char(c: char) -> Option<Action> {
        match c {
            's' => Some(Action::Select),
            'p' => Some(Action::Place),
            'r' => Some(Action::Remove),
            _ => None,
        }
    }
}

/// 終局理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// 駒数が下限を割った
    LoseLessThanThree,
    /// 動かせる手がない
    LoseNoWay,
    /// 配置中に盤が埋まった（先手負けルール）
    LoseBoardIsFull,
    DrawThreefoldRepetition,
    DrawRule50,
    DrawEndgameRule50,
    DrawBoardIsFull,
    DrawNoWay,
}

impl GameOverReason {
    /// 対応する理由コード
    pub const fn code(self) -> &'static str {
        match self {
            GameOverReason::LoseLessThanThree => "loseLessThanThree",
            GameOverReason::LoseNoWay => "loseNoWay",
            GameOverReason::LoseBoardIsFull => "loseBoardIsFull",
            GameOverReason::DrawThreefoldRepetition => "drawThreefoldRepetition",
            GameOverReason::DrawRule50 => "drawRule50",
            GameOverReason::DrawEndgameRule50 => "drawEndgameRule50",
            GameOverReason::DrawBoardIsFull => "drawBoardIsFull",
            GameOverReason::DrawNoWay => "drawNoWay",
        }
    }
}

impl std::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// 勝敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    Win(Color),
    Draw,
}

/// 終局の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameOutcome {
    pub result: GameResult,
    pub reason: GameOverReason,
}

impl GameOutcome {
    #[inline]
    pub const fn win(winner: Color, reason: GameOverReason) -> Self {
        Self {
            result: GameResult::Win(winner),
            reason,
        }
    }

    #[inline]
    pub const fn draw(reason: GameOverReason) -> Self {
        Self {
            result: GameResult::Draw,
            reason,
        }
    }

    /// 勝者（引き分けなら None）
    #[inline]
    pub const fn winner(self) -> Option<Color> {
        match self.result {
            GameResult::Win(c) => Some(c),
            GameResult::Draw => None,
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.result {
            GameResult::Win(c) => write!(f, "{c} wins ({})", self.reason),
            GameResult::Draw => write!(f, "draw ({})", self.reason),
        }
    }
}

//! 局面表現モジュール
//!
//! ミルの局面を表現し、手の実行・巻き戻しを行う。
//!
//! - `Position`: 局面本体（盤面配列・Bitboard・ルール・履歴）
//! - `StateInfo`: 局面状態（Zobristハッシュ、手駒数、フェーズ、終局判定など）
//! - `Zobrist`: Zobristハッシュ乱数テーブル（駒×交点・手番・手駒数・未処理の除去数）
//! - `Geometry`: 隣接関係と mill ライン
//! - `do_move` / `undo_move`: 手の実行と巻き戻し（`StateInfo` をスタックとして管理）
//! - FEN形式の解析・出力
//!
//! 盤面配列・Bitboard・Zobristキーは `Position` のメソッドを通じてのみ更新し、
//! 常に互いに整合しているように保つ。

mod fen;
mod geometry;
mod pos;
mod state;
mod zobrist;

pub use fen::{FenError, START_FEN};
pub use geometry::Geometry;
pub use pos::{MoveError, Position};
pub use state::StateInfo;
pub use zobrist::{HAND_SLOTS, ZOBRIST, Zobrist};

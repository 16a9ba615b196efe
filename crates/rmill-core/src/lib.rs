//! # rmill-core
//!
//! ミル（Nine Men's Morris 系）エンジンのコアライブラリ。
//!
//! ## モジュール構成
//!
//! - `types`: 基本型（Color, Square, Piece, Move, Value, Score, Bound）
//! - `rule`: ルール設定（駒数・飛び・禁止点・引き分け規定）
//! - `position`: 局面表現と do_move/undo_move、FEN
//! - `movegen`: 合法手生成
//! - `eval`: 駒割り評価と評価器の切り替え
//! - `nnue`: NNUE評価関数（HalfMill 特徴量、差分更新）
//! - `tt`: 置換表（Transposition Table）
//! - `search`: 探索（PVS + 静止探索、LazySMP）

pub mod eval;
pub mod movegen;
pub mod nnue;
pub mod position;
pub mod rule;
pub mod search;
pub mod tt;
pub mod types;

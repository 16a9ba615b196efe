//! NNUE（Efficiently Updatable Neural Network）評価関数
//!
//! - `features`: HalfMill 特徴量（アンカー × 盤上駒・手駒数）
//! - `accumulator`: 視点ごとの累積値と do_move に対応するスタック
//! - `feature_transformer`: 294 → 512 の変換（全計算・差分更新）
//! - `layers`: AffineTransform / ClippedReLU
//! - `network`: 1024→16→32→1 の層とファイル形式
//! - `evaluator`: Network と Stack の組（スレッドごと）

mod accumulator;
mod aligned;
pub mod constants;
mod dirty_piece;
mod error;
mod evaluator;
mod feature_transformer;
pub mod features;
mod layers;
mod network;

pub use accumulator::{Accumulator, AccumulatorStack};
pub use aligned::{Aligned, AlignedBox, Zeroable};
pub use dirty_piece::{BoardChange, DirtyPiece, HandChange};
pub use error::{NnueError, NnueResult};
pub use evaluator::NnueEvaluator;
pub use feature_transformer::FeatureTransformer;
pub use layers::{AffineTransform, ClippedReLU};
pub use network::{Network, network_hash};

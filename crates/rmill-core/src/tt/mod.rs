//! 置換表モジュール
//!
//! 探索結果を全スレッドで共有する置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（`AtomicU64` 2語、XOR 検証つき）
//! - `Cluster`: 4エントリ = 64バイト（キャッシュライン）
//! - `TranspositionTable`: テーブル本体（クラスター数は2の冪）
//! - 世代管理
//!
//! # ロックレス書き込み
//!
//! エントリは `key ^ data` と `data` の2語で保存する。
//! 別スレッドの書き込みと競合して2語が食い違った場合は XOR 検証に失敗し、
//! 単なるミスとして扱われる（偽のヒットは起きない）。

mod alloc;
mod entry;
mod table;

use thiserror::Error;

pub use entry::{TTData, TTEntry};
pub use table::{ProbeResult, TranspositionTable};

/// クラスターサイズ（エントリ数）
/// 16bytes × 4 = 64bytes
pub const CLUSTER_SIZE: usize = 4;

/// Generation関連の定数
pub const GENERATION_BITS: u32 = 3;
pub const GENERATION_DELTA: u8 = 1 << GENERATION_BITS; // 8
pub const GENERATION_CYCLE: u16 = 255 + GENERATION_DELTA as u16;
pub const GENERATION_MASK: u16 = 0xF8; // (0xFF << GENERATION_BITS) as u8

/// 置換表サイズの上限（MiB）
pub const MAX_HASH_MB: usize = 1 << 20;

/// 置換表の確保エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TtError {
    #[error("transposition table size must be at least 1 MiB")]
    ZeroSize,
    #[error("failed to allocate {bytes} bytes for the transposition table")]
    Alloc { bytes: usize },
}

//! NNUE のエラー型

use std::io;

use thiserror::Error;

/// NNUE 読み込み時のエラー
#[derive(Debug, Error)]
pub enum NnueError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("unsupported NNUE version {found:#010x} (expected {expected:#010x})")]
    Version { found: u32, expected: u32 },

    #[error("{section} hash mismatch: {found:#010x} (expected {expected:#010x})")]
    Hash {
        section: &'static str,
        found: u32,
        expected: u32,
    },

    #[error("architecture string too long: {0} bytes")]
    ArchTooLong(usize),

    #[error("architecture mismatch: {0}")]
    Architecture(String),

    #[error("{0} bytes of trailing data after the network")]
    TrailingData(usize),
}

/// NNUE 操作の Result
pub type NnueResult<T> = Result<T, NnueError>;

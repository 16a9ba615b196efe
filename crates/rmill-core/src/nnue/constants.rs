//! NNUE定数定義
//!
//! HalfMill 294→512x2-16-32-1 アーキテクチャのネットワーク構造と
//! スケーリングに関する定数をまとめる。

/// 評価関数ファイルのバージョン
pub const NNUE_VERSION: u32 = 0x7AF3_2F20;

/// アーキテクチャ文字列の最大長（破損ファイル対策）
pub const MAX_ARCH_LEN: usize = 4096;

/// 出力層の値を評価値に直すときの除数
pub const FV_SCALE: i32 = 16;

/// 重みのスケーリングビット数
pub const WEIGHT_SCALE_BITS: u32 = 6;

/// キャッシュラインサイズ（バイト）
pub const CACHE_LINE_SIZE: usize = 64;

/// 変換後の次元数（片方の視点）
pub const TRANSFORMED_FEATURE_DIMENSIONS: usize = 512;

/// 隠れ層1の出力次元
pub const HIDDEN1_DIMENSIONS: usize = 16;

/// 隠れ層2の出力次元
pub const HIDDEN2_DIMENSIONS: usize = 32;

/// アーキテクチャ文字列（ファイルヘッダに埋め込む）
pub const ARCHITECTURE: &str =
    "Features=HalfMill(Friend)[294->512x2],Network=AffineTransform[1<-32](ClippedReLU[32](AffineTransform[32<-16](ClippedReLU[16](AffineTransform[16<-1024](InputSlice[1024(0:1024)])))))";

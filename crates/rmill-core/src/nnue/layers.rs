//! ネットワーク層の実装
//!
//! - `AffineTransform`: 全結合アフィン変換層（入力×重み + バイアス）
//! - `ClippedReLU`: 整数スケーリング付きのクリップ付き ReLU 層

use std::io::{self, Read, Write};

use rand::Rng;

use super::aligned::AlignedBox;
use super::constants::WEIGHT_SCALE_BITS;

/// パディング済み入力次元
pub const fn padded_input(input_dim: usize) -> usize {
    input_dim.div_ceil(32) * 32
}

/// アフィン変換層
pub struct AffineTransform<const INPUT_DIM: usize, const OUTPUT_DIM: usize> {
    /// バイアス
    pub biases: [i32; OUTPUT_DIM],
    /// 重み（weights[output][padded input]、64バイトアライン）
    pub weights: AlignedBox<i8>,
}

impl<const INPUT_DIM: usize, const OUTPUT_DIM: usize> AffineTransform<INPUT_DIM, OUTPUT_DIM> {
    pub const PADDED_INPUT: usize = padded_input(INPUT_DIM);

    /// 構造ハッシュ
    pub const fn hash_value(prev_hash: u32) -> u32 {
        let mut hash = 0xCC03_DAE4u32;
        hash = hash.wrapping_add(OUTPUT_DIM as u32);
        hash ^= prev_hash >> 1;
        hash ^= prev_hash << 31;
        hash
    }

    /// ファイルから読み込み
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut biases = [0i32; OUTPUT_DIM];
        let mut buf4 = [0u8; 4];
        for bias in biases.iter_mut() {
            reader.read_exact(&mut buf4)?;
            *bias = i32::from_le_bytes(buf4);
        }

        let weight_size = OUTPUT_DIM * Self::PADDED_INPUT;
        let mut weights = AlignedBox::new_zeroed(weight_size);
        let mut buf = vec![0u8; weight_size];
        reader.read_exact(&mut buf)?;
        for (w, &b) in weights.iter_mut().zip(&buf) {
            *w = b as i8;
        }

        Ok(Self { biases, weights })
    }

    /// ファイルへ書き出し
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for bias in &self.biases {
            writer.write_all(&bias.to_le_bytes())?;
        }
        let bytes: Vec<u8> = self.weights.iter().map(|&w| w as u8).collect();
        writer.write_all(&bytes)
    }

    /// 乱数で初期化（パディング部分は0のまま）
    pub fn random<R: Rng>(rng: &mut R, weight_range: i8, bias_range: i32) -> Self {
        let mut biases = [0i32; OUTPUT_DIM];
        for bias in biases.iter_mut() {
            *bias = rng.random_range(-bias_range..=bias_range);
        }
        let mut weights = AlignedBox::new_zeroed(OUTPUT_DIM * Self::PADDED_INPUT);
        for j in 0..OUTPUT_DIM {
            for i in 0..INPUT_DIM {
                weights[j * Self::PADDED_INPUT + i] = rng.random_range(-weight_range..=weight_range);
            }
        }
        Self { biases, weights }
    }

    /// 順伝播
    pub fn propagate(&self, input: &[u8], output: &mut [i32; OUTPUT_DIM]) {
        debug_assert!(input.len() >= INPUT_DIM);
        for (j, (out, &bias)) in output.iter_mut().zip(&self.biases).enumerate() {
            let row = &self.weights[j * Self::PADDED_INPUT..j * Self::PADDED_INPUT + INPUT_DIM];
            let mut sum = bias;
            for (&w, &x) in row.iter().zip(input) {
                sum += w as i32 * x as i32;
            }
            *out = sum;
        }
    }
}

/// ClippedReLU層
/// 入力: i32、出力: u8（0-127にクランプ）
pub struct ClippedReLU<const DIM: usize>;

impl<const DIM: usize> ClippedReLU<DIM> {
    /// 構造ハッシュ
    pub const fn hash_value(prev_hash: u32) -> u32 {
        0x538D_24C7u32.wrapping_add(prev_hash)
    }

    /// 順伝播
    pub fn propagate(input: &[i32; DIM], output: &mut [u8; DIM]) {
        for (out, &v) in output.iter_mut().zip(input) {
            *out = (v >> WEIGHT_SCALE_BITS).clamp(0, 127) as u8;
        }
    }
}

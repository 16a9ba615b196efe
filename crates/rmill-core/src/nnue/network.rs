//! NNUEネットワーク全体の構造と評価関数
//!
//! - 特徴変換器（294 → 512 × 2視点）と 1024→16→32→1 の層を保持する
//! - ファイル形式の読み書き（ヘッダ・ハッシュ・アーキテクチャ文字列の検証を含む）
//! - 乱数ネットワークの生成（テスト・ツール用）

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::accumulator::Accumulator;
use super::aligned::Aligned;
use super::constants::{
    ARCHITECTURE, FV_SCALE, HIDDEN1_DIMENSIONS as H1, HIDDEN2_DIMENSIONS as H2, MAX_ARCH_LEN,
    NNUE_VERSION, TRANSFORMED_FEATURE_DIMENSIONS as L1,
};
use super::error::{NnueError, NnueResult};
use super::feature_transformer::FeatureTransformer;
use super::layers::{AffineTransform, ClippedReLU};
use crate::types::Color;

type Layer1 = AffineTransform<{ L1 * 2 }, H1>;
type Layer2 = AffineTransform<H1, H2>;
type OutputLayer = AffineTransform<H2, 1>;

/// 入力スライス層の構造ハッシュ
const fn input_slice_hash() -> u32 {
    0xEC42_E90D ^ (L1 as u32 * 2)
}

/// 層全体の構造ハッシュ
pub const fn layers_hash() -> u32 {
    let h = Layer1::hash_value(input_slice_hash());
    let h = ClippedReLU::<H1>::hash_value(h);
    let h = Layer2::hash_value(h);
    let h = ClippedReLU::<H2>::hash_value(h);
    OutputLayer::hash_value(h)
}

/// ファイルヘッダに書くネットワーク全体のハッシュ
pub const fn network_hash() -> u32 {
    FeatureTransformer::hash_value() ^ layers_hash()
}

fn read_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn expect_hash<R: Read>(reader: &mut R, section: &'static str, expected: u32) -> NnueResult<()> {
    let found = read_u32(reader)?;
    if found != expected {
        return Err(NnueError::Hash {
            section,
            found,
            expected,
        });
    }
    Ok(())
}

/// NNUEネットワーク
pub struct Network {
    pub feature_transformer: FeatureTransformer,
    l1: Layer1,
    l2: Layer2,
    output: OutputLayer,
}

impl Network {
    /// ファイルから読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> NnueResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let network = Self::read(&mut BufReader::new(file))?;
        log::info!("NNUE loaded: {}", path.display());
        Ok(network)
    }

    /// リーダーから読み込む（末尾に余分なデータがあればエラー）
    pub fn read<R: Read>(reader: &mut R) -> NnueResult<Self> {
        let version = read_u32(reader)?;
        if version != NNUE_VERSION {
            return Err(NnueError::Version {
                found: version,
                expected: NNUE_VERSION,
            });
        }
        expect_hash(reader, "network", network_hash())?;

        let arch_len = read_u32(reader)? as usize;
        if arch_len > MAX_ARCH_LEN {
            return Err(NnueError::ArchTooLong(arch_len));
        }
        let mut arch = vec![0u8; arch_len];
        reader.read_exact(&mut arch)?;
        let arch = String::from_utf8_lossy(&arch).into_owned();
        if arch != ARCHITECTURE {
            return Err(NnueError::Architecture(arch));
        }

        expect_hash(reader, "feature transformer", FeatureTransformer::hash_value())?;
        let feature_transformer = FeatureTransformer::read(reader)?;

        expect_hash(reader, "layers", layers_hash())?;
        let l1 = Layer1::read(reader)?;
        let l2 = Layer2::read(reader)?;
        let output = OutputLayer::read(reader)?;

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        if !rest.is_empty() {
            return Err(NnueError::TrailingData(rest.len()));
        }

        Ok(Self {
            feature_transformer,
            l1,
            l2,
            output,
        })
    }

    /// ライターへ書き出す
    pub fn write<W: Write>(&self, writer: &mut W) -> NnueResult<()> {
        writer.write_all(&NNUE_VERSION.to_le_bytes())?;
        writer.write_all(&network_hash().to_le_bytes())?;
        writer.write_all(&(ARCHITECTURE.len() as u32).to_le_bytes())?;
        writer.write_all(ARCHITECTURE.as_bytes())?;
        writer.write_all(&FeatureTransformer::hash_value().to_le_bytes())?;
        self.feature_transformer.write(writer)?;
        writer.write_all(&layers_hash().to_le_bytes())?;
        self.l1.write(writer)?;
        self.l2.write(writer)?;
        self.output.write(writer)?;
        Ok(())
    }

    /// ファイルへ書き出す
    pub fn save<P: AsRef<Path>>(&self, path: P) -> NnueResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// シードから決定的に乱数ネットワークを作る
    pub fn random(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Self {
            feature_transformer: FeatureTransformer::random(&mut rng),
            l1: Layer1::random(&mut rng, 4, 256),
            l2: Layer2::random(&mut rng, 16, 256),
            output: OutputLayer::random(&mut rng, 32, 1024),
        }
    }

    /// 計算済みの Accumulator から評価値（手番側視点、評価値単位）を求める
    pub fn evaluate(&self, acc: &Accumulator, side_to_move: Color) -> i32 {
        debug_assert!(acc.computed.iter().all(|&c| c));

        let mut transformed = Aligned([0u8; L1 * 2]);
        self.feature_transformer.transform(acc, side_to_move, &mut transformed.0);

        let mut l1_out = [0i32; H1];
        self.l1.propagate(&transformed.0, &mut l1_out);
        let mut l1_relu = Aligned([0u8; H1]);
        ClippedReLU::<H1>::propagate(&l1_out, &mut l1_relu.0);

        let mut l2_out = [0i32; H2];
        self.l2.propagate(&l1_relu.0, &mut l2_out);
        let mut l2_relu = Aligned([0u8; H2]);
        ClippedReLU::<H2>::propagate(&l2_out, &mut l2_relu.0);

        let mut out = [0i32; 1];
        self.output.propagate(&l2_relu.0, &mut out);
        out[0] / FV_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let net = Network::random(7);
        let mut buf = Vec::new();
        net.write(&mut buf).unwrap();
        let back = Network::read(&mut buf.as_slice()).unwrap();
        let mut buf2 = Vec::new();
        back.write(&mut buf2).unwrap();
        assert_eq!(buf, buf2);
    }

    #[test]
    fn test_random_is_deterministic() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        Network::random(3).write(&mut a).unwrap();
        Network::random(3).write(&mut b).unwrap();
        assert_eq!(a, b);
        let mut c = Vec::new();
        Network::random(4).write(&mut c).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_rejects_bad_version() {
        let mut buf = Vec::new();
        Network::random(1).write(&mut buf).unwrap();
        buf[0] ^= 0xFF;
        assert!(matches!(
            Network::read(&mut buf.as_slice()),
            Err(NnueError::Version { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_hash() {
        let mut buf = Vec::new();
        Network::random(1).write(&mut buf).unwrap();
        buf[4] ^= 0x01;
        assert!(matches!(
            Network::read(&mut buf.as_slice()),
            Err(NnueError::Hash { section: "network", .. })
        ));
    }

    #[test]
    fn test_rejects_trailing_data() {
        let mut buf = Vec::new();
        Network::random(1).write(&mut buf).unwrap();
        buf.push(0);
        assert!(matches!(
            Network::read(&mut buf.as_slice()),
            Err(NnueError::TrailingData(1))
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let mut buf = Vec::new();
        Network::random(1).write(&mut buf).unwrap();
        buf.truncate(buf.len() - 10);
        assert!(matches!(Network::read(&mut buf.as_slice()), Err(NnueError::Io(_))));
    }
}

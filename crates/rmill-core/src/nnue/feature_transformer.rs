//! 特徴変換器（294 → 512 × 2視点）

use std::io::{self, Read, Write};

use rand::Rng;

use super::accumulator::{Accumulator, AccumulatorStack};
use super::aligned::AlignedBox;
use super::constants::TRANSFORMED_FEATURE_DIMENSIONS as L1;
use super::features::{self, INPUT_DIMENSIONS, IndexList};
use crate::position::Position;
use crate::types::Color;

/// 特徴変換器
pub struct FeatureTransformer {
    /// バイアス [L1]
    pub biases: AlignedBox<i16>,
    /// 重み [INPUT_DIMENSIONS][L1]
    pub weights: AlignedBox<i16>,
}

fn read_i16s<R: Read>(reader: &mut R, out: &mut [i16]) -> io::Result<()> {
    let mut buf = vec![0u8; out.len() * 2];
    reader.read_exact(&mut buf)?;
    for (v, b) in out.iter_mut().zip(buf.chunks_exact(2)) {
        *v = i16::from_le_bytes([b[0], b[1]]);
    }
    Ok(())
}

fn write_i16s<W: Write>(writer: &mut W, values: &[i16]) -> io::Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    writer.write_all(&bytes)
}

impl FeatureTransformer {
    /// 構造ハッシュ
    pub const fn hash_value() -> u32 {
        features::HASH_VALUE ^ (L1 as u32 * 2)
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut biases = AlignedBox::new_zeroed(L1);
        let mut weights = AlignedBox::new_zeroed(INPUT_DIMENSIONS * L1);
        read_i16s(reader, &mut biases)?;
        read_i16s(reader, &mut weights)?;
        Ok(Self { biases, weights })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_i16s(writer, &self.biases)?;
        write_i16s(writer, &self.weights)
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut biases = AlignedBox::new_zeroed(L1);
        let mut weights = AlignedBox::new_zeroed(INPUT_DIMENSIONS * L1);
        for b in biases.iter_mut() {
            *b = rng.random_range(0..=64);
        }
        for w in weights.iter_mut() {
            *w = rng.random_range(-16..=16);
        }
        Self { biases, weights }
    }

    #[inline]
    fn row(&self, index: usize) -> &[i16] {
        &self.weights[index * L1..(index + 1) * L1]
    }

    /// 全計算
    pub fn refresh_accumulator(&self, pos: &Position, perspective: Color, acc: &mut Accumulator) {
        let mut active = IndexList::new();
        features::append_active_indices(pos, perspective, &mut active);

        let out = acc.get_mut(perspective);
        out.copy_from_slice(&self.biases);
        for &index in &active {
            for (o, &w) in out.iter_mut().zip(self.row(index)) {
                *o = o.wrapping_add(w);
            }
        }
        acc.computed[perspective.index()] = true;
    }

    /// スタックの現在位置まで Accumulator を揃える
    pub fn update_accumulator(&self, pos: &Position, perspective: Color, stack: &mut AccumulatorStack) {
        let p = perspective.index();
        let current = stack.current_index();
        if stack.current().accumulator.computed[p] {
            return;
        }

        let Some(source) = stack.find_usable(perspective) else {
            self.refresh_accumulator(pos, perspective, &mut stack.current_mut().accumulator);
            return;
        };

        // 途中でアンカーは変わっていないので現局面のアンカーをそのまま使える
        let anchor = pos.anchor(perspective);
        let mut removed = IndexList::new();
        let mut added = IndexList::new();
        for index in source + 1..=current {
            let (prev, next) = stack.pair_mut(index);
            removed.clear();
            added.clear();
            features::append_changed_indices(&next.dirty, perspective, anchor, &mut removed, &mut added);

            let out = next.accumulator.get_mut(perspective);
            out.copy_from_slice(prev.accumulator.get(perspective));
            for &r in &removed {
                for (o, &w) in out.iter_mut().zip(self.row(r)) {
                    *o = o.wrapping_sub(w);
                }
            }
            for &a in &added {
                for (o, &w) in out.iter_mut().zip(self.row(a)) {
                    *o = o.wrapping_add(w);
                }
            }
            next.accumulator.computed[p] = true;
        }
    }

    /// [手番側, 相手側] の順に並べて 0..=127 にクリップ
    pub fn transform(&self, acc: &Accumulator, side_to_move: Color, output: &mut [u8; L1 * 2]) {
        for (half, perspective) in [side_to_move, !side_to_move].into_iter().enumerate() {
            let src = acc.get(perspective);
            for (o, &v) in output[half * L1..(half + 1) * L1].iter_mut().zip(src.iter()) {
                *o = v.clamp(0, 127) as u8;
            }
        }
    }
}

//! Zobrist ハッシュ
//!
//! 固定シードの Xoshiro256PlusPlus から生成するので、プロセスをまたいでも同じ値になる。

use std::sync::LazyLock;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Color, Piece, Square};

/// 手駒数の最大値 + 1
pub const HAND_SLOTS: usize = 13;
/// 未処理の除去数の最大値 + 1
pub const NEED_REMOVE_SLOTS: usize = 4;

const ZOBRIST_SEED: u64 = 0x6d69_6c6c_5a6f_6272;

/// Zobrist キー一式
pub struct Zobrist {
    /// [White, Black, Ban][sq]
    psq: [[u64; 32]; Piece::NUM],
    side: u64,
    need_remove: [u64; NEED_REMOVE_SLOTS],
    hand: [[u64; HAND_SLOTS]; Color::NUM],
}

pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(Zobrist::new);

impl Zobrist {
    fn new() -> Zobrist {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
        let mut psq = [[0u64; 32]; Piece::NUM];
        for table in psq.iter_mut() {
            for sq in Square::all() {
                table[sq.raw() as usize] = rng.next_u64();
            }
        }
        let side = rng.next_u64();
        let mut need_remove = [0u64; NEED_REMOVE_SLOTS];
        // 0個はキーに影響しない
        for k in need_remove.iter_mut().skip(1) {
            *k = rng.next_u64();
        }
        let mut hand = [[0u64; HAND_SLOTS]; Color::NUM];
        for table in hand.iter_mut() {
            for k in table.iter_mut() {
                *k = rng.next_u64();
            }
        }
        Zobrist {
            psq,
            side,
            need_remove,
            hand,
        }
    }

    /// 盤上の駒（Empty は 0）
    #[inline]
    pub fn psq(&self, pc: Piece, sq: Square) -> u64 {
        match pc {
            Piece::Empty => 0,
            _ => self.psq[pc.table_index()][sq.raw() as usize],
        }
    }

    /// 手番（黒番のとき XOR する）
    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }

    #[inline]
    pub fn need_remove(&self, n: u8) -> u64 {
        self.need_remove[(n as usize).min(NEED_REMOVE_SLOTS - 1)]
    }

    #[inline]
    pub fn hand(&self, c: Color, n: u8) -> u64 {
        self.hand[c.index()][(n as usize).min(HAND_SLOTS - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let z = &*ZOBRIST;
        let mut keys: Vec<u64> = Vec::new();
        for pc in [Piece::White, Piece::Black, Piece::Ban] {
            for sq in Square::all() {
                keys.push(z.psq(pc, sq));
            }
        }
        keys.push(z.side());
        let len = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), len);
        assert!(keys.iter().all(|&k| k != 0));
    }

    #[test]
    fn test_empty_and_zero_are_neutral() {
        let sq = Square::from_index(5);
        assert_eq!(ZOBRIST.psq(Piece::Empty, sq), 0);
        assert_eq!(ZOBRIST.need_remove(0), 0);
    }
}

//! TranspositionTable本体
//!
//! - Cluster: エントリのグループ
//! - TranspositionTable: テーブル本体
//! - probe/write操作

use std::ops::Deref;
use std::sync::atomic::{AtomicU8, Ordering};

use log::warn;

use super::alloc::Allocation;
use super::entry::{TTData, TTEntry};
use super::{CLUSTER_SIZE, GENERATION_BITS, GENERATION_DELTA, MAX_HASH_MB, TtError};
use crate::types::{Bound, Depth, Move, Value};

/// クラスター構造
/// 同じハッシュインデックスに対して複数のエントリを持つ
#[repr(C, align(64))]
#[derive(Default)]
pub struct Cluster {
    entries: [TTEntry; CLUSTER_SIZE],
}

// クラスターは64バイトであることを保証（キャッシュラインサイズ）
const _: () = assert!(std::mem::size_of::<Cluster>() == 64);

struct ClusterTable {
    alloc: Allocation,
    len: usize,
}

impl ClusterTable {
    fn new(len: usize) -> Result<Self, TtError> {
        let bytes = len * std::mem::size_of::<Cluster>();
        let alloc = Allocation::allocate(bytes, std::mem::align_of::<Cluster>())?;
        Ok(Self { alloc, len })
    }
}

impl Deref for ClusterTable {
    type Target = [Cluster];

    fn deref(&self) -> &Self::Target {
        // SAFETY: 領域は len 個の Cluster 分ゼロ初期化済みで、全ビット0の AtomicU64 は有効
        unsafe { std::slice::from_raw_parts(self.alloc.ptr().as_ptr() as *const Cluster, self.len) }
    }
}

/// MiB 指定からクラスター数（2の冪）を求める
fn cluster_count_for(mb_size: usize) -> Result<usize, TtError> {
    if mb_size == 0 {
        return Err(TtError::ZeroSize);
    }
    let mb_size = if mb_size > MAX_HASH_MB {
        warn!("hash size {mb_size} MiB exceeds the limit, clamped to {MAX_HASH_MB} MiB");
        MAX_HASH_MB
    } else {
        mb_size
    };
    let clusters = mb_size * 1024 * 1024 / std::mem::size_of::<Cluster>();
    // 2の冪に切り下げ
    Ok(1usize << (usize::BITS - 1 - clusters.leading_zeros()))
}

/// 置換表
///
/// 全メソッドが `&self` で呼べる（`resize` を除く）ので、探索スレッド間で
/// `Arc<TranspositionTable>` として共有する。
pub struct TranspositionTable {
    /// クラスターの配列
    table: ClusterTable,
    /// クラスター数（2の冪）
    cluster_count: usize,
    /// 世代カウンター（下位3bitは使用しない）
    generation8: AtomicU8,
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(mb_size: usize) -> Result<Self, TtError> {
        let cluster_count = cluster_count_for(mb_size)?;
        let table = ClusterTable::new(cluster_count)?;

        Ok(Self {
            table,
            cluster_count,
            generation8: AtomicU8::new(0),
        })
    }

    /// サイズを変更
    ///
    /// 探索中には呼ばないこと（`&mut self` で保証される）。
    pub fn resize(&mut self, mb_size: usize) -> Result<(), TtError> {
        let new_count = cluster_count_for(mb_size)?;
        if new_count != self.cluster_count {
            self.table = ClusterTable::new(new_count)?;
            self.cluster_count = new_count;
        }
        self.generation8.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// クラスター数
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// クリア
    pub fn clear(&self) {
        self.generation8.store(0, Ordering::Relaxed);
        let len = self.table.len();
        let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

        // サイズが小さい場合やスレッド数が1の場合は逐次クリア
        if threads <= 1 || len < threads * 1024 {
            clear_clusters(&self.table);
            return;
        }

        let chunk = len.div_ceil(threads);
        std::thread::scope(|scope| {
            for part in self.table.chunks(chunk) {
                scope.spawn(move || clear_clusters(part));
            }
        });
    }

    /// 新しい探索を開始（世代を進める）
    pub fn new_generation(&self) {
        self.generation8.fetch_add(GENERATION_DELTA, Ordering::Relaxed);
    }

    /// 現在の世代を取得
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation8.load(Ordering::Relaxed)
    }

    /// 置換表を検索（64bitキーでマッチング）
    ///
    /// ヒットしなかった場合は、書き込み先として置換価値の最小のエントリを返す。
    /// 同値なら先頭に近いものを選ぶ。
    pub fn probe(&self, key: u64) -> ProbeResult<'_> {
        let cluster = self.first_entry(key);

        for entry in &cluster.entries {
            if let Some(data) = entry.read_if(key) {
                return ProbeResult {
                    found: true,
                    data,
                    writer: entry,
                };
            }
        }

        let gen8 = self.generation();
        let mut replace = &cluster.entries[0];
        let mut min_value = replace.replace_value(gen8);
        for entry in &cluster.entries[1..] {
            let value = entry.replace_value(gen8);
            if value < min_value {
                min_value = value;
                replace = entry;
            }
        }

        ProbeResult {
            found: false,
            data: TTData::EMPTY,
            writer: replace,
        }
    }

    /// 置換表の使用率を1000分率で返す（現世代のエントリのみ数える）
    pub fn hashfull(&self) -> i32 {
        let gen8 = self.generation();
        let sample_count = 1000.min(self.cluster_count);
        let mut count = 0;

        for cluster in self.table.iter().take(sample_count) {
            for entry in &cluster.entries {
                if entry.is_occupied() && entry.relative_age(gen8) == 0 {
                    count += 1;
                }
            }
        }

        count * 1000 / (sample_count * CLUSTER_SIZE) as i32
    }

    /// クラスターインデックスを計算（キーの下位ビット）
    #[inline]
    fn cluster_index(&self, key: u64) -> usize {
        (key as usize) & (self.cluster_count - 1)
    }

    /// クラスターの参照を取得
    #[inline]
    fn first_entry(&self, key: u64) -> &Cluster {
        &self.table[self.cluster_index(key)]
    }
}

fn clear_clusters(clusters: &[Cluster]) {
    for cluster in clusters {
        for entry in &cluster.entries {
            entry.clear();
        }
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("cluster_count", &self.cluster_count)
            .field("generation", &(self.generation() >> GENERATION_BITS))
            .finish()
    }
}

/// probe結果
pub struct ProbeResult<'a> {
    /// ヒットしたか
    pub found: bool,
    /// 読み取ったデータ
    pub data: TTData,
    /// 書き込み用エントリ
    writer: &'a TTEntry,
}

impl ProbeResult<'_> {
    /// エントリに書き込む
    ///
    /// probe 後に別スレッドが同じエントリを書き換えていても、
    /// 保存処理がキーを見て置換方針を判断する。
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        key: u64,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: Depth,
        mv: Move,
        eval: Value,
        generation8: u8,
    ) {
        self.writer.save(key, value, is_pv, bound, depth, mv, eval, generation8);
    }
}

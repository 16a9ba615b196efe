//! 時間管理（TimeManagement）
//!
//! 1回の `go` で全ワーカーが共有する打ち切り判定。
//! 停止フラグ・経過時間・全スレッド合計のノード数を見る。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use super::{LimitsType, TimePoint};

/// 打ち切り判定の間隔（ノード数）
pub const CHECK_INTERVAL: i32 = 1024;

/// 探索の打ち切り判定
pub struct TimeManagement {
    start: Instant,
    /// 最大思考時間（0なら無制限）
    maximum: TimePoint,
    /// ノード数上限（0なら無制限）
    node_limit: u64,
    /// 全スレッドの報告済みノード数
    nodes: AtomicU64,
    stop: Arc<AtomicBool>,
}

impl TimeManagement {
    pub fn new(limits: &LimitsType, stop: Arc<AtomicBool>) -> Self {
        Self {
            start: Instant::now(),
            maximum: limits.movetime.max(0),
            node_limit: limits.nodes,
            nodes: AtomicU64::new(0),
            stop,
        }
    }

    /// 探索開始からの経過時間（ミリ秒）
    #[inline]
    pub fn elapsed(&self) -> TimePoint {
        self.start.elapsed().as_millis() as TimePoint
    }

    /// 最大思考時間
    #[inline]
    pub fn maximum(&self) -> TimePoint {
        self.maximum
    }

    /// 外部からの停止要求があるか
    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// 全ワーカーに停止を要求する
    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// ノード数を加算し、合計を返す
    #[inline]
    pub fn add_nodes(&self, n: u64) -> u64 {
        self.nodes.fetch_add(n, Ordering::Relaxed) + n
    }

    /// 報告済みノード数の合計
    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// 次の打ち切り判定までのノード数
    ///
    /// ノード数制限が小さいときは間隔を縮める。
    #[inline]
    pub fn check_interval(&self) -> i32 {
        if self.node_limit > 0 {
            (self.node_limit / 1024).clamp(1, CHECK_INTERVAL as u64) as i32
        } else {
            CHECK_INTERVAL
        }
    }

    /// 打ち切るべきか（停止要求・時間切れ・ノード数超過）
    pub fn should_stop(&self, total_nodes: u64) -> bool {
        if self.stop_requested() {
            return true;
        }
        if self.node_limit > 0 && total_nodes >= self.node_limit {
            return true;
        }
        self.maximum > 0 && self.elapsed() >= self.maximum
    }
}

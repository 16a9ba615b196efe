//! 探索エンジン（LazySMP）
//!
//! 置換表・評価器・ルールを保持し、`go` で複数スレッドの探索を走らせる。
//!
//! - 全スレッドが同じルート局面のコピーを独立に探索し、置換表だけを共有する
//! - ヘルパースレッドは指し手オーダリングに小さな乱数を混ぜる
//! - メインスレッド（id 0）が終わったら全体に停止を要求する
//! - 結果は完了深さが最大のスレッドから選ぶ（同じならスレッドIDが小さい方）

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{info, warn};
use thiserror::Error;

use crate::eval::Evaluator;
use crate::movegen::legal_moves;
use crate::nnue::NnueError;
use crate::position::{FenError, Position};
use crate::rule::{Rule, RuleError};
use crate::tt::{TranspositionTable, TtError};
use crate::types::{Depth, GameOutcome, Move, Value};

use super::{LimitsType, SearchWorker, TimeManagement};

/// エンジン設定
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// 探索スレッド数
    pub threads: usize,
    /// 置換表サイズ（MiB）
    pub hash_mb: usize,
    /// NNUE 評価関数ファイル（なければ駒割り評価）
    pub eval_file: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 16,
            eval_file: None,
        }
    }
}

/// エンジンの初期化・設定エラー
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transposition table: {0}")]
    Tt(#[from] TtError),
    #[error("evaluation file: {0}")]
    Nnue(#[from] NnueError),
    #[error("invalid rule: {0}")]
    Rule(#[from] RuleError),
    #[error("invalid position: {0}")]
    Fen(#[from] FenError),
}

/// 探索結果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// 最善手
    pub best_move: Move,
    /// 手番側視点の評価値
    pub score: Value,
    /// 完了した深さ（1回も完了しなければ0）
    pub depth: Depth,
    /// 選択的深さ
    pub sel_depth: i32,
    /// 全スレッドの探索ノード数
    pub nodes: u64,
    /// 読み筋
    pub pv: Vec<Move>,
}

/// `go` の結果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// 最善手が見つかった
    BestMove(SearchResult),
    /// ルート局面が既に終局している
    GameOver(GameOutcome),
}

impl SearchOutcome {
    /// 最善手（終局なら None）
    pub fn best_move(&self) -> Option<Move> {
        match self {
            SearchOutcome::BestMove(r) => Some(r.best_move),
            SearchOutcome::GameOver(_) => None,
        }
    }
}

/// 探索エンジン
pub struct Engine {
    tt: Arc<TranspositionTable>,
    evaluator: Evaluator,
    rule: Arc<Rule>,
    stop: Arc<AtomicBool>,
    threads: usize,
}

impl Engine {
    /// 新しいエンジンを作成
    pub fn new(options: &EngineOptions, rule: Rule) -> Result<Self, EngineError> {
        rule.validate()?;
        let tt = TranspositionTable::new(options.hash_mb)?;
        let evaluator = match &options.eval_file {
            Some(path) => Evaluator::from_file(path)?,
            None => Evaluator::Material,
        };
        let threads = options.threads.max(1);
        info!(
            "engine: {} threads, hash {} MiB ({} clusters), eval {:?}",
            threads,
            options.hash_mb,
            tt.cluster_count(),
            evaluator
        );

        Ok(Self {
            tt: Arc::new(tt),
            evaluator,
            rule: Arc::new(rule),
            stop: Arc::new(AtomicBool::new(false)),
            threads,
        })
    }

    /// 評価器を差し替える
    pub fn set_evaluator(&mut self, evaluator: Evaluator) {
        self.evaluator = evaluator;
    }

    /// 評価関数ファイルを読み込む
    pub fn load_eval_file(&mut self, path: impl Into<PathBuf>) -> Result<(), EngineError> {
        let path = path.into();
        self.evaluator = Evaluator::from_file(&path)?;
        info!("loaded evaluation file {}", path.display());
        Ok(())
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// 初期局面
    pub fn new_position(&self) -> Position {
        Position::new(Arc::clone(&self.rule))
    }

    /// FEN から局面を作る
    pub fn position_from_fen(&self, fen: &str) -> Result<Position, EngineError> {
        Ok(Position::from_fen(fen, Arc::clone(&self.rule))?)
    }

    /// 探索を止めるためのフラグ（別スレッドから `store(true)` する）
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// 新しい対局（置換表をクリア）
    pub fn new_game(&self) {
        self.tt.clear();
    }

    /// 探索スレッド数を変更
    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    /// 置換表サイズを変更
    ///
    /// 他に参照がなければその場で確保し直し、あれば新しい表を作る。
    pub fn set_hash_size(&mut self, mb: usize) -> Result<(), EngineError> {
        match Arc::get_mut(&mut self.tt) {
            Some(tt) => tt.resize(mb)?,
            None => self.tt = Arc::new(TranspositionTable::new(mb)?),
        }
        info!("hash resized to {mb} MiB");
        Ok(())
    }

    /// 探索を実行して最善手を返す
    ///
    /// `limits` の条件か `stop_handle()` の停止要求で打ち切る。
    /// 打ち切られても合法手があれば必ず最善手を返す。
    pub fn go(&self, pos: &Position, limits: &LimitsType) -> SearchOutcome {
        if let Some(outcome) = pos.outcome() {
            return SearchOutcome::GameOver(outcome);
        }

        self.tt.new_generation();
        self.stop.store(false, Ordering::Relaxed);
        let time = TimeManagement::new(limits, Arc::clone(&self.stop));

        let workers: Vec<SearchWorker> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.threads)
                .map(|id| {
                    let tt = Arc::clone(&self.tt);
                    let evaluator = &self.evaluator;
                    let time = &time;
                    let mut pos = pos.clone();
                    scope.spawn(move || {
                        let mut worker = SearchWorker::new(tt, evaluator, &pos, id);
                        worker.search(&mut pos, limits, time);
                        if id == 0 {
                            time.request_stop();
                        }
                        worker
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .filter_map(|(id, h)| match h.join() {
                    Ok(worker) => Some(worker),
                    Err(_) => {
                        warn!("search thread {id} panicked");
                        time.request_stop();
                        None
                    }
                })
                .collect()
        });

        let nodes: u64 = workers.iter().map(SearchWorker::nodes).sum();
        let best = workers
            .iter()
            .filter(|w| w.best_move().is_some())
            .max_by(|a, b| {
                a.completed_depth()
                    .cmp(&b.completed_depth())
                    .then_with(|| b.thread_id.cmp(&a.thread_id))
            });

        let Some(best) = best else {
            // 全スレッドが失敗した場合
            warn!("no search thread produced a move");
            return SearchOutcome::BestMove(SearchResult {
                best_move: legal_moves(pos).as_slice().first().copied().unwrap_or(Move::NONE),
                score: Value::ZERO,
                depth: 0,
                sel_depth: 0,
                nodes,
                pv: Vec::new(),
            });
        };

        let st = &best.state;
        info!(
            "bestmove {} depth {} score {} nodes {} (thread {})",
            st.best_move, st.completed_depth, st.best_score, nodes, best.thread_id
        );

        SearchOutcome::BestMove(SearchResult {
            best_move: st.best_move,
            score: st.best_score,
            depth: st.completed_depth,
            sel_depth: st.best_sel_depth,
            nodes,
            pv: best.pv(),
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("threads", &self.threads)
            .field("tt", &self.tt)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

//! 探索ベンチマーク
//!
//! 局面（FEN と手順）から固定条件で探索し、結果とNPSを出力する。
//!
//! ```bash
//! cargo run --release -p tools --bin bench -- --depth 8 --threads 4
//! cargo run --release -p tools --bin bench -- --moves d6 f4 d2 --nodes 1000000 --json
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use serde::Serialize;

use rmill_core::movegen::perft;
use rmill_core::position::START_FEN;
use rmill_core::rule::Rule;
use rmill_core::search::{Engine, EngineOptions, LimitsType, SearchOutcome};
use rmill_core::types::Move;

#[derive(Parser, Debug)]
#[command(name = "bench")]
#[command(about = "固定条件で探索してノード数・NPS・最善手を表示する")]
struct Cli {
    /// 開始局面（FEN）
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// 開始局面から進める手順（d6 / d6-f6 / xd6）
    #[arg(long, num_args = 1..)]
    moves: Vec<String>,

    /// ルール設定（JSON）。省略時は Nine Men's Morris
    #[arg(long)]
    rule: Option<PathBuf>,

    /// 探索深さ
    #[arg(long, default_value_t = 0)]
    depth: i32,

    /// ノード数制限
    #[arg(long, default_value_t = 0)]
    nodes: u64,

    /// 思考時間（ミリ秒）
    #[arg(long, default_value_t = 0)]
    movetime: i64,

    /// 探索スレッド数
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// 置換表サイズ（MiB）
    #[arg(long, default_value_t = 16)]
    hash: usize,

    /// NNUE 評価関数ファイル
    #[arg(long)]
    eval_file: Option<PathBuf>,

    /// 探索の代わりに perft を実行する深さ
    #[arg(long)]
    perft: Option<u32>,

    /// 結果を JSON で出力
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// JSON 出力用の結果
#[derive(Serialize, Debug)]
struct Report {
    fen: String,
    best_move: Option<String>,
    score: Option<i32>,
    depth: i32,
    sel_depth: i32,
    nodes: u64,
    time_ms: u128,
    nps: u64,
    pv: Vec<String>,
    game_over: Option<String>,
}

fn load_rule(path: Option<&PathBuf>) -> Result<Rule> {
    let Some(path) = path else {
        return Ok(Rule::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule file {}", path.display()))?;
    let rule: Rule = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse rule file {}", path.display()))?;
    Ok(rule)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let rule = load_rule(cli.rule.as_ref())?;
    let options = EngineOptions {
        threads: cli.threads,
        hash_mb: cli.hash,
        eval_file: cli.eval_file.clone(),
    };
    let engine = Engine::new(&options, rule).context("failed to initialise engine")?;

    let mut pos = engine.position_from_fen(&cli.fen)?;
    for text in &cli.moves {
        let Some(mv) = Move::from_notation(text) else {
            bail!("invalid move notation: {text}");
        };
        pos.make_move(mv).with_context(|| format!("cannot play {text}"))?;
    }
    let fen = pos.to_fen();
    info!("bench position {fen}");

    if let Some(depth) = cli.perft {
        let start = Instant::now();
        let nodes = perft(&mut pos, depth);
        let elapsed = start.elapsed().as_millis();
        println!("perft {depth}: {nodes} ({elapsed} ms)");
        return Ok(());
    }

    let limits = LimitsType {
        depth: cli.depth,
        nodes: cli.nodes,
        movetime: cli.movetime,
        ..LimitsType::default()
    };
    if limits.is_infinite() {
        bail!("one of --depth, --nodes or --movetime is required");
    }

    let start = Instant::now();
    let outcome = engine.go(&pos, &limits);
    let time_ms = start.elapsed().as_millis();

    let report = match outcome {
        SearchOutcome::BestMove(r) => Report {
            fen,
            best_move: Some(r.best_move.to_notation()),
            score: Some(r.score.raw()),
            depth: r.depth,
            sel_depth: r.sel_depth,
            nodes: r.nodes,
            time_ms,
            nps: (r.nodes as u128 * 1000 / time_ms.max(1)) as u64,
            pv: r.pv.iter().map(|m| m.to_notation()).collect(),
            game_over: None,
        },
        SearchOutcome::GameOver(o) => Report {
            fen,
            best_move: None,
            score: None,
            depth: 0,
            sel_depth: 0,
            nodes: 0,
            time_ms,
            nps: 0,
            pv: Vec::new(),
            game_over: Some(o.to_string()),
        },
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(reason) = &report.game_over {
        println!("game over: {reason}");
    } else {
        println!(
            "bestmove {} score {} depth {} seldepth {} nodes {} time {} ms nps {}",
            report.best_move.as_deref().unwrap_or("none"),
            report.score.unwrap_or(0),
            report.depth,
            report.sel_depth,
            report.nodes,
            report.time_ms,
            report.nps
        );
        println!("pv {}", report.pv.join(" "));
    }
    Ok(())
}

//! テスト用のランダム NNUE ファイルを作成する
//!
//! 重みは seed から決定的に生成されるので、同じ seed なら同じファイルになる。
//! 書き出した後に読み戻し、エンジンの形式として読めることを確認する。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rmill_core::nnue::{Network, network_hash};

#[derive(Parser, Debug)]
#[command(name = "create_mock_nnue")]
#[command(about = "シード付きのランダム NNUE 評価関数ファイルを作成する")]
struct Cli {
    /// 出力ファイル
    #[arg(short, long, default_value = "mock.nnue")]
    output: PathBuf,

    /// 乱数シード
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let net = Network::random(cli.seed);
    net.save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    // 読み戻し確認
    Network::load(&cli.output)
        .with_context(|| format!("failed to read back {}", cli.output.display()))?;

    let size = std::fs::metadata(&cli.output)?.len();
    info!("seed {} hash {:#010x}", cli.seed, network_hash());
    println!("wrote {} ({size} bytes)", cli.output.display());
    Ok(())
}

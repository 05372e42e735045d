use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, Depth};
use engine::{replay_depths, StrategyRunner};
use paper::PaperGateway;
use strategy::{build_strategies, example_provider, ProviderRegistry, StrategyFileConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(strategies = %cfg.strategy_config_path, replay = %cfg.depth_replay_path, "algorunner starting");

    let strategy_file = StrategyFileConfig::load(&cfg.strategy_config_path)
        .with_context(|| format!("loading strategy config '{}'", cfg.strategy_config_path))?;

    // ── Providers (registered once, read-only afterwards) ─────────────────────
    let registry = ProviderRegistry::builder().register(example_provider()).build();

    // ── Paper gateway ─────────────────────────────────────────────────────────
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let gateway = Arc::new(PaperGateway::new(cfg.paper_slippage_bps, report_tx));

    let strategies = build_strategies(&registry, &strategy_file, gateway.clone())?;
    // The paper book moves only when the runner delivers a depth, so fills
    // never see prices the strategies have not.
    let hook_gateway = gateway.clone();
    let runner = StrategyRunner::new(strategies)
        .with_depth_hook(move |depth| hook_gateway.update_depth(depth));

    // ── Channels ──────────────────────────────────────────────────────────────
    let (depth_tx, depth_rx) = mpsc::channel::<Depth>(cfg.event_channel_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let runner_handle = tokio::spawn(runner.run(depth_rx, report_rx, shutdown_rx));

    // ── Replay ────────────────────────────────────────────────────────────────
    let file = tokio::fs::File::open(&cfg.depth_replay_path)
        .await
        .with_context(|| format!("opening depth replay '{}'", cfg.depth_replay_path))?;
    replay_depths(BufReader::new(file), &depth_tx).await?;
    drop(depth_tx);

    let runner = runner_handle.await?;
    let fills = gateway
        .history()
        .iter()
        .filter(|r| r.status.is_fill())
        .count();
    info!(
        depths = runner.depths_seen(),
        reports = runner.reports_seen(),
        fills,
        "Replay finished"
    );
    Ok(())
}

use crate::{Error, Result};

/// Runtime configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the TOML file listing strategies to instantiate.
    pub strategy_config_path: String,
    /// JSON-lines file of depth snapshots to replay.
    pub depth_replay_path: String,
    /// Slippage applied by the paper gateway, in basis points.
    pub paper_slippage_bps: f64,
    /// Capacity of the depth channel feeding the runner.
    pub event_channel_capacity: usize,
}

impl Config {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let paper_slippage_bps = match optional_env("PAPER_SLIPPAGE_BPS") {
            Some(v) => v.parse::<f64>().map_err(|_| {
                Error::Config(format!("PAPER_SLIPPAGE_BPS must be a number, got '{v}'"))
            })?,
            None => 0.0,
        };
        if !paper_slippage_bps.is_finite() || paper_slippage_bps < 0.0 {
            return Err(Error::Config(format!(
                "PAPER_SLIPPAGE_BPS must be non-negative, got {paper_slippage_bps}"
            )));
        }

        Ok(Config {
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategies.toml".to_string()),
            depth_replay_path: required_env("DEPTH_REPLAY_PATH")?,
            paper_slippage_bps,
            event_channel_capacity: optional_env("EVENT_CHANNEL_CAPACITY")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1024),
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

//! Runtime configuration and logging setup for the binaries.
//!
//! Everything is read from environment variables; unset or unparsable values
//! fall back to defaults.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::adapter::ServerConfig;
use crate::types::SETTLE_MS;

pub const DEFAULT_LOG_PATH: &str = "tui-2048.log";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// RNG seed; `None` derives one from the clock.
    pub seed: Option<u32>,
    /// Renderer settle period in ms.
    pub settle_ms: u32,
    pub log_path: PathBuf,
    /// Start the JSON bridge alongside the terminal game.
    pub adapter_enabled: bool,
    pub server: ServerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            settle_ms: SETTLE_MS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            adapter_enabled: false,
            server: ServerConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let seed = env::var("TUI_2048_SEED")
            .ok()
            .and_then(|s| s.trim().parse().ok());
        let settle_ms = env::var("TUI_2048_SETTLE_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.settle_ms);
        let log_path = env::var("TUI_2048_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.log_path);
        let adapter_enabled = env::var("TUI_2048_ADAPTER")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            seed,
            settle_ms,
            log_path,
            adapter_enabled,
            server: ServerConfig::from_env(),
        }
    }

    /// The configured seed, or one taken from the clock.
    pub fn resolve_seed(&self) -> u32 {
        self.seed.unwrap_or_else(clock_seed)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    // Zero is a valid seed but keeps the first draws small.
    (nanos as u32) | 1
}

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Append to a file (the terminal owns stdout/stderr while playing).
    File(PathBuf),
    Stderr,
}

/// Install the global `tracing` subscriber. Filter from `RUST_LOG`, default `info`.
pub fn init_logging(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("failed to install logger: {e}"))
        }
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.settle_ms, SETTLE_MS);
        assert!(!config.adapter_enabled);
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(config.server.port, 7848);
    }

    #[test]
    fn test_fixed_seed_is_used() {
        let config = RunConfig {
            seed: Some(42),
            ..RunConfig::default()
        };
        assert_eq!(config.resolve_seed(), 42);
        assert_eq!(RunConfig::default().resolve_seed() & 1, 1);
    }
}

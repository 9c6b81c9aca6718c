//! `tracing-subscriber` setup for the CLI.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Filter from `RUST_LOG` if set, otherwise from the configured level
/// (`debug` when verbose) with HTTP client internals kept quiet.
pub fn build_env_filter(config: &LogConfig, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = if verbose { "debug" } else { config.level.as_str() };
    let directives = [
        level.to_string(),
        "hyper=warn".to_string(),
        "hyper_util=warn".to_string(),
        "reqwest=warn".to_string(),
        "rustls=warn".to_string(),
    ]
    .join(",");
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", directives, e))
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
pub fn init_logging(config: &LogConfig, verbose: bool) -> Result<()> {
    let filter = build_env_filter(config, verbose)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_env_filter_accepts_config_level() {
        let config = LogConfig {
            level: "warn".into(),
            format: LogFormat::Compact,
        };
        assert!(build_env_filter(&config, false).is_ok());
        assert!(build_env_filter(&config, true).is_ok());
    }

    #[test]
    fn test_build_env_filter_rejects_garbage() {
        let config = LogConfig {
            level: "workboard=loud".into(),
            format: LogFormat::Json,
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(build_env_filter(&config, false).is_err());
        }
    }
}

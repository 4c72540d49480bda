//! Structured logging.
//!
//! Installs the global `tracing` subscriber with either pretty or JSON
//! output and `RUST_LOG` filtering. Output goes to stderr so stdout stays
//! free for RPC results.

use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local use.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parse a format name case-insensitively. Anything other than
    /// `"json"` is `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, failing if one is already set.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"rawtx_node=debug,rawtx_sign=info"`.
pub fn try_init_logging(default_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter = env_filter(default_level);
    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init()?,
    }
    tracing::info!(?format, "logging initialized");
    Ok(())
}

/// Install the global subscriber.
///
/// Call once, early in `main()`. A second call panics; use
/// [`try_init_logging`] where that is possible.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let filter = env_filter(default_level);
    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
                .init();
        }
    }
    tracing::info!(?format, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str_lossy() {
        assert_eq!(LogFormat::from_str_lossy("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str_lossy("yaml"), LogFormat::Pretty);
    }

    #[test]
    fn test_second_install_fails() {
        let _ = try_init_logging("warn", LogFormat::Json);
        assert!(try_init_logging("warn", LogFormat::Pretty).is_err());
    }
}

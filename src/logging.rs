//! Tracing subscriber setup for the CLI.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary (or to tests that want output).

use crate::error::{EngineError, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse the `--log` option: 0/off, 1/stdout, 2/stderr, or a filename.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        }
    }
}

/// Build the event filter: `RUST_LOG` wins, then the configured directive.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
pub fn init(target: &LogTarget, level: &str) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(level));

    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stdout => builder.with_writer(std::io::stdout).try_init(),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
            builder.with_writer(file).with_ansi(false).try_init()
        }
    };

    installed.map_err(|e| EngineError::Config(format!("failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_target() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("stderr"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("engine.log"),
            LogTarget::File(PathBuf::from("engine.log"))
        );
    }
}

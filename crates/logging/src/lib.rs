//! FlowCraft Logging
//!
//! `tracing` subscriber setup shared by FlowCraft apps. `RUST_LOG`, when
//! set, takes precedence over the requested level.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directive: external crates stay at `warn` unless tracing.
    fn directive(&self) -> String {
        match self {
            LogLevel::Trace => "trace".to_string(),
            level => format!(
                "warn,flowcraft={0},flowcraft_core={0},flowcraft_settlement={0},\
                 flowcraft_client={0},flowcraft_keystore={0},flowcraft_settings={0},\
                 flowcraft_app={0}",
                level.as_str()
            ),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the global subscriber.
///
/// Panics if one is already installed; use [`try_init`] where that can
/// happen (tests, embedding).
pub fn init(level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt_layer::layer().with_target(false))
        .with(filter(level))
        .init();
    tracing::debug!("Logging initialized at {}", level);
}

/// Install the global subscriber unless one is already set.
pub fn try_init(level: LogLevel) -> Result<(), String> {
    tracing_subscriber::registry()
        .with(fmt_layer::layer().with_target(false))
        .with(filter(level))
        .try_init()
        .map_err(|e| e.to_string())?;
    tracing::debug!("Logging initialized at {}", level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_directive_scopes_own_crates() {
        let directive = LogLevel::Debug.directive();
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("flowcraft_client=debug"));
        assert_eq!(LogLevel::Trace.directive(), "trace");
    }

    #[test]
    fn test_try_init_twice_is_harmless() {
        let _ = try_init(LogLevel::Info);
        assert!(try_init(LogLevel::Debug).is_err());
    }
}

#![forbid(unsafe_code)]

//! Process-wide log output for applications embedding rowsync.
//!
//! Library code only emits `tracing` events; nothing is printed until the
//! application installs a subscriber. [`init_logging`] installs one built
//! from a [`LoggingConfig`]: an `EnvFilter` plus either a human-readable or
//! a JSON formatter.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `ROWSYNC_LOG` | `EnvFilter` directives | `info` |
//! | `ROWSYNC_LOG_JSON` | `1`/`true`/`yes`/`on` for JSON lines | off |

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Filter directives variable.
pub const LOG_ENV: &str = "ROWSYNC_LOG";
/// JSON output toggle variable.
pub const LOG_JSON_ENV: &str = "ROWSYNC_LOG_JSON";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `rowsync_runtime=debug,info`.
    pub filter: String,
    /// Emit one JSON object per event instead of formatted text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Read `ROWSYNC_LOG` and `ROWSYNC_LOG_JSON` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup(LOG_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let json = lookup(LOG_JSON_ENV).is_some_and(|value| parse_flag(&value));
        Self { filter, json }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on an unparsable filter, or when a global subscriber is already
/// installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|source| LoggingError::Filter {
        filter: config.filter.clone(),
        source,
    })?;
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }
    tracing::debug!(message = "logging.initialized", filter = %config.filter, json = config.json);
    Ok(())
}

/// [`init_logging`] with JSON output and the filter from `ROWSYNC_LOG`.
///
/// # Errors
///
/// Same as [`init_logging`].
pub fn init_json_logging() -> Result<(), LoggingError> {
    init_logging(&LoggingConfig::from_env().with_json(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = LoggingConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.filter, "info");
        assert!(!config.json);
    }

    #[test]
    fn reads_filter_and_json_flag() {
        let config = LoggingConfig::from_lookup(lookup(&[
            ("ROWSYNC_LOG", " rowsync_runtime=debug "),
            ("ROWSYNC_LOG_JSON", "TRUE"),
        ]));
        assert_eq!(config.filter, "rowsync_runtime=debug");
        assert!(config.json);
    }

    #[test]
    fn blank_filter_falls_back_to_default() {
        let config = LoggingConfig::from_lookup(lookup(&[("ROWSYNC_LOG", "   ")]));
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn unrecognised_json_flag_is_off() {
        for value in ["0", "false", "no", "json"] {
            let config = LoggingConfig::from_lookup(lookup(&[("ROWSYNC_LOG_JSON", value)]));
            assert!(!config.json, "{value}");
        }
    }

    #[test]
    fn bad_filter_is_rejected_before_install() {
        let config = LoggingConfig::default().with_filter("rowsync=loud");
        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
        assert!(err.to_string().contains("rowsync=loud"));
    }
}

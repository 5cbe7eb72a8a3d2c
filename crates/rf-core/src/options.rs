//! Runtime options shared by every component of a graph.
//!
//! Options are fixed when a graph version is built. They can be overridden
//! from the environment via `RF_IO_TIMEOUT_MS`.

use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// Environment variable overriding [`RuntimeOptions::io_timeout`], in milliseconds.
pub const IO_TIMEOUT_ENV: &str = "RF_IO_TIMEOUT_MS";

/// Default bound on a single port operation performed by an active component.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Execution options for the components of one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeOptions {
    /// Upper bound on every blocking port operation issued through a run
    /// context. Active components re-check their `running` flag at least
    /// this often, so it is also the worst-case latency of `stop()`.
    pub io_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl RuntimeOptions {
    /// Create options with an explicit I/O timeout (must be non-zero).
    pub fn new(io_timeout: Duration) -> CoreResult<Self> {
        if io_timeout.is_zero() {
            return Err(CoreError::InvalidArg {
                what: "io_timeout must be non-zero",
            });
        }
        Ok(Self { io_timeout })
    }

    /// Defaults, overridden by `RF_IO_TIMEOUT_MS` when it is set.
    pub fn from_env() -> CoreResult<Self> {
        let raw = std::env::var(IO_TIMEOUT_ENV).ok();
        match parse_timeout_ms(raw.as_deref())? {
            Some(timeout) => Self::new(timeout),
            None => Ok(Self::default()),
        }
    }
}

fn parse_timeout_ms(raw: Option<&str>) -> CoreResult<Option<Duration>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| CoreError::InvalidEnv {
            var: IO_TIMEOUT_ENV,
            value: raw.to_string(),
        })
}

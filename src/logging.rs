//! Tracing subscriber setup for binaries and tests built on this crate.
//!
//! The library itself only emits `tracing` events; installing a
//! subscriber is left to the application.

use tracing_subscriber::EnvFilter;

use crate::error::{PanError, Result};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "pan_walker=info";

/// Install a global fmt subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_directive` when `RUST_LOG` is unset or invalid.
/// Fails if a global subscriber is already installed.
pub fn init_logging(default_directive: &str) -> Result<()> {
    let filter = build_filter(default_directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| PanError::Logging {
            message: e.to_string(),
        })
}

fn build_filter(default_directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| PanError::Logging {
            message: format!("invalid filter `{}`: {}", default_directive, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let first = init_logging(DEFAULT_DIRECTIVE);
        let second = init_logging(DEFAULT_DIRECTIVE);
        // Another test may have installed a subscriber first
        assert!(first.is_ok() || matches!(first, Err(PanError::Logging { .. })));
        assert!(matches!(second, Err(PanError::Logging { .. })));
    }
}

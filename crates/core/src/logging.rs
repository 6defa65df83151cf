//! Tracing subscriber setup
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the host. These helpers install the default fmt subscriber for binaries and
//! tests that have none. `RUST_LOG` overrides the configured level.

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber at the level implied by `config.debug`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &crate::config::SchemaConfig) -> bool {
    let level = if config.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_with_level(level)
}

/// Install a fmt subscriber with `level` as the default directive
pub fn init_with_level(level: Level) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

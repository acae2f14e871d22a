//! Tracing and panic reporting setup.
//!
//! Libraries in this workspace only emit `tracing` events. Applications call
//! [`init`] (or [`init_with_level`]) once at startup to print them; later
//! calls are ignored.

use std::str::FromStr;
use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::LogConfig;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;

static PANIC_HOOK_INSTALLED: Once = Once::new();
static TRACING_INSTALLED: Once = Once::new();

/// Installs logging with `RUST_LOG`, falling back to `info`.
pub fn init() {
    init_with_level(DEFAULT_LOG_LEVEL);
}

/// Installs logging with `RUST_LOG`, falling back to `level`.
pub fn init_with_level(level: LevelFilter) {
    install_panic_hook();
    install_tracing(level, cfg!(not(target_arch = "wasm32")));
}

/// Installs logging as described by the `[log]` section of `sigil.toml`.
///
/// An unparsable level falls back to `info`.
pub fn init_from_config(config: &LogConfig) {
    let level = LevelFilter::from_str(&config.level).unwrap_or(DEFAULT_LOG_LEVEL);
    install_panic_hook();
    install_tracing(level, config.ansi);
}

/// Routes panics through the log before the default hook runs (idempotent).
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing_panic::panic_hook(info);
                previous(info);
            }));
        }
    });
}

fn install_tracing(level: LevelFilter, ansi: bool) {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        let console = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(ansi);

        // No clock is available to the formatter on wasm32.
        #[cfg(target_arch = "wasm32")]
        let console = console.without_time();

        let result = tracing_subscriber::registry()
            .with(console.with_filter(filter))
            .try_init();

        if result.is_err() {
            eprintln!("sigil: a global tracing subscriber was already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init_with_level(LevelFilter::DEBUG);
        init_from_config(&LogConfig::default());
        tracing::info!("logging installed");
    }
}

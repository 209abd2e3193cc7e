//! Structured logging for the orrery viewer.
//!
//! Console output goes through a `tracing` fmt layer with uptime timestamps.
//! Debug builds additionally write JSON lines to `orrery.log` in the log
//! directory. `RUST_LOG` always wins over the configured level.

use std::path::{Path, PathBuf};

use orrery_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// File name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (used only when `debug_build`)
/// * `debug_build` - enables the JSON file layer
/// * `config` - supplies `debug.log_level` when present
///
/// Returns the path of the JSON log file when one was opened. Calling this
/// more than once is harmless: later calls leave the first subscriber in place.
///
/// ```no_run
/// use orrery_config::Config;
/// use orrery_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Option<PathBuf> {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
    {
        let log_path = log_dir.join(LOG_FILE_NAME);
        if let Ok(log_file) = std::fs::File::create(&log_path) {
            let file_layer = fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::uptime())
                .json();

            if subscriber.with(file_layer).try_init().is_ok() {
                return Some(log_path);
            }
            return None;
        }
    }

    let _ = subscriber.try_init();
    None
}

/// The filter string derived from the config, falling back to [`DEFAULT_FILTER`].
///
/// A bare level such as `debug` keeps the GPU crates at `warn` so that
/// raising the viewer's verbosity does not flood the console with wgpu noise.
pub fn filter_directive(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|l| !l.is_empty());

    match level {
        None => DEFAULT_FILTER.to_string(),
        Some(l) if l.contains('=') || l.contains(',') => l.to_string(),
        Some(l) => format!("{l},wgpu=warn,naga=warn"),
    }
}

/// An `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

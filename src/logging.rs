//! Logging setup for the `datasight` binary.
//!
//! Console output always goes through a `fmt` layer. File logging is
//! optional and rotates daily inside the log directory, which defaults to
//! the platform data directory:
//!
//! - Windows: `%APPDATA%/datasight/logs`
//! - macOS: `~/Library/Application Support/datasight/logs`
//! - Linux: `~/.local/share/datasight/logs`
//!
//! ```no_run
//! use datasight::logging::{self, LogOptions};
//!
//! let _guard = logging::init(LogOptions::default())?;
//! tracing::info!("ready");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const DEFAULT_FILTER: &str = "info";
const MAX_LOG_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
    /// Write a rolling log file in addition to the console.
    pub file_logging: bool,
    /// Overrides the default log directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_owned(),
            file_logging: true,
            log_dir: None,
        }
    }
}

/// Default log directory, `<data_dir>/datasight/logs`.
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join("datasight").join("logs"))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    Ok(())
}

fn env_filter(default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("Failed to create env filter")
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program. It is `None` when file logging is off.
///
/// # Errors
///
/// Fails if the filter is invalid, the log directory cannot be created, or a
/// subscriber is already installed.
pub fn init(options: LogOptions) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&options.filter)?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    if !options.file_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        return Ok(None);
    }

    let log_dir = match options.log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    ensure_dir(&log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("datasight")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(log_dir = %log_dir.display(), "Logging initialized");
    Ok(Some(guard))
}

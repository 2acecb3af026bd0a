//! Tracing setup.
//!
//! The panel owns the terminal, so log output goes to an append-mode file and
//! never to stderr. `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber writing to `path`.
///
/// # Errors
///
/// Returns `Err` if the log directory or file cannot be created, or if a global
/// subscriber is already installed.
pub fn init(path: &Path, default_level: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(std::io::Error::other)
}

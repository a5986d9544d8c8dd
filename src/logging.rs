//! Log setup. The terminal belongs to the UI, so records go to a file.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, fmt::time::ChronoLocal, EnvFilter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Installs the global subscriber; `RUST_LOG` overrides the default level.
/// Without a path, records go to stderr at `warn` so one-shot output stays clean.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    static INIT: Once = Once::new();
    let mut outcome = Ok(());

    INIT.call_once(|| {
        let default_level = if log_file.is_some() { "info" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let builder = fmt()
            .with_env_filter(filter)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_target(false)
            .with_level(true);

        outcome = match log_file {
            Some(path) => open_log(path).map(|file| {
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init()
            }),
            None => {
                builder.with_writer(std::io::stderr).init();
                Ok(())
            }
        };
    });

    outcome
}

fn open_log(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

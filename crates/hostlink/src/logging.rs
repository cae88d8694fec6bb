//! Logging setup.
//!
//! Installs a `tracing` subscriber that prints to stdout and, when a log
//! folder is configured, also appends to a timestamped file inside it.
//! The filter honors `RUST_LOG`; without it the level is `info`, or
//! `debug` when debug logs are requested.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. Returns the log file path when one was
/// opened.
///
/// Does nothing if a subscriber is already installed, so an embedding
/// process (or a test harness) keeps control of its own logging.
pub fn init(log_folder: Option<&Path>, debug: bool) -> Option<PathBuf> {
    if tracing::dispatcher::has_been_set() {
        return None;
    }

    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let opened = log_folder
        .filter(|folder| !folder.as_os_str().is_empty())
        .map(open_log_file);

    let (file_layer, path, failure) = match opened {
        Some(Ok((file, path))) => (
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file))),
            Some(path),
            None,
        ),
        Some(Err(e)) => (None, None, Some(e)),
        None => (None, None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .is_ok();

    if let Some(e) = failure {
        tracing::warn!(error = %e, "cannot create log file, logging to stdout only");
    }
    installed.then_some(path).flatten()
}

/// `<folder>/GSDK_output_<unix-seconds>.txt`
pub fn log_file_path(folder: &Path, unix_secs: i64) -> PathBuf {
    folder.join(format!("GSDK_output_{unix_secs}.txt"))
}

fn open_log_file(folder: &Path) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(folder)?;
    let path = log_file_path(folder, chrono::Utc::now().timestamp());
    let file = File::options().create(true).append(true).open(&path)?;
    Ok((file, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let path = log_file_path(Path::new("/var/log/game"), 1_700_000_000);
        assert_eq!(path, Path::new("/var/log/game/GSDK_output_1700000000.txt"));
    }

    #[test]
    fn test_open_log_file_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested").join("logs");

        let (_file, path) = open_log_file(&folder).unwrap();

        assert!(folder.is_dir());
        assert!(path.starts_with(&folder));
        assert!(path.is_file());
    }

    #[test]
    fn test_open_log_file_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        assert!(open_log_file(&blocker.join("logs")).is_err());
    }
}

//! Append-only log of unhandled handler errors.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::BridgeError;

/// Error log file. With no path configured, entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    path: Option<PathBuf>,
}

impl ErrorLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry stamped with the current unix time.
    pub fn append(&self, error: &anyhow::Error) -> Result<(), BridgeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format_entry(secs, error).as_bytes())?;
        Ok(())
    }
}

pub fn format_entry(secs: u64, error: &anyhow::Error) -> String {
    format!("[{secs}] Unhandled exception:\n{error:?}\n")
}

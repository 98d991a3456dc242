//! Error types for the lanledger-scan crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Nmap produced no output for target {target}")]
    EmptyOutput { target: String },

    #[error("Nmap did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("Invalid scan target: {0}")]
    InvalidTarget(String),

    #[error("Store error: {0}")]
    Store(#[from] lanledger_store::StoreError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Reconciliation task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// True when the scan itself could not deliver a report, so nothing
    /// was handed to the store.
    pub fn is_scan_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NmapNotFound { .. }
                | Self::NmapFailed { .. }
                | Self::EmptyOutput { .. }
                | Self::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

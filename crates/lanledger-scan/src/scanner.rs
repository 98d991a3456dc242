//! Nmap process wrapper.
//!
//! Runs `nmap -sn <target>` as a child process via `tokio::process::Command`
//! and hands back its normal (human-readable) output unparsed.

use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::config::ScanTarget;
use crate::error::{Result, ScanError};

/// Raw output of one ping sweep.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub target: String,
    pub report: String,
    pub duration: Duration,
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
    timeout: Duration,
}

impl NmapScanner {
    pub fn new(nmap_path: &str, timeout: Duration) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
            timeout,
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| ScanError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Ping-sweep `target`.
    ///
    /// The child is killed if it outlives the configured timeout. Hardware
    /// addresses only appear in the report when nmap runs with enough
    /// privilege to send raw ARP requests.
    pub async fn scan(&self, target: &ScanTarget) -> Result<ScanOutput> {
        let target = target.to_string();
        let start = Instant::now();

        tracing::info!(target = %target, nmap = %self.nmap_path, "Starting nmap scan");

        let child = Command::new(&self.nmap_path)
            .arg("-sn")
            .arg(&target)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ScanError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ScanError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        let duration = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ScanError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let report = String::from_utf8_lossy(&output.stdout).into_owned();
        if report.trim().is_empty() {
            return Err(ScanError::EmptyOutput { target });
        }

        tracing::info!(
            target = %target,
            bytes = report.len(),
            duration_ms = duration.as_millis() as u64,
            "Nmap scan complete"
        );

        Ok(ScanOutput {
            target,
            report,
            duration,
        })
    }
}

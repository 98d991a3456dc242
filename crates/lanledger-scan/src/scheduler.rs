//! Pass execution and scheduling.
//!
//! A pass is scan → parse → reconcile → commit. The daemon repeats passes on
//! a fixed interval; a failed pass is logged and the next tick proceeds.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use lanledger_core::Timestamp;
use lanledger_store::BatchStats;

use crate::config::{ScanConfig, ScanTarget};
use crate::error::{Result, ScanError};
use crate::pipeline;
use crate::report::{self, RunSummary};
use crate::scanner::NmapScanner;

/// Outcome of one completed pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub target: String,
    pub stats: BatchStats,
    pub summary: Option<RunSummary>,
    /// Time nmap itself took; `None` for imported reports.
    pub scan_duration: Option<Duration>,
    pub duration: Duration,
}

/// Runs passes against one target on the configured interval.
pub struct PassScheduler {
    config: ScanConfig,
    scanner: NmapScanner,
    target: ScanTarget,
}

impl PassScheduler {
    pub fn new(config: ScanConfig, scanner: NmapScanner, target: ScanTarget) -> Self {
        Self {
            config,
            scanner,
            target,
        }
    }

    /// Loop forever, one pass per tick. Passes never overlap.
    pub async fn run(&self) -> Result<()> {
        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target = %self.target,
            interval_secs = self.config.interval_secs,
            "Scheduler started"
        );

        loop {
            ticker.tick().await;
            tracing::info!(target = %self.target, "Scheduled pass triggered");

            if let Err(e) = run_single_pass(&self.scanner, &self.config, &self.target).await {
                tracing::error!(
                    target = %self.target,
                    error = %e,
                    scan_unavailable = e.is_scan_unavailable(),
                    "Scheduled pass failed"
                );
            }
        }
    }
}

/// Execute a single pass: nmap → archive → parse → reconcile.
///
/// A failed scan returns before the store is opened.
pub async fn run_single_pass(
    scanner: &NmapScanner,
    config: &ScanConfig,
    target: &ScanTarget,
) -> Result<PassReport> {
    let pass_id = Uuid::new_v4();
    let start = Instant::now();
    tracing::info!(pass_id = %pass_id, target = %target, "Pass started");

    let output = match scanner.scan(target).await {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!(pass_id = %pass_id, error = %e, "Scan unavailable, nothing persisted");
            return Err(e);
        }
    };

    if let Some(path) = &config.report_path {
        archive_report(path, &output.report).await;
    }

    reconcile_pass(
        pass_id,
        start,
        output.target,
        output.report,
        Some(output.duration),
        config,
    )
    .await
}

/// Reconcile a report saved by an earlier scan, without running nmap.
pub async fn import_report_file(path: &Path, config: &ScanConfig) -> Result<PassReport> {
    let pass_id = Uuid::new_v4();
    let start = Instant::now();
    tracing::info!(pass_id = %pass_id, file = %path.display(), "Importing report file");

    // Same lossy decoding as live scan output.
    let bytes = tokio::fs::read(path).await?;
    let report = String::from_utf8_lossy(&bytes).into_owned();
    reconcile_pass(
        pass_id,
        start,
        path.display().to_string(),
        report,
        None,
        config,
    )
    .await
}

async fn reconcile_pass(
    pass_id: Uuid,
    start: Instant,
    target: String,
    report: String,
    scan_duration: Option<Duration>,
    config: &ScanConfig,
) -> Result<PassReport> {
    let summary = report::parse_run_summary(&report);
    let at = Timestamp::now();
    let db_path = config.db_path.clone();

    // rusqlite is blocking; keep it off the async workers.
    let stats = tokio::task::spawn_blocking(move || pipeline::ingest_into(&db_path, &report, at))
        .await
        .map_err(|e| ScanError::Task(e.to_string()))??;

    let duration = start.elapsed();
    tracing::info!(
        pass_id = %pass_id,
        target = %target,
        created = stats.created,
        updated = stats.updated,
        hosts_up = summary.as_ref().map(|s| s.hosts_up),
        scan_ms = scan_duration.map(|d| d.as_millis() as u64),
        duration_ms = duration.as_millis() as u64,
        "Pass complete"
    );

    Ok(PassReport {
        pass_id,
        target,
        stats,
        summary,
        scan_duration,
        duration,
    })
}

async fn archive_report(path: &str, report: &str) {
    match tokio::fs::write(path, report).await {
        Ok(()) => tracing::debug!(path = %path, "Archived raw report"),
        Err(e) => tracing::warn!(path = %path, error = %e, "Failed to archive raw report"),
    }
}

//! Store persistence: fold one report into the device inventory.

use lanledger_core::Timestamp;
use lanledger_store::{BatchStats, DeviceStore};

use crate::error::Result;
use crate::report;

/// Reconcile every device of `report` in one transaction.
///
/// All sightings share the pass timestamp `at`. Nothing becomes visible
/// unless the whole batch commits.
pub fn ingest_report(store: &mut DeviceStore, report: &str, at: Timestamp) -> Result<BatchStats> {
    let mut batch = store.begin_pass()?;

    for device in report::parse_report(report) {
        batch.reconcile(&device, at)?;
    }

    Ok(batch.commit()?)
}

/// Open the store at `db_path` and ingest `report` into it.
pub fn ingest_into(db_path: &str, report: &str, at: Timestamp) -> Result<BatchStats> {
    let mut store = DeviceStore::open(db_path)?;
    ingest_report(&mut store, report, at)
}

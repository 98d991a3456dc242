//! Write operations for the device inventory.
//!
//! Rows are identified by `mac_address`. Reconciliation attempts a create and
//! lets the primary key decide whether the device is new; a conflict turns
//! the sighting into an update of the existing row.

use rusqlite::{ffi, params, ErrorCode, Transaction};

use lanledger_core::{DeviceRecord, DeviceUpdate, DiscoveredDevice, MacAddress, Timestamp};

use crate::client::StoreError;
use crate::queries;

/// What a single reconciliation did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Created,
    Updated,
}

/// Counters for one committed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub created: u32,
    pub updated: u32,
}

impl BatchStats {
    pub fn devices_seen(&self) -> u32 {
        self.created + self.updated
    }
}

/// All reconciliations of one scan pass, applied inside a single transaction.
pub struct ReconcileBatch<'conn> {
    txn: Transaction<'conn>,
    stats: BatchStats,
}

impl<'conn> ReconcileBatch<'conn> {
    pub(crate) fn new(txn: Transaction<'conn>) -> Self {
        Self {
            txn,
            stats: BatchStats::default(),
        }
    }

    /// Look up a device, seeing this batch's own uncommitted writes.
    pub fn lookup(&self, mac: &MacAddress) -> Result<Option<DeviceRecord>, StoreError> {
        queries::select_device(&self.txn, mac)
    }

    /// Create a new row. Fails with [`StoreError::Conflict`] if the address
    /// is already present.
    pub fn insert(&self, record: &DeviceRecord) -> Result<(), StoreError> {
        let mac = MacAddress::new(record.mac.as_str());
        let result = self.txn.execute(
            "INSERT INTO devices
               (mac_address, ip_address, hostname, vendor, first_seen, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                mac.as_str(),
                record.ip,
                record.hostname,
                record.vendor,
                record.first_seen.to_string(),
                record.last_seen.to_string(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if is_primary_key_conflict(&err) => {
                Err(StoreError::Conflict { mac })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the identity fields and `last_seen` of an existing row.
    ///
    /// `vendor` and `first_seen` are never touched. `last_seen` is clamped so
    /// it can never fall below `first_seen`.
    pub fn update(&self, mac: &MacAddress, update: &DeviceUpdate) -> Result<(), StoreError> {
        let mac = MacAddress::new(mac.as_str());
        let changed = self.txn.execute(
            "UPDATE devices
             SET ip_address = ?1, hostname = ?2, last_seen = MAX(first_seen, ?3)
             WHERE mac_address = ?4",
            params![
                update.ip,
                update.hostname,
                update.last_seen.to_string(),
                mac.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound { mac });
        }
        Ok(())
    }

    /// Fold one sighting into the inventory.
    ///
    /// A hostname-less sighting clears a previously stored hostname.
    pub fn reconcile(
        &mut self,
        device: &DiscoveredDevice,
        at: Timestamp,
    ) -> Result<Reconciled, StoreError> {
        let record = DeviceRecord::first_sighting(device, at);

        let outcome = match self.insert(&record) {
            Ok(()) => Reconciled::Created,
            Err(StoreError::Conflict { mac }) => {
                self.update(&mac, &DeviceUpdate::from_sighting(device, at))?;
                Reconciled::Updated
            }
            Err(e) => return Err(e),
        };

        match outcome {
            Reconciled::Created => self.stats.created += 1,
            Reconciled::Updated => self.stats.updated += 1,
        }

        tracing::debug!(
            mac = %record.mac,
            ip = %record.ip,
            hostname = record.hostname.as_deref().unwrap_or(""),
            outcome = ?outcome,
            "Reconciled device"
        );

        Ok(outcome)
    }

    /// Counters for the reconciliations applied so far.
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Make every reconciliation of this batch durable at once.
    pub fn commit(self) -> Result<BatchStats, StoreError> {
        self.txn.commit()?;
        tracing::info!(
            created = self.stats.created,
            updated = self.stats.updated,
            "Committed reconciliation batch"
        );
        Ok(self.stats)
    }
}

fn is_primary_key_conflict(err: &ffi::Error) -> bool {
    err.code == ErrorCode::ConstraintViolation
        && (err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
}

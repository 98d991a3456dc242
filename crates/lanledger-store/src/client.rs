//! SQLite connection management and schema bootstrap.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, TransactionBehavior};

use lanledger_core::MacAddress;

use crate::mutations::ReconcileBatch;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Device store unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A create attempt found an existing row for this address.
    #[error("Device already exists: {mac}")]
    Conflict { mac: MacAddress },

    #[error("No device inventory at {path}")]
    Missing { path: String },

    #[error("Device not found: {mac}")]
    NotFound { mac: MacAddress },

    #[error("SQLite error: {0}")]
    Query(#[from] rusqlite::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS devices (
    mac_address TEXT PRIMARY KEY,
    ip_address  TEXT,
    hostname    TEXT,
    vendor      TEXT,
    first_seen  TEXT,
    last_seen   TEXT
);";

/// Handle to the device inventory database.
///
/// Owns a single connection; a scan pass borrows it mutably through
/// [`DeviceStore::begin_pass`].
pub struct DeviceStore {
    conn: Connection,
    location: String,
}

impl DeviceStore {
    /// Open (creating if needed) the inventory database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let location = path.as_ref().display().to_string();
        let conn = Connection::open(path.as_ref()).map_err(|source| StoreError::Unavailable {
            path: location.clone(),
            source,
        })?;
        Self::bootstrap(conn, location)
    }

    /// Open an existing inventory for reading only.
    ///
    /// Never creates the file; a missing database is [`StoreError::Missing`].
    /// Write attempts through the returned handle fail.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        if !path.is_file() {
            return Err(StoreError::Missing { path: location });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Unavailable {
            path: location.clone(),
            source,
        })?;

        tracing::info!(path = %location, "Opened device store read-only");
        Ok(Self { conn, location })
    }

    /// Open a private in-memory database. Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Unavailable {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::bootstrap(conn, ":memory:".to_string())
    }

    fn bootstrap(conn: Connection, location: String) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|source| StoreError::Unavailable {
                path: location.clone(),
                source,
            })?;

        tracing::info!(path = %location, "Opened device store");
        Ok(Self { conn, location })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin the write transaction for one scan pass.
    ///
    /// The write lock is taken immediately so a second process cannot
    /// interleave its own pass. Dropping the batch without `commit` rolls
    /// every reconciliation back.
    pub fn begin_pass(&mut self) -> Result<ReconcileBatch<'_>, StoreError> {
        let location = &self.location;
        let txn = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| StoreError::Unavailable {
                path: location.clone(),
                source,
            })?;
        Ok(ReconcileBatch::new(txn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = DeviceStore::open_in_memory().unwrap();
        store.conn().execute_batch(SCHEMA).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("devices.db");
        match DeviceStore::open(&path) {
            Err(StoreError::Unavailable { path: p, .. }) => assert!(p.ends_with("devices.db")),
            Err(other) => panic!("expected Unavailable, got {other}"),
            Ok(_) => panic!("expected open to fail"),
        }
    }

    #[test]
    fn test_read_only_open_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nmap_devices.db");

        let err = DeviceStore::open_read_only(&path).err().unwrap();
        assert!(matches!(err, StoreError::Missing { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_only_open_sees_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nmap_devices.db");
        {
            let store = DeviceStore::open(&path).unwrap();
            store
                .conn()
                .execute(
                    "INSERT INTO devices VALUES ('AA:AA:AA:AA:AA:01', '10.0.0.1', NULL, 'x', '2026-01-01 00:00:00', '2026-01-01 00:00:00')",
                    [],
                )
                .unwrap();
        }

        let store = DeviceStore::open_read_only(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store
            .conn()
            .execute("DELETE FROM devices", [])
            .is_err());
    }
}

//! Read operations for the device inventory.

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use lanledger_core::{DeviceRecord, MacAddress, Timestamp};

use crate::client::{DeviceStore, StoreError};

const SELECT_COLUMNS: &str =
    "SELECT mac_address, ip_address, hostname, vendor, first_seen, last_seen FROM devices";

impl DeviceStore {
    /// Get a device by hardware address, in any letter case.
    pub fn get(&self, mac: &MacAddress) -> Result<Option<DeviceRecord>, StoreError> {
        select_device(self.conn(), mac)
    }

    /// List every known device, most recently seen first.
    pub fn list(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY last_seen DESC, mac_address"))?;
        let rows = stmt.query_map([], row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Count the rows in the inventory.
    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

pub(crate) fn select_device(
    conn: &Connection,
    mac: &MacAddress,
) -> Result<Option<DeviceRecord>, StoreError> {
    let mac = MacAddress::new(mac.as_str());
    let record = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE mac_address = ?1"),
            [mac.as_str()],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DeviceRecord> {
    let mac: String = row.get(0)?;
    Ok(DeviceRecord {
        mac: MacAddress::new(&mac),
        ip: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        hostname: row.get(2)?,
        vendor: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        first_seen: timestamp_column(row, 4)?,
        last_seen: timestamp_column(row, 5)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

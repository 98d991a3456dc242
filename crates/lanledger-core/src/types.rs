//! Core domain types for the device inventory.
//!
//! A scan pass yields `DiscoveredDevice` sightings; the store folds them into
//! one `DeviceRecord` per hardware address.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

// ── Hardware Address ──────────────────────────────────────────────

/// A hardware (MAC) address in canonical form: uppercase, colon-separated.
///
/// Construction always normalizes case, so `aa:bb:..` and `AA:BB:..` compare
/// equal and can never produce two inventory rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MacAddress {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

// ── Timestamps ────────────────────────────────────────────────────

/// Text form of every persisted timestamp: sortable, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    pub fn from_naive(at: NaiveDateTime) -> Self {
        Self(at.trunc_subsecs(0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .map(Self::from_naive)
            .map_err(|source| LedgerError::InvalidTimestamp {
                value: s.to_string(),
                source,
            })
    }
}

impl TryFrom<String> for Timestamp {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}

// ── Sightings & Records ───────────────────────────────────────────

/// One host extracted from a scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub ip: String,
    pub hostname: Option<String>,
    pub mac: MacAddress,
    /// Vendor label attached to the MAC; nmap reports "Unknown" when the
    /// OUI lookup fails.
    pub vendor: String,
}

/// A durable inventory row, one per hardware address ever observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub mac: MacAddress,
    pub ip: String,
    pub hostname: Option<String>,
    pub vendor: String,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
}

impl DeviceRecord {
    /// Build the row created by the first sighting of a device.
    pub fn first_sighting(device: &DiscoveredDevice, at: Timestamp) -> Self {
        Self {
            mac: MacAddress::new(device.mac.as_str()),
            ip: device.ip.clone(),
            hostname: device.hostname.clone(),
            vendor: device.vendor.clone(),
            first_seen: at,
            last_seen: at,
        }
    }
}

/// Fields overwritten when an already-known device is seen again.
///
/// `hostname` is written as-is: a sighting without a name clears the stored
/// one (last write wins, no merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub ip: String,
    pub hostname: Option<String>,
    pub last_seen: Timestamp,
}

impl DeviceUpdate {
    pub fn from_sighting(device: &DiscoveredDevice, at: Timestamp) -> Self {
        Self {
            ip: device.ip.clone(),
            hostname: device.hostname.clone(),
            last_seen: at,
        }
    }
}

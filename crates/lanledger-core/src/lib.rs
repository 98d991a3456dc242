//! lanledger-core: Shared types and error handling for the lanledger device inventory.
//!
//! This crate provides the foundational types used by the report parser and
//! the reconciliation store:
//! - `DiscoveredDevice`, one sighting extracted from a scan report
//! - `DeviceRecord`, the durable inventory row keyed by hardware address
//! - `MacAddress` and `Timestamp` with their canonical text forms
//! - Common error types

pub mod error;
pub mod types;

pub use error::LedgerError;
pub use types::{DeviceRecord, DeviceUpdate, DiscoveredDevice, MacAddress, Timestamp};

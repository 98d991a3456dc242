//! lanledger-scan: LAN device inventory fed by nmap ping sweeps.
//!
//! Runs `nmap -sn` against a target range, scrapes hosts and hardware
//! addresses from its text report, and reconciles them into the SQLite
//! inventory kept by `lanledger-store`.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod scheduler;

//! lanledger-store: durable device inventory backed by SQLite.
//!
//! This crate is the single mutation point for the `devices` table. Every
//! write goes through a `ReconcileBatch`, one transaction per scan pass, so a
//! pass is either fully visible or not at all.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{DeviceStore, StoreError};
pub use mutations::{BatchStats, ReconcileBatch, Reconciled};

//! parkledger - Single-site vehicle parking ledger
//!
//! This library provides functionality to:
//! - Record vehicle entries and exits with one active session per plate
//! - Bill completed visits per started hour using a per-class rate table
//! - Persist the ledger in a local SQLite database
//! - Generate daily, ISO-weekly and monthly revenue reports in table and JSON formats
//!
//! # Examples
//!
//! ```
//! use parkledger::{
//!     aggregation::Aggregator,
//!     lifecycle::SessionManager,
//! };
//! use parkledger_core::{aggregation_types::GroupBy, timezone::TimezoneConfig, VehicleClass};
//! use parkledger_pricing::RateTable;
//! use parkledger_store::MemorySessionStore;
//! use chrono::DateTime;
//!
//! fn main() -> parkledger::Result<()> {
//!     let manager = SessionManager::new(MemorySessionStore::new());
//!     let entry = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+07:00").unwrap();
//!     let exit = DateTime::parse_from_rfc3339("2024-01-01T11:00:01+07:00").unwrap();
//!
//!     manager.record_entry("B 1234 CD", VehicleClass::Car, entry)?;
//!     let (_, receipt) = manager.record_exit("B 1234 CD", exit, &RateTable::default())?;
//!     assert_eq!(receipt.billed_hours, 2);
//!
//!     let aggregator = Aggregator::new(TimezoneConfig::new(chrono_tz::Asia::Jakarta));
//!     let rows = aggregator.aggregate(&manager.list_all()?, GroupBy::Day);
//!     assert_eq!(rows[0].total_revenue, 8000);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod filters;
pub mod lifecycle;
pub mod output;

// Re-export commonly used types
pub use parkledger_core::error::{LedgerError, Result};
pub use parkledger_core::types::{
    ParkingSession, Plate, SessionId, SessionStatus, Timestamp, VehicleClass,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core types, errors, and timezone handling for parkledger
//!
//! This crate provides the parking session entity, the error taxonomy,
//! timezone configuration and report data types shared by all other
//! parkledger crates.

pub mod aggregation_types;
pub mod error;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use types::{ParkingSession, Plate, SessionId, SessionStatus, Timestamp, VehicleClass};

//! Error types for parkledger
//!
//! This module defines the error types used throughout the parkledger crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use parkledger_core::error::{LedgerError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to LedgerError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::types::Timestamp;

/// Main error type for parkledger operations
///
/// Lifecycle rule violations are recoverable and meant to be shown to the
/// operator as-is; storage failures abort the operation in progress.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Plate or other operator input is empty or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entry attempted for a vehicle that is still parked
    #[error("Vehicle {plate} is still parked")]
    DuplicateActiveSession {
        /// Normalized plate of the parked vehicle
        plate: String,
    },

    /// No session matched the requested plate or id
    #[error("No {kind} parking session found for {target}")]
    NotFound {
        /// "active" or "recorded"
        kind: &'static str,
        /// Plate or session id that was looked up
        target: String,
    },

    /// Operation not allowed in the session's current state
    #[error("Session for {plate} cannot be changed: {reason}")]
    InvalidState {
        /// Normalized plate of the session
        plate: String,
        /// Why the transition was refused
        reason: String,
    },

    /// Exit timestamp precedes the entry timestamp
    #[error("Exit time {exit} is before entry time {entry}")]
    InvalidDuration {
        /// Recorded entry time
        entry: Timestamp,
        /// Offending exit time
        exit: Timestamp,
    },

    /// SQLite storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted row could not be turned back into a session
    #[error("Corrupt record at row {row}: {error}")]
    CorruptRecord {
        /// 1-based row position in the table
        row: usize,
        /// What was wrong with it
        error: String,
    },

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Whether the error is a rule violation the caller can report and move past
    ///
    /// Storage, IO and corruption errors return `false`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateActiveSession { .. }
                | Self::NotFound { .. }
                | Self::InvalidState { .. }
                | Self::InvalidDuration { .. }
                | Self::InvalidTimezone(_)
                | Self::InvalidDate(_)
                | Self::Config(_)
        )
    }
}

/// Convenience type alias for Results in parkledger
///
/// # Example
///
/// ```
/// use parkledger_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LedgerError::DuplicateActiveSession {
            plate: "B 1234 CD".to_string(),
        };
        assert_eq!(error.to_string(), "Vehicle B 1234 CD is still parked");

        let error = LedgerError::NotFound {
            kind: "active",
            target: "B 1".to_string(),
        };
        assert_eq!(error.to_string(), "No active parking session found for B 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ledger_error: LedgerError = io_error.into();
        assert!(matches!(ledger_error, LedgerError::Io(_)));
        assert!(!ledger_error.is_recoverable());
    }

    #[test]
    fn test_rule_violations_are_recoverable() {
        assert!(LedgerError::Validation("empty".into()).is_recoverable());
        assert!(
            LedgerError::InvalidState {
                plate: "A".into(),
                reason: "active".into()
            }
            .is_recoverable()
        );
        assert!(
            !LedgerError::CorruptRecord {
                row: 1,
                error: "bad".into()
            }
            .is_recoverable()
        );
    }
}

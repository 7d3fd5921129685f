//! Filtering module for parking sessions
//!
//! Supports date ranges, lifecycle status and plate filtering for listings
//! and reports. Dates are evaluated in the filter's timezone.
//!
//! # Examples
//!
//! ```
//! use parkledger::filters::SessionFilter;
//! use parkledger_core::SessionStatus;
//! use chrono::NaiveDate;
//!
//! // Closed sessions that left during January 2024
//! let filter = SessionFilter::new()
//!     .with_since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
//!     .with_until(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
//!     .with_status(SessionStatus::Closed);
//! ```

use chrono::NaiveDate;
use chrono_tz::Tz;
use parkledger_core::{ParkingSession, Plate, SessionStatus};

/// Filter configuration for parking sessions
///
/// All filters are optional and combine with AND. A session's reference
/// date is its exit date once closed, its entry date while active.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    /// Start date filter (inclusive)
    pub since_date: Option<NaiveDate>,
    /// End date filter (inclusive)
    pub until_date: Option<NaiveDate>,
    /// Lifecycle status filter
    pub status: Option<SessionStatus>,
    /// Plate filter
    pub plate: Option<Plate>,
    /// Timezone used to derive calendar dates
    pub timezone: Tz,
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self {
            since_date: None,
            until_date: None,
            status: None,
            plate: None,
            timezone: Tz::UTC,
        }
    }
}

impl SessionFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start date filter
    pub fn with_since(mut self, date: NaiveDate) -> Self {
        self.since_date = Some(date);
        self
    }

    /// Set the end date filter
    pub fn with_until(mut self, date: NaiveDate) -> Self {
        self.until_date = Some(date);
        self
    }

    /// Only keep sessions in `status`
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only keep sessions for `plate`
    pub fn with_plate(mut self, plate: Plate) -> Self {
        self.plate = Some(plate);
        self
    }

    /// Set the timezone for date calculations
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Check if a session passes the filter
    pub fn matches(&self, session: &ParkingSession) -> bool {
        if let Some(status) = self.status {
            if session.status != status {
                return false;
            }
        }

        if let Some(plate) = &self.plate {
            if &session.plate != plate {
                return false;
            }
        }

        let reference = session.exit_time.unwrap_or(session.entry_time);
        let date = reference.with_timezone(&self.timezone).date_naive();

        if let Some(since) = self.since_date {
            if date < since {
                return false;
            }
        }

        if let Some(until) = self.until_date {
            if date > until {
                return false;
            }
        }

        true
    }

    /// Keep only matching sessions, preserving order
    pub fn apply(&self, sessions: Vec<ParkingSession>) -> Vec<ParkingSession> {
        sessions.into_iter().filter(|s| self.matches(s)).collect()
    }
}

//! Fee calculator for parking sessions
//!
//! Parking is billed per started hour: any time past a whole hour, even a
//! single second, counts as another hour, and every visit pays for at least
//! one hour.
//!
//! # Examples
//!
//! ```
//! use parkledger_pricing::{FeeCalculator, RateTable};
//! use parkledger_core::types::VehicleClass;
//! use chrono::DateTime;
//!
//! let entry = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+07:00").unwrap();
//! let exit = DateTime::parse_from_rfc3339("2024-01-01T12:10:00+07:00").unwrap();
//!
//! let quote = FeeCalculator::compute_fee(entry, exit, VehicleClass::Motorcycle, &RateTable::default())?;
//! assert_eq!(quote.billed_hours, 3);
//! assert_eq!(quote.fee, 6000);
//! # Ok::<(), parkledger_core::LedgerError>(())
//! ```

use crate::rate_table::RateTable;
use chrono::{Duration, SubsecRound};
use parkledger_core::error::{LedgerError, Result};
use parkledger_core::types::{Timestamp, VehicleClass};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SECONDS_PER_HOUR: i64 = 3600;

/// Outcome of pricing one visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Whole seconds between entry and exit
    pub elapsed_seconds: i64,
    /// Hours charged after rounding up
    pub billed_hours: u32,
    /// Hourly rate that was applied
    pub rate: u64,
    /// `billed_hours * rate`
    pub fee: u64,
}

impl FeeQuote {
    /// Time in the lot as a chrono duration
    pub fn elapsed(&self) -> Duration {
        Duration::seconds(self.elapsed_seconds)
    }
}

/// Stateless hourly fee calculator
pub struct FeeCalculator;

impl FeeCalculator {
    /// Price a visit from entry to exit
    ///
    /// Both timestamps are truncated to whole seconds first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidDuration`] when `exit` precedes `entry`,
    /// and [`LedgerError::Validation`] if the fee would overflow.
    pub fn compute_fee(
        entry: Timestamp,
        exit: Timestamp,
        vehicle_class: VehicleClass,
        rates: &RateTable,
    ) -> Result<FeeQuote> {
        let entry = entry.trunc_subsecs(0);
        let exit = exit.trunc_subsecs(0);
        let elapsed = exit - entry;
        if elapsed < Duration::zero() {
            return Err(LedgerError::InvalidDuration { entry, exit });
        }

        let billed_hours = Self::billed_hours(elapsed)?;
        let rate = rates.rate_for(vehicle_class);
        let fee = u64::from(billed_hours).checked_mul(rate).ok_or_else(|| {
            LedgerError::Validation(format!(
                "fee for {billed_hours} hours at {rate} per hour overflows"
            ))
        })?;

        debug!(
            "Priced {} visit: {}s elapsed, {} hour(s) at {} = {}",
            vehicle_class,
            elapsed.num_seconds(),
            billed_hours,
            rate,
            fee
        );

        Ok(FeeQuote {
            elapsed_seconds: elapsed.num_seconds(),
            billed_hours,
            rate,
            fee,
        })
    }

    /// Round a non-negative duration up to whole hours, minimum one
    pub fn billed_hours(elapsed: Duration) -> Result<u32> {
        let seconds = elapsed.num_seconds().max(0);
        let mut hours = seconds / SECONDS_PER_HOUR;
        if seconds % SECONDS_PER_HOUR > 0 {
            hours += 1;
        }
        u32::try_from(hours.max(1))
            .map_err(|_| LedgerError::Validation(format!("parking duration of {seconds}s is too long")))
    }

    /// Format a duration as "42 min" or "3 h 5 min" (minutes floored)
    pub fn format_duration(elapsed: Duration) -> String {
        let seconds = elapsed.num_seconds().max(0);
        let hours = seconds / SECONDS_PER_HOUR;
        let minutes = (seconds % SECONDS_PER_HOUR) / 60;
        if hours == 0 {
            format!("{minutes} min")
        } else {
            format!("{hours} h {minutes} min")
        }
    }
}

//! CLI interface for parkledger
//!
//! This module defines the command-line interface using clap. The binary is
//! a thin operator console over the lifecycle manager and report aggregator.
//!
//! # Example
//!
//! ```bash
//! # A car arrives and later leaves
//! parkledger entry "B 1234 CD" --class car
//! parkledger exit "B 1234 CD" --car-rate 5000
//!
//! # Revenue per ISO week for the first quarter, as JSON
//! parkledger weekly --since 2024-01 --until 2024-03-31 --json
//! ```

use clap::{ArgGroup, Args, Parser, Subcommand};
use parkledger_core::error::{LedgerError, Result};
use parkledger_core::types::{SessionId, VehicleClass};
use parkledger_pricing::RateTable;
use parkledger_pricing::rate_table::{DEFAULT_CAR_RATE, DEFAULT_MOTORCYCLE_RATE};
use std::path::PathBuf;

/// Single-site parking ledger
#[derive(Parser, Debug, Clone)]
#[command(name = "parkledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the ledger database (default: <data dir>/parkledger/parkledger.db)
    #[arg(long, env = "PARKLEDGER_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Only show warnings and errors in the log
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Filter by start date (YYYY-MM-DD or YYYY-MM)
    #[arg(long, global = true)]
    pub since: Option<String>,

    /// Filter by end date (YYYY-MM-DD or YYYY-MM)
    #[arg(long, global = true)]
    pub until: Option<String>,

    /// Timezone for timestamps and date grouping (e.g. "Asia/Jakarta", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Use UTC (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Database path, falling back to the per-user data directory
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }
}

/// Default ledger location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parkledger")
        .join("parkledger.db")
}

/// Hourly rates supplied by the operator
#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    /// Motorcycle rate per started hour
    #[arg(long, env = "PARKLEDGER_MOTORCYCLE_RATE", default_value_t = DEFAULT_MOTORCYCLE_RATE)]
    pub motorcycle_rate: u64,

    /// Car rate per started hour
    #[arg(long, env = "PARKLEDGER_CAR_RATE", default_value_t = DEFAULT_CAR_RATE)]
    pub car_rate: u64,
}

impl RateArgs {
    /// Validate into a rate table
    pub fn rate_table(&self) -> Result<RateTable> {
        RateTable::new(self.motorcycle_rate, self.car_rate)
    }
}

/// Arguments for deleting a record
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["plate", "id"])))]
pub struct DeleteArgs {
    /// Plate whose most recent record should be deleted
    pub plate: Option<String>,

    /// Exact record id (see `list`)
    #[arg(long)]
    pub id: Option<String>,

    /// Confirm that the record should be removed permanently
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Record selected by a confirmed `delete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Most recent record of this plate
    Plate(String),
    /// Exactly this record
    Id(SessionId),
}

impl DeleteArgs {
    /// Resolve the record to delete, refusing without `--yes`
    pub fn confirmed_target(&self) -> Result<DeleteTarget> {
        let target = match (&self.id, &self.plate) {
            (Some(id), _) => DeleteTarget::Id(id.parse()?),
            (None, Some(plate)) => DeleteTarget::Plate(plate.clone()),
            (None, None) => {
                return Err(LedgerError::Validation(
                    "delete needs a plate or --id".to_string(),
                ));
            }
        };

        if !self.yes {
            let shown = self.id.as_deref().or(self.plate.as_deref()).unwrap_or_default();
            return Err(LedgerError::Validation(format!(
                "refusing to delete the record for {shown} without --yes"
            )));
        }
        Ok(target)
    }
}

/// Arguments for listing records
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only vehicles currently parked
    #[arg(long)]
    pub active: bool,

    /// Only completed visits
    #[arg(long, conflicts_with = "active")]
    pub closed: bool,

    /// Only records for this plate
    #[arg(long, short = 'p')]
    pub plate: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record a vehicle entering the lot
    Entry {
        /// Vehicle plate
        plate: String,

        /// Vehicle class (motorcycle or car)
        #[arg(long, short = 'c', default_value = "car")]
        class: VehicleClass,
    },

    /// Record a vehicle leaving and print its receipt
    Exit {
        /// Vehicle plate
        plate: String,

        #[command(flatten)]
        rates: RateArgs,
    },

    /// Permanently delete a completed record
    Delete(DeleteArgs),

    /// List parking records
    List(ListArgs),

    /// Show totals and the latest records
    Summary {
        /// Number of latest records to show
        #[arg(long, default_value = "5")]
        recent: usize,
    },

    /// Revenue per day
    Daily,

    /// Revenue per ISO week
    Weekly,

    /// Revenue per month
    Monthly,
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse date filter from string
///
/// Accepts dates in YYYY-MM-DD or YYYY-MM format.
/// For YYYY-MM format, defaults to the first day of the month.
///
/// # Example
///
/// ```
/// use parkledger::cli::parse_date_filter;
/// use chrono::Datelike;
///
/// let date = parse_date_filter("2024-01-15").unwrap();
/// assert_eq!(date.day(), 15);
///
/// let date = parse_date_filter("2024-01").unwrap();
/// assert_eq!(date.day(), 1);
/// ```
pub fn parse_date_filter(date_str: &str) -> Result<chrono::NaiveDate> {
    if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    let parts: Vec<&str> = date_str.split('-').collect();
    if parts.len() == 2 {
        let year = parts[0]
            .parse::<i32>()
            .map_err(|_| LedgerError::InvalidDate(format!("Invalid year in '{date_str}'")))?;
        let month = parts[1]
            .parse::<u32>()
            .map_err(|_| LedgerError::InvalidDate(format!("Invalid month in '{date_str}'")))?;

        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidDate(format!(
                "Month must be between 1-12, got {month}"
            )));
        }

        chrono::NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| LedgerError::InvalidDate(format!("Invalid date: {date_str}")))
    } else {
        Err(LedgerError::InvalidDate(format!(
            "Invalid date format '{}', expected YYYY-MM-DD or YYYY-MM",
            date_str
        )))
    }
}

/// Parse an upper-bound date filter
///
/// A bare YYYY-MM means "through the end of that month".
pub fn parse_until_filter(date_str: &str) -> Result<chrono::NaiveDate> {
    let date = parse_date_filter(date_str)?;
    if chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d").is_ok() {
        return Ok(date);
    }
    date.checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| LedgerError::InvalidDate(format!("Invalid date: {date_str}")))
}

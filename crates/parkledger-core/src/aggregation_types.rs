//! Aggregation data types for parkledger
//!
//! Pure data structures for revenue reports and the dashboard summary.
//! These types have no dependencies on the store or the lifecycle manager.

use crate::types::ParkingSession;
use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Period used to bucket closed sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupBy {
    /// Calendar day of the exit time
    Day,
    /// ISO-8601 week (ISO week-numbering year + week)
    IsoWeek,
    /// Calendar month
    Month,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "daily"),
            Self::IsoWeek => write!(f, "weekly"),
            Self::Month => write!(f, "monthly"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" | "isoweek" => Ok(Self::IsoWeek),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(format!("Invalid grouping: {s}")),
        }
    }
}

/// Key of one report bucket
///
/// Keys of the same grouping order chronologically.
///
/// # Examples
/// ```
/// use parkledger_core::aggregation_types::{GroupBy, ReportKey};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
/// assert_eq!(ReportKey::for_date(GroupBy::Day, date).to_string(), "2024-12-30");
/// // 2024-12-30 falls in ISO week 1 of 2025
/// assert_eq!(ReportKey::for_date(GroupBy::IsoWeek, date).to_string(), "2025-W01");
/// assert_eq!(ReportKey::for_date(GroupBy::Month, date).to_string(), "2024-12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "snake_case")]
pub enum ReportKey {
    Day { date: NaiveDate },
    IsoWeek { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl ReportKey {
    /// Bucket a local calendar date
    pub fn for_date(group_by: GroupBy, date: NaiveDate) -> Self {
        match group_by {
            GroupBy::Day => Self::Day { date },
            GroupBy::IsoWeek => {
                let week = date.iso_week();
                Self::IsoWeek {
                    year: week.year(),
                    week: week.week(),
                }
            }
            GroupBy::Month => Self::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    /// Human-friendly label, e.g. "January 2024" for months
    pub fn label(&self) -> String {
        match self {
            Self::Month { year, month } => u8::try_from(*month)
                .ok()
                .and_then(|m| Month::try_from(m).ok())
                .map(|m| format!("{} {year}", m.name()))
                .unwrap_or_else(|| self.to_string()),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day { date } => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::IsoWeek { year, week } => write!(f, "{year}-W{week:02}"),
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// One row of a revenue report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Bucket key
    pub key: ReportKey,
    /// Number of closed sessions in the bucket
    pub vehicle_count: u64,
    /// Sum of their fees
    pub total_revenue: u64,
}

/// Grand totals over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub vehicle_count: u64,
    pub total_revenue: u64,
}

impl Totals {
    /// Sum the rows, saturating at `u64::MAX`
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut totals = Self::default();
        for row in rows {
            totals.vehicle_count = totals.vehicle_count.saturating_add(row.vehicle_count);
            totals.total_revenue = totals.total_revenue.saturating_add(row.total_revenue);
        }
        totals
    }
}

/// Snapshot of the lot for the dashboard view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Every record in the ledger, active or closed
    pub total_records: usize,
    /// Vehicles currently parked
    pub currently_parked: usize,
    /// Revenue of all closed sessions
    pub total_revenue: u64,
    /// Most recently created records, oldest first
    pub recent: Vec<ParkingSession>,
}

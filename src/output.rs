//! Output formatting module for parkledger
//!
//! This module provides formatters for displaying ledger data in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use parkledger::output::get_formatter;
//! use parkledger_core::aggregation_types::{GroupBy, ReportKey, ReportRow, Totals};
//! use chrono::NaiveDate;
//!
//! let rows = vec![ReportRow {
//!     key: ReportKey::Day { date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() },
//!     vehicle_count: 2,
//!     total_revenue: 12000,
//! }];
//! let totals = Totals::from_rows(&rows);
//!
//! let formatter = get_formatter(false, chrono_tz::UTC);
//! let table = formatter.format_report(GroupBy::Day, &rows, &totals);
//! assert!(table.contains("12,000"));
//! ```

use crate::lifecycle::Receipt;
use chrono_tz::Tz;
use parkledger_core::aggregation_types::{DashboardSummary, GroupBy, ReportRow, Totals};
use parkledger_core::{ParkingSession, Timestamp};
use prettytable::{Table, format, row};
use serde_json::json;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a number with thousands separators
///
/// ```
/// assert_eq!(parkledger::output::format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, ch) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    result.chars().rev().collect()
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a list of sessions
    fn format_sessions(&self, data: &[ParkingSession]) -> String;

    /// Format a freshly recorded entry
    fn format_entry(&self, session: &ParkingSession) -> String;

    /// Format the receipt of a closed session
    fn format_receipt(&self, receipt: &Receipt) -> String;

    /// Format a deleted record
    fn format_deleted(&self, session: &ParkingSession) -> String;

    /// Format a revenue report with totals
    fn format_report(&self, group_by: GroupBy, data: &[ReportRow], totals: &Totals) -> String;

    /// Format the dashboard summary
    fn format_summary(&self, summary: &DashboardSummary) -> String;
}

/// Table formatter for human-readable output
///
/// Timestamps are shown in the configured timezone.
pub struct TableFormatter {
    tz: Tz,
}

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn format_time(&self, ts: &Timestamp) -> String {
        ts.with_timezone(&self.tz).format(TIME_FORMAT).to_string()
    }

    fn sessions_table(&self, data: &[ParkingSession]) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "No",
            b -> "Plate",
            b -> "Class",
            b -> "Entry",
            b -> "Exit",
            b -> "Hours",
            b -> "Fee",
            b -> "Status",
            b -> "ID"
        ]);

        for (index, session) in data.iter().enumerate() {
            let exit = session
                .exit_time
                .as_ref()
                .map(|t| self.format_time(t))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(row![
                r -> index + 1,
                session.plate,
                session.vehicle_class,
                self.format_time(&session.entry_time),
                exit,
                r -> session.billed_hours,
                r -> format_number(session.fee),
                session.status,
                session.id
            ]);
        }

        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_sessions(&self, data: &[ParkingSession]) -> String {
        if data.is_empty() {
            return "No parking records found.".to_string();
        }
        self.sessions_table(data).to_string()
    }

    fn format_entry(&self, session: &ParkingSession) -> String {
        format!(
            "Entry recorded for {} ({})\nEntry time: {}",
            session.plate,
            session.vehicle_class,
            self.format_time(&session.entry_time)
        )
    }

    fn format_receipt(&self, receipt: &Receipt) -> String {
        receipt.to_string()
    }

    fn format_deleted(&self, session: &ParkingSession) -> String {
        format!("Deleted record {} for {}", session.id, session.plate)
    }

    fn format_report(&self, group_by: GroupBy, data: &[ReportRow], totals: &Totals) -> String {
        if data.is_empty() {
            return "No completed parking sessions yet.".to_string();
        }

        let period = match group_by {
            GroupBy::Day => "Date",
            GroupBy::IsoWeek => "ISO Week",
            GroupBy::Month => "Month",
        };

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> period, b -> "Vehicles", b -> "Revenue"]);

        for report_row in data {
            table.add_row(row![
                report_row.key.label(),
                r -> format_number(report_row.vehicle_count),
                r -> format_number(report_row.total_revenue)
            ]);
        }

        table.add_row(row![
            b -> "TOTAL",
            rb -> format_number(totals.vehicle_count),
            rb -> format_number(totals.total_revenue)
        ]);

        table.to_string()
    }

    fn format_summary(&self, summary: &DashboardSummary) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Metric", b -> "Value"]);
        table.add_row(row!["Total vehicles", r -> format_number(summary.total_records as u64)]);
        table.add_row(row!["Currently parked", r -> format_number(summary.currently_parked as u64)]);
        table.add_row(row!["Revenue", r -> format_number(summary.total_revenue)]);

        let mut output = table.to_string();
        if !summary.recent.is_empty() {
            output.push_str("\nLatest records\n");
            output.push_str(&self.sessions_table(&summary.recent).to_string());
        }
        output
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn session_json(session: &ParkingSession) -> serde_json::Value {
        json!({
            "id": session.id.to_string(),
            "plate": session.plate.as_str(),
            "vehicle_class": session.vehicle_class.as_str(),
            "entry_time": session.entry_time.to_rfc3339(),
            "exit_time": session.exit_time.map(|t| t.to_rfc3339()),
            "billed_hours": session.billed_hours,
            "fee": session.fee,
            "status": session.status.as_str(),
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_sessions(&self, data: &[ParkingSession]) -> String {
        let output = json!({
            "sessions": data.iter().map(Self::session_json).collect::<Vec<_>>(),
        });
        format!("{output:#}")
    }

    fn format_entry(&self, session: &ParkingSession) -> String {
        format!("{:#}", json!({ "entry": Self::session_json(session) }))
    }

    fn format_receipt(&self, receipt: &Receipt) -> String {
        let output = json!({
            "receipt": {
                "plate": receipt.plate.as_str(),
                "vehicle_class": receipt.vehicle_class.as_str(),
                "entry_time": receipt.entry_time.to_rfc3339(),
                "exit_time": receipt.exit_time.to_rfc3339(),
                "duration": receipt.duration,
                "billed_hours": receipt.billed_hours,
                "rate": receipt.rate,
                "fee": receipt.fee,
            }
        });
        format!("{output:#}")
    }

    fn format_deleted(&self, session: &ParkingSession) -> String {
        format!("{:#}", json!({ "deleted": Self::session_json(session) }))
    }

    fn format_report(&self, group_by: GroupBy, data: &[ReportRow], totals: &Totals) -> String {
        let output = json!({
            "grouping": group_by.to_string(),
            "rows": data.iter().map(|r| json!({
                "period": r.key.to_string(),
                "label": r.key.label(),
                "vehicle_count": r.vehicle_count,
                "total_revenue": r.total_revenue,
            })).collect::<Vec<_>>(),
            "totals": {
                "vehicle_count": totals.vehicle_count,
                "total_revenue": totals.total_revenue,
            }
        });
        format!("{output:#}")
    }

    fn format_summary(&self, summary: &DashboardSummary) -> String {
        let output = json!({
            "total_records": summary.total_records,
            "currently_parked": summary.currently_parked,
            "total_revenue": summary.total_revenue,
            "recent": summary.recent.iter().map(Self::session_json).collect::<Vec<_>>(),
        });
        format!("{output:#}")
    }
}

/// Get the appropriate formatter based on output preference
pub fn get_formatter(json: bool, tz: Tz) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(tz))
    }
}

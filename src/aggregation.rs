//! Aggregation module for revenue reports
//!
//! Groups closed parking sessions into daily, ISO-weekly or monthly buckets
//! keyed by their exit time, counting vehicles and summing fees. Active
//! sessions never contribute to a report.
//!
//! # Examples
//!
//! ```
//! use parkledger::aggregation::Aggregator;
//! use parkledger_core::aggregation_types::GroupBy;
//! use parkledger_core::timezone::TimezoneConfig;
//!
//! let aggregator = Aggregator::new(TimezoneConfig::new(chrono_tz::Asia::Jakarta));
//! let rows = aggregator.aggregate(&[], GroupBy::Day);
//! assert!(rows.is_empty());
//! ```

use crate::filters::SessionFilter;
use parkledger_core::ParkingSession;
use parkledger_core::aggregation_types::{GroupBy, ReportKey, ReportRow};
use parkledger_core::timezone::TimezoneConfig;
use std::collections::BTreeMap;
use tracing::debug;

/// Running count and revenue for one bucket
#[derive(Debug, Default)]
struct BucketAccumulator {
    vehicle_count: u64,
    total_revenue: u64,
}

impl BucketAccumulator {
    fn add_session(&mut self, session: &ParkingSession) {
        self.vehicle_count += 1;
        self.total_revenue = self.total_revenue.saturating_add(session.fee);
    }

    fn into_row(self, key: ReportKey) -> ReportRow {
        ReportRow {
            key,
            vehicle_count: self.vehicle_count,
            total_revenue: self.total_revenue,
        }
    }
}

/// Builds revenue reports from closed sessions
pub struct Aggregator {
    timezone_config: TimezoneConfig,
}

impl Aggregator {
    /// Create a new Aggregator grouping in the given timezone
    pub fn new(timezone_config: TimezoneConfig) -> Self {
        Self { timezone_config }
    }

    /// Group closed sessions by period of their exit time
    ///
    /// Rows come back sorted by key, oldest first.
    pub fn aggregate(&self, sessions: &[ParkingSession], group_by: GroupBy) -> Vec<ReportRow> {
        let mut buckets: BTreeMap<ReportKey, BucketAccumulator> = BTreeMap::new();

        for session in sessions.iter().filter(|s| !s.is_active()) {
            let Some(exit) = session.exit_time else {
                continue;
            };
            let date = self.timezone_config.convert(&exit).date_naive();
            buckets
                .entry(ReportKey::for_date(group_by, date))
                .or_default()
                .add_session(session);
        }

        debug!(
            "Aggregated {} sessions into {} {} buckets",
            sessions.len(),
            buckets.len(),
            group_by
        );

        buckets
            .into_iter()
            .map(|(key, acc)| acc.into_row(key))
            .collect()
    }

    /// Like [`Aggregator::aggregate`], restricted to sessions matching `filter`
    pub fn aggregate_filtered(
        &self,
        sessions: &[ParkingSession],
        group_by: GroupBy,
        filter: &SessionFilter,
    ) -> Vec<ReportRow> {
        let selected: Vec<ParkingSession> = sessions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        self.aggregate(&selected, group_by)
    }
}

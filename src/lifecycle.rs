//! Parking session lifecycle
//!
//! [`SessionManager`] enforces the entry → active → closed state machine on
//! top of a [`SessionStore`]. Every mutating operation loads the full
//! ledger, applies one change in memory and writes the full ledger back
//! while holding the manager's lock, so concurrent callers are serialized.
//!
//! # Examples
//!
//! ```
//! use parkledger::lifecycle::SessionManager;
//! use parkledger_core::VehicleClass;
//! use parkledger_pricing::RateTable;
//! use parkledger_store::MemorySessionStore;
//! use chrono::DateTime;
//!
//! let manager = SessionManager::new(MemorySessionStore::new());
//! let entry = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+07:00").unwrap();
//! let exit = DateTime::parse_from_rfc3339("2024-01-01T11:20:00+07:00").unwrap();
//!
//! manager.record_entry(" b 1234 cd ", VehicleClass::Car, entry)?;
//! let (session, receipt) = manager.record_exit("B 1234 CD", exit, &RateTable::default())?;
//!
//! assert_eq!(session.billed_hours, 2);
//! assert_eq!(receipt.fee, 8000);
//! # Ok::<(), parkledger_core::LedgerError>(())
//! ```

use crate::output::format_number;
use parkledger_core::aggregation_types::DashboardSummary;
use parkledger_core::error::{LedgerError, Result};
use parkledger_core::types::{ParkingSession, Plate, SessionId, Timestamp, VehicleClass};
use parkledger_pricing::{FeeCalculator, RateTable};
use parkledger_store::SessionStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const RECEIPT_RULE: &str = "=========================";
const RECEIPT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Summary handed to the driver when a session closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub plate: Plate,
    pub vehicle_class: VehicleClass,
    pub entry_time: Timestamp,
    pub exit_time: Timestamp,
    /// Time in the lot, e.g. "2 h 10 min"
    pub duration: String,
    pub billed_hours: u32,
    pub rate: u64,
    pub fee: u64,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RECEIPT_RULE}")?;
        writeln!(f, "     PARKING RECEIPT")?;
        writeln!(f, "{RECEIPT_RULE}")?;
        writeln!(f, "Plate         : {}", self.plate)?;
        writeln!(f, "Vehicle class : {}", self.vehicle_class)?;
        writeln!(f)?;
        writeln!(
            f,
            "Entry time    : {}",
            self.entry_time.format(RECEIPT_TIME_FORMAT)
        )?;
        writeln!(
            f,
            "Exit time     : {}",
            self.exit_time.format(RECEIPT_TIME_FORMAT)
        )?;
        writeln!(f, "Duration      : {}", self.duration)?;
        writeln!(f, "Billed hours  : {}", self.billed_hours)?;
        writeln!(f)?;
        writeln!(f, "Rate / hour   : {}", format_number(self.rate))?;
        writeln!(f, "-------------------------")?;
        writeln!(f, "Total due     : {}", format_number(self.fee))?;
        writeln!(f, "{RECEIPT_RULE}")?;
        write!(f, "        THANK YOU")
    }
}

/// Owns the session store and applies lifecycle transitions to it
pub struct SessionManager<S: SessionStore> {
    store: Mutex<S>,
}

impl<S: SessionStore> SessionManager<S> {
    /// Create a manager over `store`
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Give the store back
    pub fn into_inner(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // replace_all is atomic, so a poisoned store is still consistent
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the ledger, apply `change`, and write the ledger back
    ///
    /// Nothing is written when `change` fails.
    fn mutate<T>(&self, change: impl FnOnce(&mut Vec<ParkingSession>) -> Result<T>) -> Result<T> {
        let mut store = self.lock();
        let mut sessions = store.list_all()?;
        let outcome = change(&mut sessions)?;
        store.replace_all(&sessions)?;
        Ok(outcome)
    }

    /// Record a vehicle entering the lot
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for an empty or malformed plate
    /// - [`LedgerError::DuplicateActiveSession`] if the vehicle is already parked
    /// - [`LedgerError::InvalidState`] if `now` precedes the plate's last exit
    pub fn record_entry(
        &self,
        plate: &str,
        vehicle_class: VehicleClass,
        now: Timestamp,
    ) -> Result<ParkingSession> {
        let plate = Plate::parse(plate)?;

        let session = self.mutate(|sessions| {
            if sessions.iter().any(|s| s.plate == plate && s.is_active()) {
                return Err(LedgerError::DuplicateActiveSession {
                    plate: plate.to_string(),
                });
            }
            let last_exit = sessions
                .iter()
                .filter(|s| s.plate == plate)
                .filter_map(|s| s.exit_time)
                .max();
            if let Some(last_exit) = last_exit.filter(|exit| now < *exit) {
                return Err(LedgerError::InvalidState {
                    plate: plate.to_string(),
                    reason: format!("entry at {now} precedes its last exit at {last_exit}"),
                });
            }
            let session = ParkingSession::open(plate.clone(), vehicle_class, now);
            sessions.push(session.clone());
            Ok(session)
        })?;

        info!(
            "Recorded entry of {} ({}) at {}",
            session.plate, session.vehicle_class, session.entry_time
        );
        Ok(session)
    }

    /// Record a parked vehicle leaving and bill it
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if the plate has no active session
    /// - [`LedgerError::InvalidDuration`] if `now` precedes the entry time
    pub fn record_exit(
        &self,
        plate: &str,
        now: Timestamp,
        rates: &RateTable,
    ) -> Result<(ParkingSession, Receipt)> {
        let plate = Plate::parse(plate)?;

        let (session, receipt) = self.mutate(|sessions| {
            let session = sessions
                .iter_mut()
                .find(|s| s.plate == plate && s.is_active())
                .ok_or_else(|| LedgerError::NotFound {
                    kind: "active",
                    target: plate.to_string(),
                })?;

            let quote =
                FeeCalculator::compute_fee(session.entry_time, now, session.vehicle_class, rates)?;
            session.close(now, quote.billed_hours, quote.fee)?;

            let receipt = Receipt {
                plate: session.plate.clone(),
                vehicle_class: session.vehicle_class,
                entry_time: session.entry_time,
                exit_time: session.exit_time.unwrap_or(now),
                duration: FeeCalculator::format_duration(quote.elapsed()),
                billed_hours: quote.billed_hours,
                rate: quote.rate,
                fee: quote.fee,
            };
            Ok((session.clone(), receipt))
        })?;

        info!(
            "Recorded exit of {} after {}: {} hour(s), fee {}",
            session.plate, receipt.duration, session.billed_hours, session.fee
        );
        Ok((session, receipt))
    }

    /// Delete the most recent record for a plate
    ///
    /// Older closed records for the same plate are left alone; use
    /// [`SessionManager::delete_session_by_id`] to target one of them.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if the plate has no records
    /// - [`LedgerError::InvalidState`] if the most recent record is still active
    pub fn delete_session(&self, plate: &str) -> Result<ParkingSession> {
        let plate = Plate::parse(plate)?;

        self.delete_where(plate.to_string(), |sessions| {
            sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| s.plate == plate)
                .max_by_key(|(index, s)| (s.entry_time, *index))
                .map(|(index, _)| index)
        })
    }

    /// Delete one closed record by its identifier
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if no record has this id
    /// - [`LedgerError::InvalidState`] if the record is still active
    pub fn delete_session_by_id(&self, id: SessionId) -> Result<ParkingSession> {
        self.delete_where(id.to_string(), |sessions| {
            sessions.iter().position(|s| s.id == id)
        })
    }

    fn delete_where(
        &self,
        target: String,
        select: impl FnOnce(&[ParkingSession]) -> Option<usize>,
    ) -> Result<ParkingSession> {
        let removed = self.mutate(|sessions| {
            let index = select(sessions.as_slice()).ok_or_else(|| LedgerError::NotFound {
                kind: "recorded",
                target: target.clone(),
            })?;
            if sessions[index].is_active() {
                return Err(LedgerError::InvalidState {
                    plate: sessions[index].plate.to_string(),
                    reason: "vehicle is still parked; record its exit before deleting".to_string(),
                });
            }
            Ok(sessions.remove(index))
        })?;

        info!("Deleted session {} for {}", removed.id, removed.plate);
        Ok(removed)
    }

    /// Every session in the ledger, in insertion order
    pub fn list_all(&self) -> Result<Vec<ParkingSession>> {
        self.lock().list_all()
    }

    /// Sessions of vehicles currently parked
    pub fn active_sessions(&self) -> Result<Vec<ParkingSession>> {
        let mut sessions = self.list_all()?;
        sessions.retain(ParkingSession::is_active);
        Ok(sessions)
    }

    /// Counts, revenue and the `recent` newest records
    pub fn summary(&self, recent: usize) -> Result<DashboardSummary> {
        let sessions = self.list_all()?;
        let currently_parked = sessions.iter().filter(|s| s.is_active()).count();
        let total_revenue = sessions
            .iter()
            .filter(|s| !s.is_active())
            .fold(0u64, |acc, s| acc.saturating_add(s.fee));
        let skip = sessions.len().saturating_sub(recent);

        debug!(
            "Summary: {} records, {} parked, revenue {}",
            sessions.len(),
            currently_parked,
            total_revenue
        );

        Ok(DashboardSummary {
            total_records: sessions.len(),
            currently_parked,
            total_revenue,
            recent: sessions[skip..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use parkledger_core::SessionStatus;
    use parkledger_store::MemorySessionStore;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn manager() -> SessionManager<MemorySessionStore> {
        SessionManager::new(MemorySessionStore::new())
    }

    /// Store whose writes always fail, to check nothing is half-applied
    struct ReadOnlyStore(MemorySessionStore);

    impl SessionStore for ReadOnlyStore {
        fn list_all(&self) -> Result<Vec<ParkingSession>> {
            self.0.list_all()
        }

        fn replace_all(&mut self, _sessions: &[ParkingSession]) -> Result<()> {
            Err(LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only ledger",
            )))
        }
    }

    #[test]
    fn test_entry_normalizes_plate() {
        let m = manager();
        let session = m
            .record_entry("  b 1234 cd ", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();
        assert_eq!(session.plate.as_str(), "B 1234 CD");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(m.list_all().unwrap(), vec![session]);
    }

    #[test]
    fn test_entry_rejects_empty_plate() {
        let m = manager();
        let err = m
            .record_entry("   ", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(m.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let m = manager();
        let now = ts("2024-01-01T10:00:00+07:00");
        m.record_entry("B 1", VehicleClass::Car, now).unwrap();

        let err = m.record_entry("b 1", VehicleClass::Motorcycle, now).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateActiveSession { .. }));
        assert_eq!(m.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_reentry_after_exit_allowed() {
        let m = manager();
        let rates = RateTable::default();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();
        m.record_exit("B 1", ts("2024-01-01T11:00:00+07:00"), &rates)
            .unwrap();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-01T12:00:00+07:00"))
            .unwrap();

        assert_eq!(m.list_all().unwrap().len(), 2);
        assert_eq!(m.active_sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_backdated_reentry_rejected() {
        let m = manager();
        let rates = RateTable::default();
        m.record_entry("A 1", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();
        m.record_exit("A 1", ts("2024-01-01T11:00:00+07:00"), &rates)
            .unwrap();

        let err = m
            .record_entry("A 1", VehicleClass::Car, ts("2024-01-01T09:00:00+07:00"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert!(m.active_sessions().unwrap().is_empty());

        // Re-entry exactly at the last exit is fine, and deleting by plate
        // then refuses because the newest record is the parked vehicle
        m.record_entry("A 1", VehicleClass::Car, ts("2024-01-01T11:00:00+07:00"))
            .unwrap();
        let err = m.delete_session("A 1").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert_eq!(m.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_exit_bills_and_closes() {
        let m = manager();
        m.record_entry("D 9", VehicleClass::Motorcycle, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();

        let (session, receipt) = m
            .record_exit("d 9", ts("2024-01-01T12:30:00+07:00"), &RateTable::default())
            .unwrap();

        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.exit_time, Some(ts("2024-01-01T12:30:00+07:00")));
        assert_eq!(session.billed_hours, 3);
        assert_eq!(session.fee, 6000);
        assert_eq!(receipt.duration, "2 h 30 min");
        assert_eq!(receipt.rate, 2000);
        assert_eq!(m.list_all().unwrap(), vec![session]);
    }

    #[test]
    fn test_exit_without_active_session() {
        let m = manager();
        let err = m
            .record_exit("Z 1", ts("2024-01-01T10:00:00+07:00"), &RateTable::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: "active", .. }));
    }

    #[test]
    fn test_exit_before_entry_rejected_without_mutation() {
        let m = manager();
        let entered = m
            .record_entry("B 1", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();

        let err = m
            .record_exit("B 1", ts("2024-01-01T09:00:00+07:00"), &RateTable::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDuration { .. }));
        assert_eq!(m.list_all().unwrap(), vec![entered]);
    }

    #[test]
    fn test_closed_fee_unaffected_by_rate_change() {
        let m = manager();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();
        m.record_exit("B 1", ts("2024-01-01T11:00:00+07:00"), &RateTable::default())
            .unwrap();

        // A later exit under new rates must not touch the earlier fee
        let raised = RateTable::new(9000, 9000).unwrap();
        m.record_entry("B 2", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();
        m.record_exit("B 2", ts("2024-01-01T11:00:00+07:00"), &raised)
            .unwrap();

        let fees: Vec<_> = m.list_all().unwrap().iter().map(|s| s.fee).collect();
        assert_eq!(fees, [4000, 9000]);
    }

    #[test]
    fn test_delete_active_session_refused() {
        let m = manager();
        let entered = m
            .record_entry("B 1", VehicleClass::Car, ts("2024-01-01T10:00:00+07:00"))
            .unwrap();

        let err = m.delete_session("B 1").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert_eq!(m.list_all().unwrap(), vec![entered.clone()]);

        let err = m.delete_session_by_id(entered.id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn test_delete_unknown_plate() {
        let m = manager();
        let err = m.delete_session("Q 0").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: "recorded", .. }));
    }

    #[test]
    fn test_delete_targets_most_recent_record() {
        let m = manager();
        let rates = RateTable::default();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-01T08:00:00+07:00"))
            .unwrap();
        let (first, _) = m
            .record_exit("B 1", ts("2024-01-01T09:00:00+07:00"), &rates)
            .unwrap();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-02T08:00:00+07:00"))
            .unwrap();
        let (second, _) = m
            .record_exit("B 1", ts("2024-01-02T09:00:00+07:00"), &rates)
            .unwrap();

        let removed = m.delete_session("B 1").unwrap();
        assert_eq!(removed.id, second.id);
        assert_eq!(m.list_all().unwrap(), vec![first]);
    }

    #[test]
    fn test_delete_by_id() {
        let m = manager();
        let rates = RateTable::default();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-01T08:00:00+07:00"))
            .unwrap();
        let (first, _) = m
            .record_exit("B 1", ts("2024-01-01T09:00:00+07:00"), &rates)
            .unwrap();
        m.record_entry("B 1", VehicleClass::Car, ts("2024-01-02T08:00:00+07:00"))
            .unwrap();

        m.delete_session_by_id(first.id).unwrap();
        let remaining = m.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_active());

        let err = m.delete_session_by_id(first.id).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[test]
    fn test_failed_write_leaves_ledger_unchanged() {
        let seeded = SessionManager::new(MemorySessionStore::new());
        seeded
            .record_entry("B 1", VehicleClass::Car, ts("2024-01-01T08:00:00+07:00"))
            .unwrap();
        let before = seeded.list_all().unwrap();

        let m = SessionManager::new(ReadOnlyStore(seeded.into_inner()));
        let err = m
            .record_exit("B 1", ts("2024-01-01T09:00:00+07:00"), &RateTable::default())
            .unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(m.list_all().unwrap(), before);
    }

    #[test]
    fn test_summary() {
        let m = manager();
        let rates = RateTable::default();
        for plate in ["A 1", "A 2", "A 3"] {
            m.record_entry(plate, VehicleClass::Car, ts("2024-01-01T08:00:00+07:00"))
                .unwrap();
        }
        m.record_exit("A 1", ts("2024-01-01T10:30:00+07:00"), &rates)
            .unwrap();

        let summary = m.summary(2).unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.currently_parked, 2);
        assert_eq!(summary.total_revenue, 12000);
        let recent: Vec<_> = summary.recent.iter().map(|s| s.plate.as_str()).collect();
        assert_eq!(recent, ["A 2", "A 3"]);
    }

    #[test]
    fn test_summary_revenue_saturates() {
        let m = manager();
        let rates = RateTable::new(5_000_000_000_000_000_000, 5_000_000_000_000_000_000).unwrap();
        for plate in ["A 1", "A 2", "A 3", "A 4"] {
            m.record_entry(plate, VehicleClass::Car, ts("2024-01-01T08:00:00+07:00"))
                .unwrap();
            m.record_exit(plate, ts("2024-01-01T08:30:00+07:00"), &rates)
                .unwrap();
        }

        let summary = m.summary(0).unwrap();
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.total_revenue, u64::MAX);
        assert!(summary.recent.is_empty());
    }

    #[test]
    fn test_receipt_rendering() {
        let receipt = Receipt {
            plate: Plate::parse("B 1234 CD").unwrap(),
            vehicle_class: VehicleClass::Car,
            entry_time: ts("2024-01-01T10:00:00+07:00"),
            exit_time: ts("2024-01-01T12:10:00+07:00"),
            duration: "2 h 10 min".to_string(),
            billed_hours: 3,
            rate: 4000,
            fee: 12000,
        };
        let text = receipt.to_string();
        assert!(text.contains("Plate         : B 1234 CD"));
        assert!(text.contains("Entry time    : 2024-01-01 10:00:00"));
        assert!(text.contains("Duration      : 2 h 10 min"));
        assert!(text.contains("Total due     : 12,000"));
    }
}

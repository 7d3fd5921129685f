//! Common test utilities and helpers for parkledger tests
//!
//! Provides a session builder, timestamp helpers and a throwaway SQLite
//! ledger so integration tests exercise the real storage path.

use chrono::{DateTime, Duration};
use parkledger::lifecycle::SessionManager;
use parkledger_core::{ParkingSession, Plate, Timestamp, VehicleClass};
use parkledger_store::SqliteSessionStore;
use tempfile::TempDir;

/// Plates used across tests
#[allow(dead_code)]
pub const TEST_PLATES: &[&str] = &["B 1234 CD", "D 55 XY", "AB 7 Q", "L 900 ZZ"];

/// Parse an RFC 3339 timestamp, panicking on malformed fixtures
pub fn ts(s: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(s).unwrap()
}

/// Builder for creating test ParkingSession instances
#[allow(dead_code)]
pub struct SessionBuilder {
    plate: String,
    vehicle_class: VehicleClass,
    entry_time: Timestamp,
    exit: Option<(Timestamp, u32, u64)>,
}

#[allow(dead_code)]
impl SessionBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            plate: TEST_PLATES[0].to_string(),
            vehicle_class: VehicleClass::Car,
            entry_time: ts("2024-01-01T08:00:00+07:00"),
            exit: None,
        }
    }

    pub fn plate(mut self, plate: &str) -> Self {
        self.plate = plate.to_string();
        self
    }

    pub fn class(mut self, vehicle_class: VehicleClass) -> Self {
        self.vehicle_class = vehicle_class;
        self
    }

    pub fn entry(mut self, entry: &str) -> Self {
        self.entry_time = ts(entry);
        self
    }

    /// Close the session at `exit` with an explicit bill
    pub fn closed(mut self, exit: &str, billed_hours: u32, fee: u64) -> Self {
        self.exit = Some((ts(exit), billed_hours, fee));
        self
    }

    pub fn build(self) -> ParkingSession {
        let mut session = ParkingSession::open(
            Plate::parse(&self.plate).unwrap(),
            self.vehicle_class,
            self.entry_time,
        );
        if let Some((exit, hours, fee)) = self.exit {
            session.close(exit, hours, fee).unwrap();
        }
        session
    }
}

/// A ledger backed by a SQLite file inside a temporary directory
///
/// Keep the returned `TempDir` alive for as long as the manager is used.
#[allow(dead_code)]
pub fn temp_ledger() -> (TempDir, SessionManager<SqliteSessionStore>) {
    let dir = TempDir::new().unwrap();
    let store = SqliteSessionStore::open(dir.path().join("ledger.db")).unwrap();
    (dir, SessionManager::new(store))
}

/// Timestamp `minutes` after `base`
#[allow(dead_code)]
pub fn after(base: Timestamp, minutes: i64) -> Timestamp {
    base + Duration::minutes(minutes)
}

//! Core domain types for parkledger
//!
//! This module contains the parking session entity and the strongly-typed
//! values it is built from: normalized plates, record identifiers, vehicle
//! classes and lifecycle status.

use chrono::{DateTime, Duration, FixedOffset, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Wall-clock instant with the UTC offset that was in effect when it was recorded
pub type Timestamp = DateTime<FixedOffset>;

/// Normalized vehicle registration plate
///
/// Plates are trimmed and uppercased on construction, so `" b 1234 cd "`
/// and `"B 1234 CD"` refer to the same vehicle.
///
/// # Examples
/// ```
/// use parkledger_core::types::Plate;
///
/// let plate = Plate::parse("  b 1234 cd ").unwrap();
/// assert_eq!(plate.as_str(), "B 1234 CD");
/// assert!(Plate::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    /// Normalize and validate a raw plate string
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(LedgerError::Validation(
                "vehicle plate must not be empty".to_string(),
            ));
        }
        if normalized.chars().any(char::is_control) {
            return Err(LedgerError::Validation(format!(
                "vehicle plate {normalized:?} contains control characters"
            )));
        }
        Ok(Self(normalized))
    }

    /// Get the normalized plate text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Plate {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}

/// Unique identifier of a single parking record
///
/// Several closed records may share a plate, so deletion and lookups that
/// must hit exactly one row go through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| LedgerError::Validation(format!("invalid session id '{s}': {e}")))
    }
}

/// Class of vehicle, which selects the hourly rate
///
/// # Examples
/// ```
/// use parkledger_core::types::VehicleClass;
/// use std::str::FromStr;
///
/// assert_eq!(VehicleClass::from_str("car").unwrap(), VehicleClass::Car);
/// assert_eq!(VehicleClass::Motorcycle.to_string(), "Motorcycle");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleClass {
    Motorcycle,
    Car,
}

impl VehicleClass {
    /// Name used in the persisted table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motorcycle => "Motorcycle",
            Self::Car => "Car",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "motorcycle" | "motorbike" | "motor" => Ok(Self::Motorcycle),
            "car" => Ok(Self::Car),
            _ => Err(format!(
                "Invalid vehicle class: {s} (expected 'motorcycle' or 'car')"
            )),
        }
    }
}

/// Lifecycle state of a parking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Vehicle is still parked
    Active,
    /// Vehicle has left and the fee is final
    Closed,
}

impl SessionStatus {
    /// Name used in the persisted table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Closed" => Ok(Self::Closed),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

/// A single vehicle's parking visit
///
/// Created active on entry, closed exactly once on exit. Only the exit
/// fields and status ever change after creation.
///
/// # Examples
/// ```
/// use parkledger_core::types::{ParkingSession, Plate, SessionStatus, VehicleClass};
/// use chrono::DateTime;
///
/// let entry = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+07:00").unwrap();
/// let session = ParkingSession::open(Plate::parse("b 1 xy").unwrap(), VehicleClass::Car, entry);
///
/// assert_eq!(session.status, SessionStatus::Active);
/// assert_eq!(session.fee, 0);
/// assert!(session.exit_time.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSession {
    /// Record identifier
    pub id: SessionId,
    /// Normalized plate
    pub plate: Plate,
    /// Vehicle class
    pub vehicle_class: VehicleClass,
    /// Entry instant, second precision
    pub entry_time: Timestamp,
    /// Exit instant, set only once closed
    pub exit_time: Option<Timestamp>,
    /// Hours billed, 0 while active
    pub billed_hours: u32,
    /// Fee in the smallest currency unit, 0 while active
    pub fee: u64,
    /// Lifecycle state
    pub status: SessionStatus,
}

impl ParkingSession {
    /// Start a new active session at `entry_time` (sub-second part dropped)
    pub fn open(plate: Plate, vehicle_class: VehicleClass, entry_time: Timestamp) -> Self {
        Self {
            id: SessionId::generate(),
            plate,
            vehicle_class,
            entry_time: entry_time.trunc_subsecs(0),
            exit_time: None,
            billed_hours: 0,
            fee: 0,
            status: SessionStatus::Active,
        }
    }

    /// Whether the vehicle is still parked
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Transition to closed with the final billing figures
    ///
    /// Fails with [`LedgerError::InvalidState`] if the session is already closed.
    pub fn close(&mut self, exit_time: Timestamp, billed_hours: u32, fee: u64) -> Result<()> {
        if !self.is_active() {
            return Err(LedgerError::InvalidState {
                plate: self.plate.to_string(),
                reason: "session is already closed".to_string(),
            });
        }
        self.exit_time = Some(exit_time.trunc_subsecs(0));
        self.billed_hours = billed_hours;
        self.fee = fee;
        self.status = SessionStatus::Closed;
        Ok(())
    }

    /// Time spent in the lot, available once closed
    pub fn elapsed(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }

    /// Check the status-dependent field invariants
    ///
    /// Used when reading records back from storage, where a hand-edited or
    /// truncated row could otherwise slip into the working set.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match (self.status, self.exit_time) {
            (SessionStatus::Active, Some(_)) => Err("active session has an exit time".to_string()),
            (SessionStatus::Active, None) if self.billed_hours != 0 || self.fee != 0 => {
                Err("active session carries billing figures".to_string())
            }
            (SessionStatus::Closed, None) => Err("closed session has no exit time".to_string()),
            (SessionStatus::Closed, Some(_)) if self.billed_hours == 0 => {
                Err("closed session billed zero hours".to_string())
            }
            (SessionStatus::Closed, Some(exit)) if exit < self.entry_time => {
                Err("exit time precedes entry time".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_plate_normalization() {
        assert_eq!(Plate::parse(" ab 12 ").unwrap().as_str(), "AB 12");
        assert!(matches!(Plate::parse(""), Err(LedgerError::Validation(_))));
        assert!(matches!(Plate::parse("\t \n"), Err(LedgerError::Validation(_))));
        assert!(matches!(Plate::parse("AB\u{7}12"), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_plate_deserialize_normalizes() {
        let plate: Plate = serde_json::from_str("\" d 55 \"").unwrap();
        assert_eq!(plate.as_str(), "D 55");
        assert!(serde_json::from_str::<Plate>("\"  \"").is_err());
    }

    #[test]
    fn test_vehicle_class_parsing() {
        assert_eq!("Motorcycle".parse::<VehicleClass>().unwrap(), VehicleClass::Motorcycle);
        assert_eq!("CAR".parse::<VehicleClass>().unwrap(), VehicleClass::Car);
        assert!("truck".parse::<VehicleClass>().is_err());
    }

    #[test]
    fn test_session_status_round_trip() {
        for status in [SessionStatus::Active, SessionStatus::Closed] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!("Masuk".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_open_truncates_subseconds() {
        let entry = ts("2024-01-01T10:00:00.750+07:00");
        let session = ParkingSession::open(Plate::parse("x1").unwrap(), VehicleClass::Car, entry);
        assert_eq!(session.entry_time, ts("2024-01-01T10:00:00+07:00"));
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_close_only_once() {
        let mut session = ParkingSession::open(
            Plate::parse("x1").unwrap(),
            VehicleClass::Car,
            ts("2024-01-01T10:00:00+07:00"),
        );
        session.close(ts("2024-01-01T12:30:00+07:00"), 3, 12000).unwrap();
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.elapsed(), Some(Duration::minutes(150)));
        assert!(session.validate().is_ok());

        let err = session.close(ts("2024-01-01T13:00:00+07:00"), 4, 16000);
        assert!(matches!(err, Err(LedgerError::InvalidState { .. })));
        assert_eq!(session.fee, 12000);
    }

    #[test]
    fn test_validate_rejects_inconsistent_rows() {
        let mut session = ParkingSession::open(
            Plate::parse("x1").unwrap(),
            VehicleClass::Motorcycle,
            ts("2024-01-01T10:00:00+07:00"),
        );
        session.status = SessionStatus::Closed;
        assert!(session.validate().is_err());

        session.exit_time = Some(ts("2024-01-01T11:00:00+07:00"));
        session.billed_hours = 0;
        assert!(session.validate().is_err());
    }
}

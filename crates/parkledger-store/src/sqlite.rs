//! SQLite-backed session store
//!
//! Sessions live in a single `parking_sessions` table. Timestamps are stored
//! as RFC 3339 text with second precision and an explicit offset; an active
//! session has an empty `exit_time`.

use crate::SessionStore;
use chrono::{DateTime, SecondsFormat};
use parkledger_core::error::{LedgerError, Result};
use parkledger_core::types::{ParkingSession, Plate, SessionId, SessionStatus, Timestamp};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS parking_sessions (
    id TEXT PRIMARY KEY,
    plate TEXT NOT NULL,
    vehicle_class TEXT NOT NULL,
    entry_time TEXT NOT NULL,
    exit_time TEXT NOT NULL DEFAULT '',
    billed_hours INTEGER NOT NULL DEFAULT 0,
    fee INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL
)";

const SELECT_ALL_SQL: &str = "SELECT id, plate, vehicle_class, entry_time, exit_time,
        billed_hours, fee, status
 FROM parking_sessions
 ORDER BY rowid ASC";

const INSERT_SQL: &str = "INSERT INTO parking_sessions (
    id, plate, vehicle_class, entry_time, exit_time, billed_hours, fee, status
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Session store persisted to a local SQLite database
pub struct SqliteSessionStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        info!("Opened parking ledger at {}", path.display());
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute(CREATE_TABLE_SQL, [])?;
        Ok(Self { conn, path })
    }

    /// Location of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SessionStore for SqliteSessionStore {
    fn list_all(&self) -> Result<Vec<ParkingSession>> {
        let mut stmt = self.conn.prepare_cached(SELECT_ALL_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                plate: row.get(1)?,
                vehicle_class: row.get(2)?,
                entry_time: row.get(3)?,
                exit_time: row.get(4)?,
                billed_hours: row.get(5)?,
                fee: row.get(6)?,
                status: row.get(7)?,
            })
        })?;

        let mut sessions = Vec::new();
        for (index, raw) in rows.enumerate() {
            let session = raw?.into_session().map_err(|error| LedgerError::CorruptRecord {
                row: index + 1,
                error,
            })?;
            sessions.push(session);
        }

        debug!("Loaded {} parking sessions", sessions.len());
        Ok(sessions)
    }

    fn replace_all(&mut self, sessions: &[ParkingSession]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM parking_sessions", [])?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for session in sessions {
                let fee = i64::try_from(session.fee).map_err(|_| {
                    LedgerError::Validation(format!(
                        "fee {} for {} exceeds storable range",
                        session.fee, session.plate
                    ))
                })?;
                stmt.execute(params![
                    session.id.to_string(),
                    session.plate.as_str(),
                    session.vehicle_class.as_str(),
                    format_timestamp(&session.entry_time),
                    session.exit_time.as_ref().map(format_timestamp).unwrap_or_default(),
                    session.billed_hours,
                    fee,
                    session.status.as_str(),
                ])?;
            }
        }
        // Dropping `tx` without commit rolls back, leaving prior rows intact
        tx.commit()?;

        debug!("Replaced ledger contents with {} sessions", sessions.len());
        Ok(())
    }
}

fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn parse_timestamp(field: &str, value: &str) -> std::result::Result<Timestamp, String> {
    DateTime::parse_from_rfc3339(value).map_err(|e| format!("invalid {field} '{value}': {e}"))
}

/// Column values exactly as stored, before domain validation
struct RawRow {
    id: String,
    plate: String,
    vehicle_class: String,
    entry_time: String,
    exit_time: String,
    billed_hours: i64,
    fee: i64,
    status: String,
}

impl RawRow {
    fn into_session(self) -> std::result::Result<ParkingSession, String> {
        let exit_time = if self.exit_time.trim().is_empty() {
            None
        } else {
            Some(parse_timestamp("exit_time", &self.exit_time)?)
        };

        let session = ParkingSession {
            id: self.id.parse::<SessionId>().map_err(|e| e.to_string())?,
            plate: Plate::parse(&self.plate).map_err(|e| e.to_string())?,
            vehicle_class: self.vehicle_class.parse()?,
            entry_time: parse_timestamp("entry_time", &self.entry_time)?,
            exit_time,
            billed_hours: u32::try_from(self.billed_hours)
                .map_err(|_| format!("invalid billed_hours {}", self.billed_hours))?,
            fee: u64::try_from(self.fee).map_err(|_| format!("invalid fee {}", self.fee))?,
            status: self.status.parse::<SessionStatus>()?,
        };
        session.validate()?;
        Ok(session)
    }
}

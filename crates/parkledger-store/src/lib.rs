//! Session persistence for parkledger
//!
//! The ledger is always read and written as a whole: callers load every
//! session with [`SessionStore::list_all`], change one record in memory and
//! hand the full set back to [`SessionStore::replace_all`]. Implementations
//! must make that overwrite atomic.

pub mod memory;
pub mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use parkledger_core::{ParkingSession, Result};

/// Durable storage for the full set of parking sessions
pub trait SessionStore: Send {
    /// Every stored session, in insertion order
    fn list_all(&self) -> Result<Vec<ParkingSession>>;

    /// Atomically overwrite the stored set with `sessions`
    ///
    /// On error the previous contents must remain intact.
    fn replace_all(&mut self, sessions: &[ParkingSession]) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn list_all(&self) -> Result<Vec<ParkingSession>> {
        (**self).list_all()
    }

    fn replace_all(&mut self, sessions: &[ParkingSession]) -> Result<()> {
        (**self).replace_all(sessions)
    }
}

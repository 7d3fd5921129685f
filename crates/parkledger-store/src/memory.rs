//! In-memory session store

use crate::SessionStore;
use parkledger_core::{ParkingSession, Result};

/// Vector-backed store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Vec<ParkingSession>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn list_all(&self) -> Result<Vec<ParkingSession>> {
        Ok(self.sessions.clone())
    }

    fn replace_all(&mut self, sessions: &[ParkingSession]) -> Result<()> {
        self.sessions = sessions.to_vec();
        Ok(())
    }
}

//! Hourly rates per vehicle class
//!
//! Rates are configuration, not ledger state: they are supplied by the
//! caller on every exit and never written next to a session.

use parkledger_core::error::{LedgerError, Result};
use parkledger_core::types::VehicleClass;
use serde::{Deserialize, Serialize};

/// Default hourly rate for motorcycles, in the smallest currency unit
pub const DEFAULT_MOTORCYCLE_RATE: u64 = 2000;
/// Default hourly rate for cars, in the smallest currency unit
pub const DEFAULT_CAR_RATE: u64 = 4000;

/// Mapping from vehicle class to a positive rate per started hour
///
/// # Examples
/// ```
/// use parkledger_pricing::RateTable;
/// use parkledger_core::types::VehicleClass;
///
/// let rates = RateTable::new(2500, 5000).unwrap();
/// assert_eq!(rates.rate_for(VehicleClass::Car), 5000);
/// assert!(RateTable::new(0, 5000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    motorcycle: u64,
    car: u64,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            motorcycle: DEFAULT_MOTORCYCLE_RATE,
            car: DEFAULT_CAR_RATE,
        }
    }
}

impl RateTable {
    /// Build a rate table; both rates must be positive
    pub fn new(motorcycle: u64, car: u64) -> Result<Self> {
        Self::default()
            .with_rate(VehicleClass::Motorcycle, motorcycle)?
            .with_rate(VehicleClass::Car, car)
    }

    /// Replace the rate of one class
    pub fn with_rate(mut self, class: VehicleClass, rate: u64) -> Result<Self> {
        if rate == 0 {
            return Err(LedgerError::Config(format!(
                "hourly rate for {class} must be positive"
            )));
        }
        match class {
            VehicleClass::Motorcycle => self.motorcycle = rate,
            VehicleClass::Car => self.car = rate,
        }
        Ok(self)
    }

    /// Rate per hour for a vehicle class
    pub fn rate_for(&self, class: VehicleClass) -> u64 {
        match class {
            VehicleClass::Motorcycle => self.motorcycle,
            VehicleClass::Car => self.car,
        }
    }
}

//! Timezone utilities for timestamps and report grouping
//!
//! Every recorded timestamp carries an explicit offset taken from the
//! configured zone; nothing relies on the process-wide local time setting
//! once a [`TimezoneConfig`] has been resolved.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

use crate::types::Timestamp;

/// Configuration for timezone handling
#[derive(Debug, Clone)]
pub struct TimezoneConfig {
    /// The timezone to use for recording and grouping
    pub tz: Tz,
    /// Whether the timezone is UTC
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self::new(get_local_timezone())
    }
}

impl TimezoneConfig {
    /// Wrap an explicit zone
    pub fn new(tz: Tz) -> Self {
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }

    /// Create a new timezone configuration from CLI arguments
    pub fn from_cli(timezone_str: Option<&str>, use_utc: bool) -> crate::error::Result<Self> {
        if use_utc {
            return Ok(Self::new(Tz::UTC));
        }

        if let Some(tz_str) = timezone_str {
            let tz = Tz::from_str(tz_str).map_err(|_| {
                crate::error::LedgerError::InvalidTimezone(format!(
                    "'{}'. Use format like 'Asia/Jakarta', 'Europe/Berlin', or 'UTC'",
                    tz_str
                ))
            })?;
            Ok(Self::new(tz))
        } else {
            Ok(Self::default())
        }
    }

    /// Get the display name for the configured timezone
    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }

    /// Current instant in the configured zone, with its offset pinned
    pub fn now(&self) -> Timestamp {
        self.localize(Utc::now())
    }

    /// Express a UTC instant in the configured zone
    pub fn localize(&self, instant: DateTime<Utc>) -> Timestamp {
        instant.with_timezone(&self.tz).fixed_offset()
    }

    /// Re-express a recorded timestamp in the configured zone
    pub fn convert(&self, ts: &Timestamp) -> DateTime<Tz> {
        ts.with_timezone(&self.tz)
    }
}

/// Detect the system's local timezone
///
/// Checks the `TZ` environment variable first, then asks the OS through
/// `iana-time-zone`, and falls back to UTC.
pub fn get_local_timezone() -> Tz {
    #[allow(clippy::collapsible_if)]
    if let Ok(tz_str) = std::env::var("TZ") {
        if let Ok(tz) = Tz::from_str(&tz_str) {
            debug!("Using timezone from TZ environment variable: {}", tz_str);
            return tz;
        }
    }

    match iana_time_zone::get_timezone() {
        Ok(tz_str) => match Tz::from_str(&tz_str) {
            Ok(tz) => {
                debug!("Using system timezone from iana-time-zone: {}", tz_str);
                tz
            }
            Err(_) => {
                debug!(
                    "Could not parse timezone from iana-time-zone: '{}', falling back to UTC",
                    tz_str
                );
                Tz::UTC
            }
        },
        Err(e) => {
            debug!(
                "Could not detect local timezone via iana-time-zone: {:?}, falling back to UTC",
                e
            );
            Tz::UTC
        }
    }
}

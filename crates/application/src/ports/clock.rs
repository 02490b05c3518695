//! Clock port for time-related operations

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Port for getting the current wall-clock time.
///
/// Server timestamps such as code expiry are wall-clock instants; this port
/// converts them into local durations and lets tests pin "now".
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Time left until `instant`, zero if it already passed.
    fn until(&self, instant: DateTime<Utc>) -> Duration {
        (instant - self.now()).to_std().unwrap_or(Duration::ZERO)
    }
}

//! Wire timestamp helpers (RFC 3339 UTC).

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use std::time::Duration;

/// Current time as an RFC 3339 UTC string.
pub fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Deadline `timeout` from now as an RFC 3339 UTC string.
pub fn deadline_after(timeout: Duration) -> String {
    let delta = ChronoDuration::from_std(timeout).unwrap_or_else(|_| ChronoDuration::seconds(30));
    (Utc::now() + delta).to_rfc3339_opts(SecondsFormat::Micros, true)
}

//! Default-value factories commonly attached to fields.

use chrono::Utc;
use uuid::Uuid;

/// Time-ordered unique id: 15 digits of epoch millis, a random uuid4 hex
/// and a `000` suffix (50 characters total).
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Current time as fractional seconds since the epoch.
/// Stored as a float to sidestep time zone conversion.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

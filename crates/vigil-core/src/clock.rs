//! Timestamps are stored with microsecond precision, so every instant that
//! enters the system is truncated to that precision first.

use jiff::Timestamp;

/// The current instant, truncated to whole microseconds.
pub fn now() -> Timestamp {
    truncate(Timestamp::now())
}

/// Drop sub-microsecond precision from `ts`.
pub fn truncate(ts: Timestamp) -> Timestamp {
    Timestamp::from_microsecond(ts.as_microsecond()).unwrap_or(ts)
}

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch. The world task samples this once per
/// tick and threads the value through every system, so a whole tick observes
/// a single consistent timestamp.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

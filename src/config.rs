use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const EFFECT_BROADCAST_CAPACITY: usize = 256;

// Fixed simulation cadence: 30 Hz.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 30);

pub fn http_port() -> u16 {
    env::var("WORLD_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

/// Location of the authored map file, loaded at startup and written on an
/// explicit save request.
pub fn map_path() -> PathBuf {
    env::var("WORLD_MAP_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("maps/map.json"))
}

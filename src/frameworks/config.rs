use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn port() -> u16 {
    env::var("ARENA_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50001)
}

/// Host address to dial, `host:port`. Set, the process runs as a client;
/// unset, it hosts on [`port`].
pub fn connect_address() -> Option<String> {
    env::var("ARENA_CONNECT").ok().filter(|v| !v.is_empty())
}

/// Start a run immediately instead of waiting for a start request.
pub fn autostart() -> bool {
    matches!(
        env::var("ARENA_AUTOSTART").as_deref(),
        Ok("1") | Ok("true")
    )
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// 100 Hz fixed tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Remote connections a host accepts; slot 0 stays with the host.
pub const MAX_REMOTE_PEERS: usize = 3;

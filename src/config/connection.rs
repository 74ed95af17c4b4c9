/// Connection configuration constants.
pub const RECONNECT_BACKOFF_SECS: u64 = 3; // Fixed pause between two connection attempts.

/// Maximum number of reconnection attempts before giving up.
/// `None` retries until the user navigates away.
pub const MAX_RECONNECT_ATTEMPTS: Option<u32> = None;

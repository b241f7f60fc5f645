use chrono::Utc;
use tokio::time::Instant;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiry for a credential living `lifetime_seconds` from now.
pub fn expires_at_millis(lifetime_seconds: i64) -> i64 {
    now_millis().saturating_add(lifetime_seconds.saturating_mul(1000))
}

pub fn get_instant() -> Instant {
    Instant::now()
}

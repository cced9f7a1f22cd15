use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A fixed-window request counter. The bucket is "<client>:<endpoint>";
/// the window starts on first insert and resets once `expires_at` passes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RateLimitCounter {
    pub bucket: String,
    pub count: i64,
    pub expires_at: DateTime<Utc>,
}

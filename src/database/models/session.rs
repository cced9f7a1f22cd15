use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted bearer session. The token is the primary key and is stored
/// verbatim; validity is `now < expires_at`, checked at read time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub token: String,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn validity_is_strictly_before_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            tenant_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(30),
        };
        assert!(session.is_valid(now));
        assert!(!session.is_valid(session.expires_at));
    }
}

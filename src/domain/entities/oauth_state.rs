use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an issued CSRF state stays valid.
pub const STATE_TTL_MINUTES: i64 = 10;

pub fn state_ttl() -> Duration {
    Duration::minutes(STATE_TTL_MINUTES)
}

/// Everything the callback needs, captured when the login was initiated.
///
/// The callback request is untrusted, so the redirect URI used for the code
/// exchange and the post-login destination are always read from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateContext {
    pub redirect_uri: String,
    pub client_ip: String,
    pub user_agent: String,
    pub return_url: String,
    pub created_at_iso: String,
}

/// One in-flight authorization attempt keyed by its CSRF token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub context: StateContext,
}

impl StateEntry {
    pub fn new(
        token: String,
        redirect_uri: String,
        client_ip: String,
        user_agent: String,
        return_url: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            created_at: now,
            context: StateContext {
                redirect_uri,
                client_ip,
                user_agent,
                return_url,
                created_at_iso: now.to_rfc3339(),
            },
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + state_ttl()
    }

    /// An entry is expired once it is strictly older than the TTL.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > state_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(now: DateTime<Utc>) -> StateEntry {
        StateEntry::new(
            "tok".to_string(),
            "https://app.example.com/auth/google/callback".to_string(),
            "203.0.113.7".to_string(),
            "Mozilla/5.0".to_string(),
            "/conversations".to_string(),
            now,
        )
    }

    #[test]
    fn test_new_records_iso_timestamp() {
        let now = Utc::now();
        let entry = entry_at(now);
        assert_eq!(entry.context.created_at_iso, now.to_rfc3339());
        assert_eq!(entry.expires_at(), now + Duration::minutes(10));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let entry = entry_at(now);

        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::minutes(10)));
        assert!(entry.is_expired(now + Duration::minutes(10) + Duration::seconds(1)));
    }
}

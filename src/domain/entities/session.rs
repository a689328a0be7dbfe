use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of a successful login, bound to the browser that completed it.
///
/// Carries nothing derived from the CSRF state or the identity provider's tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fingerprint: String,
    pub claims: Map<String, Value>,
}

impl SessionCredential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Full lifetime in whole seconds. Used as the cookie max-age.
    pub fn lifetime_seconds(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds().max(0)
    }
}

/// A credential together with its signed, transportable form.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub credential: SessionCredential,
    pub token: String,
}

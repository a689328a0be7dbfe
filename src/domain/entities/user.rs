use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::NormalizedIdentity;

/// Account record kept by the identity store, correlated by `provider_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub provider_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub locale: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal projection returned by `GET /auth/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn from_identity(identity: &NormalizedIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id: identity.provider_id.clone(),
            email: non_empty(&identity.email),
            display_name: identity.display_name.clone(),
            avatar_url: non_empty(&identity.avatar_url),
            email_verified: identity.email_verified.unwrap_or(false),
            given_name: non_empty(&identity.given_name),
            family_name: non_empty(&identity.family_name),
            locale: non_empty(&identity.locale),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a fresh identity into this record.
    ///
    /// Only values that are newly non-empty overwrite; a placeholder display
    /// name never replaces a real one.
    pub fn merge_identity(&mut self, identity: &NormalizedIdentity, now: DateTime<Utc>) {
        merge_field(&mut self.email, &identity.email);
        merge_field(&mut self.avatar_url, &identity.avatar_url);
        merge_field(&mut self.given_name, &identity.given_name);
        merge_field(&mut self.family_name, &identity.family_name);
        merge_field(&mut self.locale, &identity.locale);

        if !identity.display_name.trim().is_empty()
            && (!identity.has_placeholder_name() || self.display_name.trim().is_empty())
        {
            self.display_name = identity.display_name.clone();
        }

        if let Some(verified) = identity.email_verified {
            self.email_verified = verified;
        }

        self.updated_at = now;
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn merge_field(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = non_empty(incoming) {
        *target = Some(value);
    }
}

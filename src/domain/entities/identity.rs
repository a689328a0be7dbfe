use serde::{Deserialize, Serialize};

/// Display name used when the identity provider supplies nothing usable.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Tokens returned by the identity provider's code exchange.
///
/// Only lives for the duration of the callback request.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

// Keep the access token out of logs.
impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// The identity provider's user-info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    /// Provider subject id. Google's v2 endpoint calls it `id`, OIDC calls it `sub`.
    #[serde(alias = "sub")]
    pub id: String,
    pub email: Option<String>,
    #[serde(alias = "email_verified")]
    pub verified_email: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
}

/// Canonical identity handed to the identity store.
///
/// `provider_id` is the only correlation key; every other field is optional
/// and must never blank out a value already on record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    pub provider_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email_verified: Option<bool>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub locale: Option<String>,
}

impl NormalizedIdentity {
    pub fn has_placeholder_name(&self) -> bool {
        self.display_name == DEFAULT_DISPLAY_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_profile_accepts_google_v2_shape() {
        let json = r#"{"id":"g123","email":"a@b.com","verified_email":true,"name":"Ada"}"#;
        let profile: RawProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "g123");
        assert_eq!(profile.verified_email, Some(true));
        assert_eq!(profile.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_raw_profile_accepts_oidc_shape() {
        let json = r#"{"sub":"g456","email_verified":false,"locale":"en"}"#;
        let profile: RawProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "g456");
        assert_eq!(profile.verified_email, Some(false));
        assert_eq!(profile.locale.as_deref(), Some("en"));
    }

    #[test]
    fn test_token_set_debug_redacts_access_token() {
        let tokens = TokenSet {
            access_token: "ya29.secret".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3599),
        };
        let rendered = format!("{:?}", tokens);
        assert!(!rendered.contains("ya29.secret"));
        assert!(rendered.contains("[redacted]"));
    }
}

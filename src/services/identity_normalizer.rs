use std::sync::Arc;

use url::Url;

use crate::domain::entities::{NormalizedIdentity, RawProfile, DEFAULT_DISPLAY_NAME};
use crate::domain::ports::AvatarSanitizer;

const MAX_AVATAR_URL_LEN: usize = 2048;

/// Accepts absolute https avatar URLs with a host and bounded length.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsAvatarSanitizer;

impl AvatarSanitizer for HttpsAvatarSanitizer {
    fn sanitize(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?.trim();
        if raw.is_empty() || raw.len() > MAX_AVATAR_URL_LEN {
            return None;
        }

        let url = Url::parse(raw).ok()?;
        if url.scheme() != "https" || url.host_str().map_or(true, str::is_empty) {
            return None;
        }
        if !url.username().is_empty() || url.password().is_some() {
            return None;
        }

        Some(url.to_string())
    }
}

/// Maps a raw provider profile onto the canonical identity. Pure; never fails.
#[derive(Clone)]
pub struct IdentityNormalizer {
    avatars: Arc<dyn AvatarSanitizer>,
}

impl IdentityNormalizer {
    pub fn new(avatars: Arc<dyn AvatarSanitizer>) -> Self {
        Self { avatars }
    }

    pub fn normalize(&self, raw: RawProfile) -> NormalizedIdentity {
        let email = clean(raw.email).map(|e| e.to_ascii_lowercase());
        let given_name = clean(raw.given_name);
        let family_name = clean(raw.family_name);

        let display_name = clean(raw.name)
            .or_else(|| join_names(given_name.as_deref(), family_name.as_deref()))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        NormalizedIdentity {
            provider_id: raw.id,
            email,
            display_name,
            avatar_url: self.avatars.sanitize(raw.picture.as_deref()),
            email_verified: raw.verified_email,
            given_name,
            family_name,
            locale: clean(raw.locale),
        }
    }
}

impl Default for IdentityNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(HttpsAvatarSanitizer))
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn join_names(given: Option<&str>, family: Option<&str>) -> Option<String> {
    match (given, family) {
        (Some(g), Some(f)) => Some(format!("{} {}", g, f)),
        (Some(n), None) | (None, Some(n)) => Some(n.to_string()),
        (None, None) => None,
    }
}

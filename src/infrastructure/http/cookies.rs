use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::{Config, CookieSameSite};

/// Attributes of the session cookie. The value is always the signed credential.
#[derive(Debug, Clone)]
pub struct SessionCookieSettings {
    pub name: String,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub domain: Option<String>,
}

impl SessionCookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.session_cookie_name.clone(),
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
            domain: config.cookie_domain.clone(),
        }
    }

    /// HTTP-only session cookie scoped to `/` that lives exactly as long as the credential.
    pub fn session_cookie(&self, token: String, max_age_seconds: i64) -> Cookie<'static> {
        let mut cookie = self.base(token);
        cookie.set_max_age(time::Duration::seconds(max_age_seconds));
        cookie
    }

    /// Same cookie, emptied and expired.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_max_age(time::Duration::ZERO);
        cookie
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let same_site = match self.same_site {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        };

        let mut builder = Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            // browsers drop SameSite=None cookies without Secure
            .secure(self.secure || self.same_site == CookieSameSite::None)
            .same_site(same_site);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SessionCookieSettings {
        SessionCookieSettings {
            name: "session_token".to_string(),
            secure: true,
            same_site: CookieSameSite::Lax,
            domain: None,
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = settings().session_cookie("jwt".to_string(), 86400);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("session_token=jwt"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=86400"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let mut s = settings();
        s.domain = Some("example.com".to_string());
        let rendered = s.removal_cookie().to_string();

        assert!(rendered.starts_with("session_token=;"));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Domain=example.com"));
    }

    #[test]
    fn test_same_site_none_forces_secure() {
        let mut s = settings();
        s.secure = false;
        s.same_site = CookieSameSite::None;
        assert!(s.session_cookie("x".to_string(), 1).to_string().contains("Secure"));
    }
}

use url::{Host, Url};

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Decides whether a caller-supplied post-login destination is safe.
///
/// Accepts single-slash relative paths over a restricted alphabet, or absolute
/// http(s) URLs whose host is loopback or the trusted frontend host.
#[derive(Debug, Clone)]
pub struct ReturnUrlValidator {
    trusted_host: Option<String>,
    fallback: String,
}

impl ReturnUrlValidator {
    /// `trusted_origin` is the frontend origin; `fallback` must itself be safe.
    pub fn new(trusted_origin: &str, fallback: impl Into<String>) -> Self {
        let trusted_host = Url::parse(trusted_origin)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

        let fallback = fallback.into();
        let fallback = if is_safe_relative_path(&fallback) {
            fallback
        } else {
            tracing::warn!(fallback = %fallback, "Unsafe default return path, using /");
            "/".to_string()
        };

        Self {
            trusted_host,
            fallback,
        }
    }

    pub fn validate(&self, candidate: &str) -> bool {
        if candidate.starts_with('/') {
            return is_safe_relative_path(candidate);
        }

        let Ok(url) = Url::parse(candidate) else {
            return false;
        };

        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return false,
        };

        LOOPBACK_HOSTS.contains(&host.as_str())
            || self.trusted_host.as_deref() == Some(host.as_str())
    }

    /// Return `candidate` if safe, otherwise the fixed fallback. Never fails.
    pub fn clamp(&self, candidate: Option<&str>) -> String {
        match candidate {
            Some(c) if self.validate(c) => c.to_string(),
            Some(c) => {
                tracing::warn!(return_url = %c, "Rejected unsafe return URL");
                self.fallback.clone()
            }
            None => self.fallback.clone(),
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

fn is_safe_relative_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '?' | '&' | '='))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ReturnUrlValidator {
        ReturnUrlValidator::new("https://app.example.com", "/")
    }

    #[test]
    fn test_relative_paths() {
        let v = validator();
        assert!(v.validate("/conversations"));
        assert!(v.validate("/"));
        assert!(v.validate("/posts/new?tab=draft&x=1"));
        assert!(v.validate("/user_profile/edit-name"));
    }

    #[test]
    fn test_scheme_relative_rejected() {
        let v = validator();
        assert!(!v.validate("//evil.com"));
        assert!(!v.validate("//evil.com/x"));
    }

    #[test]
    fn test_relative_path_unsafe_characters_rejected() {
        let v = validator();
        assert!(!v.validate("/\\evil.com"));
        assert!(!v.validate("/path#frag"));
        assert!(!v.validate("/a b"));
        assert!(!v.validate("/%2F%2Fevil.com"));
        assert!(!v.validate("/.."));
    }

    #[test]
    fn test_absolute_urls() {
        let v = validator();
        assert!(!v.validate("https://attacker.example/x"));
        assert!(v.validate("https://app.example.com/x"));
        assert!(v.validate("https://APP.example.com/x"));
        assert!(v.validate("http://localhost:5173/conversations"));
        assert!(v.validate("http://127.0.0.1:3000/"));
        assert!(v.validate("http://[::1]:3000/"));
        assert!(!v.validate("https://app.example.com.attacker.example/"));
        assert!(!v.validate("https://app.example.com@attacker.example/"));
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        let v = validator();
        assert!(!v.validate("javascript:alert(1)"));
        assert!(!v.validate("data:text/html,hi"));
        assert!(!v.validate("ftp://app.example.com/"));
    }

    #[test]
    fn test_garbage_rejected() {
        let v = validator();
        assert!(!v.validate(""));
        assert!(!v.validate("conversations"));
        assert!(!v.validate("http://"));
    }

    #[test]
    fn test_clamp_downgrades_silently() {
        let v = ReturnUrlValidator::new("https://app.example.com", "/home");
        assert_eq!(v.clamp(Some("/conversations")), "/conversations");
        assert_eq!(v.clamp(Some("//evil.com")), "/home");
        assert_eq!(v.clamp(None), "/home");
    }

    #[test]
    fn test_unsafe_fallback_replaced() {
        let v = ReturnUrlValidator::new("https://app.example.com", "//evil.com");
        assert_eq!(v.fallback(), "/");
    }
}

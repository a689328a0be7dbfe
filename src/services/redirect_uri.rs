use url::Url;

/// Whitelists the callback URI registered with the identity provider.
#[derive(Debug, Clone, Default)]
pub struct RedirectUriValidator {
    production: bool,
    allowed_hosts: Vec<String>,
}

impl RedirectUriValidator {
    pub fn new(production: bool, allowed_hosts: Vec<String>) -> Self {
        Self {
            production,
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn validate(&self, uri: &str) -> bool {
        let Ok(url) = Url::parse(uri) else {
            return false;
        };

        match url.scheme() {
            "https" => {}
            "http" if !self.production => {}
            _ => return false,
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_ascii_lowercase(),
            _ => return false,
        };

        self.allowed_hosts.is_empty() || self.allowed_hosts.iter().any(|h| *h == host)
    }
}

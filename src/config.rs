use std::env;

pub const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Minimum length of `SESSION_SECRET` in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    pub oauth_http_timeout_secs: u64,
    pub frontend_url: String,
    pub default_return_path: String,
    pub production: bool,
    pub allowed_redirect_hosts: Vec<String>,
    pub session_secret: String,
    pub session_duration_hours: i64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: CookieSameSite,
    pub cookie_domain: Option<String>,
    pub bind_login_to_client_ip: bool,
    pub trust_proxy_headers: bool,
    pub login_rate_limit_per_minute: u32,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
}

/// `SameSite` policy applied to the session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl CookieSameSite {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidSameSite(other.to_string())),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let google_client_id = required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let google_redirect_uri = required("GOOGLE_REDIRECT_URI")?;

        let google_auth_url =
            env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| DEFAULT_GOOGLE_AUTH_URL.to_string());
        let google_token_url =
            env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| DEFAULT_GOOGLE_TOKEN_URL.to_string());
        let google_userinfo_url = env::var("GOOGLE_USERINFO_URL")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_USERINFO_URL.to_string());

        let oauth_http_timeout_secs = env::var("OAUTH_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let default_return_path =
            env::var("DEFAULT_RETURN_PATH").unwrap_or_else(|_| "/".to_string());

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let allowed_redirect_hosts = env::var("ALLOWED_REDIRECT_HOSTS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::WeakSessionSecret);
        }

        let session_duration_hours = env::var("SESSION_DURATION_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);

        let session_cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session_token".to_string());

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| parse_bool(&v))
            .unwrap_or(production);

        let cookie_same_site = match env::var("COOKIE_SAME_SITE") {
            Ok(v) => CookieSameSite::parse(&v)?,
            Err(_) => CookieSameSite::Lax,
        };

        let cookie_domain = env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty());

        let bind_login_to_client_ip = env::var("BIND_LOGIN_TO_CLIENT_IP")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let trust_proxy_headers = env::var("TRUST_PROXY_HEADERS")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let login_rate_limit_per_minute = env::var("LOGIN_RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "gatehouse".to_string());

        let metrics_port = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9000".to_string())
            .parse()
            .unwrap_or(9000);

        Ok(Config {
            server_host,
            server_port,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            google_auth_url,
            google_token_url,
            google_userinfo_url,
            oauth_http_timeout_secs,
            frontend_url,
            default_return_path,
            production,
            allowed_redirect_hosts,
            session_secret,
            session_duration_hours,
            session_cookie_name,
            cookie_secure,
            cookie_same_site,
            cookie_domain,
            bind_login_to_client_ip,
            trust_proxy_headers,
            login_rate_limit_per_minute,
            otel_exporter_endpoint,
            service_name,
            metrics_port,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("SESSION_SECRET must be at least 32 bytes")]
    WeakSessionSecret,

    #[error("Invalid COOKIE_SAME_SITE value: {0}")]
    InvalidSameSite(String),

    #[error("Invalid port number")]
    InvalidPort,
}

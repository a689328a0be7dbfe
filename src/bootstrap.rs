use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Config;
use crate::domain::ports::{Clock, IdentityStore, StateStore, SystemClock};
use crate::infrastructure::http::cookies::SessionCookieSettings;
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::{InMemoryIdentityStore, InMemoryStateStore};
use crate::infrastructure::providers::GoogleOAuthClient;
use crate::services::{
    AuthorizationUrlBuilder, FlowComponents, FlowSettings, IdentityNormalizer, OAuthFlow,
    RedirectUriValidator, ReturnUrlValidator, SessionError, SessionIssuer,
};
use crate::shared::LoginRateLimiter;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid session settings: {0}")]
    Session(#[from] SessionError),
    #[error("failed to build identity provider HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Claims stamped into every credential issued by this service.
pub fn default_session_claims() -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert(
        "login_method".to_string(),
        Value::String("google".to_string()),
    );
    claims
}

/// Wire the Google login flow with in-memory stores and the system clock.
pub fn build_app_state(config: &Config) -> Result<AppState, BootstrapError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state_store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new(clock.clone()));
    let identity_store: Arc<dyn IdentityStore> =
        Arc::new(InMemoryIdentityStore::new(clock.clone()));
    tracing::info!("In-memory state and identity stores initialized");

    let google = Arc::new(GoogleOAuthClient::from_config(config)?);

    let components = FlowComponents {
        state_store,
        token_exchanger: google.clone(),
        user_info: google,
        identity_store: identity_store.clone(),
        normalizer: IdentityNormalizer::default(),
        sessions: SessionIssuer::new(
            config.session_secret.clone(),
            config.session_duration_hours,
            clock.clone(),
        )?,
        return_urls: ReturnUrlValidator::new(
            &config.frontend_url,
            config.default_return_path.clone(),
        ),
        redirect_uris: RedirectUriValidator::new(
            config.production,
            config.allowed_redirect_hosts.clone(),
        ),
        authorization_urls: AuthorizationUrlBuilder::new(
            config.google_auth_url.clone(),
            config.google_client_id.clone(),
        ),
        clock: clock.clone(),
    };

    let settings = FlowSettings {
        redirect_uri: config.google_redirect_uri.clone(),
        bind_client_ip: config.bind_login_to_client_ip,
        session_claims: default_session_claims(),
    };
    tracing::info!(
        redirect_uri = %settings.redirect_uri,
        bind_client_ip = settings.bind_client_ip,
        "OAuth flow configured"
    );

    Ok(AppState {
        flow: Arc::new(OAuthFlow::new(settings, components)),
        identity_store,
        cookies: SessionCookieSettings::from_config(config),
        frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        login_limiter: LoginRateLimiter::per_minute(config.login_rate_limit_per_minute),
        trust_proxy_headers: config.trust_proxy_headers,
        clock,
    })
}

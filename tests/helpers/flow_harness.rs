use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatehouse::bootstrap::default_session_claims;
use gatehouse::config::CookieSameSite;
use gatehouse::domain::entities::{NormalizedIdentity, User};
use gatehouse::domain::errors::{DomainError, DomainResult};
use gatehouse::domain::ports::{Clock, IdentityStore};
use gatehouse::infrastructure::http::cookies::SessionCookieSettings;
use gatehouse::infrastructure::http::middleware::AppState;
use gatehouse::infrastructure::persistence::{InMemoryIdentityStore, InMemoryStateStore};
use gatehouse::infrastructure::providers::GoogleOAuthClient;
use gatehouse::services::{
    AuthorizationUrlBuilder, CallbackRequest, FlowComponents, FlowSettings, IdentityNormalizer,
    InitiateRequest, OAuthFlow, RedirectUriValidator, ReturnUrlValidator, SessionIssuer,
};
use gatehouse::shared::LoginRateLimiter;

pub const SESSION_SECRET: &str = "integration-test-session-secret-0123456789";
pub const FRONTEND_URL: &str = "http://localhost:3000";
pub const REDIRECT_URI: &str = "https://api.example.com/auth/google/callback";
pub const CLIENT_IP: &str = "203.0.113.7";
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";
pub const COOKIE_NAME: &str = "session_token";

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Identity store whose every call fails.
pub struct UnavailableIdentityStore;

#[async_trait::async_trait]
impl IdentityStore for UnavailableIdentityStore {
    async fn upsert_by_provider_id(&self, _identity: &NormalizedIdentity) -> DomainResult<User> {
        Err(DomainError::Unavailable("identity store offline".to_string()))
    }

    async fn get_user(&self, _user_id: &str) -> DomainResult<Option<User>> {
        Err(DomainError::Unavailable("identity store offline".to_string()))
    }
}

pub struct HarnessOptions {
    pub redirect_uri: String,
    pub production: bool,
    pub bind_client_ip: bool,
    /// Swap the in-memory identity store for [`UnavailableIdentityStore`].
    pub identity_store_down: bool,
    pub start_at: Option<DateTime<Utc>>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            redirect_uri: REDIRECT_URI.to_string(),
            production: true,
            bind_client_ip: false,
            identity_store_down: false,
            start_at: None,
        }
    }
}

/// A fully wired flow whose identity provider is a local mock server.
pub struct TestHarness {
    pub server: MockServer,
    pub clock: Arc<ManualClock>,
    pub state_store: Arc<InMemoryStateStore>,
    pub identity_store: Arc<InMemoryIdentityStore>,
    pub flow: Arc<OAuthFlow>,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self::with_options(HarnessOptions::default()).await
    }

    pub async fn with_options(options: HarnessOptions) -> Self {
        let server = MockServer::start().await;
        let clock = Arc::new(ManualClock::at(options.start_at.unwrap_or_else(Utc::now)));
        let state_store = Arc::new(InMemoryStateStore::new(clock.clone()));
        let identity_store = Arc::new(InMemoryIdentityStore::new(clock.clone()));

        let google = Arc::new(GoogleOAuthClient::with_endpoints(
            "test-client-id".to_string(),
            "test-client-secret".to_string(),
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
            std::time::Duration::from_secs(2),
        )
        .unwrap());

        let flow_identity_store: Arc<dyn IdentityStore> = if options.identity_store_down {
            Arc::new(UnavailableIdentityStore)
        } else {
            identity_store.clone()
        };

        let components = FlowComponents {
            state_store: state_store.clone(),
            token_exchanger: google.clone(),
            user_info: google,
            identity_store: flow_identity_store,
            normalizer: IdentityNormalizer::default(),
            sessions: SessionIssuer::new(SESSION_SECRET, 24, clock.clone()).unwrap(),
            return_urls: ReturnUrlValidator::new(FRONTEND_URL, "/"),
            redirect_uris: RedirectUriValidator::new(options.production, vec![]),
            authorization_urls: AuthorizationUrlBuilder::new(
                format!("{}/auth", server.uri()),
                "test-client-id",
            ),
            clock: clock.clone(),
        };

        let settings = FlowSettings {
            redirect_uri: options.redirect_uri,
            bind_client_ip: options.bind_client_ip,
            session_claims: default_session_claims(),
        };

        Self {
            server,
            clock,
            state_store,
            identity_store,
            flow: Arc::new(OAuthFlow::new(settings, components)),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            flow: self.flow.clone(),
            identity_store: self.identity_store.clone(),
            cookies: SessionCookieSettings {
                name: COOKIE_NAME.to_string(),
                secure: true,
                same_site: CookieSameSite::Lax,
                domain: None,
            },
            frontend_url: FRONTEND_URL.to_string(),
            login_limiter: LoginRateLimiter::disabled(),
            trust_proxy_headers: true,
            clock: self.clock.clone(),
        }
    }

    /// Initiate a login from the default client and return the issued state.
    pub async fn issue_state(&self, return_url: Option<&str>) -> String {
        self.flow
            .initiate(initiate_request(return_url))
            .await
            .unwrap()
            .state_token
    }

    pub async fn mock_token_success(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test-access-token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token_failure(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_profile(&self, status: u16, body: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }
}

pub fn initiate_request(return_url: Option<&str>) -> InitiateRequest {
    InitiateRequest {
        return_url: return_url.map(str::to_string),
        client_ip: CLIENT_IP.to_string(),
        user_agent: USER_AGENT.to_string(),
    }
}

pub fn callback_request(code: &str, state: &str) -> CallbackRequest {
    CallbackRequest {
        code: Some(code.to_string()),
        state: Some(state.to_string()),
        error: None,
        client_ip: CLIENT_IP.to_string(),
        user_agent: USER_AGENT.to_string(),
    }
}

pub fn google_profile() -> Value {
    json!({
        "id": "g123",
        "email": "a@b.com",
        "verified_email": true
    })
}

/// Value of `name` in the query string of `url`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

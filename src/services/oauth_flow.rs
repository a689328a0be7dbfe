use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::{SessionCredential, StateEntry, User};
use crate::domain::errors::DomainError;
use crate::domain::ports::identity_provider::{TokenExchangeError, UserInfoError};
use crate::domain::ports::{Clock, IdentityStore, StateStore, TokenExchanger, UserInfoFetcher};
use crate::services::authorization_url::AuthorizationUrlBuilder;
use crate::services::identity_normalizer::IdentityNormalizer;
use crate::services::redirect_uri::RedirectUriValidator;
use crate::services::return_url::ReturnUrlValidator;
use crate::services::session_issuer::{SessionError, SessionIssuer};
use crate::shared::csrf::{generate_state_token, state_tokens_match};

/// Longest identity-provider error code passed through to the frontend.
const MAX_IDP_ERROR_LEN: usize = 64;

/// States of one login attempt. The last seven are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    StateIssued,
    CallbackReceived,
    StateValidated,
    CodeExchanged,
    ProfileFetched,
    IdentityResolved,
    SessionIssued,
    Rejected,
    RejectedBadRedirect,
    RejectedBadState,
    RejectedMissingParams,
    ExchangeFailed,
    ProfileFetchFailed,
    UnexpectedError,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Init => "init",
            FlowState::StateIssued => "state_issued",
            FlowState::CallbackReceived => "callback_received",
            FlowState::StateValidated => "state_validated",
            FlowState::CodeExchanged => "code_exchanged",
            FlowState::ProfileFetched => "profile_fetched",
            FlowState::IdentityResolved => "identity_resolved",
            FlowState::SessionIssued => "session_issued",
            FlowState::Rejected => "rejected",
            FlowState::RejectedBadRedirect => "rejected_bad_redirect",
            FlowState::RejectedBadState => "rejected_bad_state",
            FlowState::RejectedMissingParams => "rejected_missing_params",
            FlowState::ExchangeFailed => "exchange_failed",
            FlowState::ProfileFetchFailed => "profile_fetch_failed",
            FlowState::UnexpectedError => "unexpected_error",
        }
    }
}

/// Fatal misconfiguration detected while initiating a login.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("configured redirect URI is not acceptable: {0}")]
    InvalidRedirectUri(String),
    #[error("state store unavailable: {0}")]
    StateStore(#[from] DomainError),
}

impl ConfigurationError {
    pub fn state(&self) -> FlowState {
        match self {
            ConfigurationError::InvalidRedirectUri(_) => FlowState::RejectedBadRedirect,
            ConfigurationError::StateStore(_) => FlowState::UnexpectedError,
        }
    }
}

/// Every way `complete` can fail. Details are for server-side logs only;
/// the frontend sees [`FlowError::redirect_reason`].
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("identity provider returned error: {0}")]
    IdentityProvider(String),
    #[error("callback is missing code or state")]
    MissingParameters,
    #[error("state is unknown, expired or already used")]
    InvalidState,
    #[error("callback client {callback_ip} does not match initiating client {initiating_ip}")]
    ClientMismatch {
        initiating_ip: String,
        callback_ip: String,
    },
    #[error("code exchange failed: {0}")]
    Exchange(#[from] TokenExchangeError),
    #[error("profile fetch failed: {0}")]
    UserInfo(#[from] UserInfoError),
    #[error("identity store failed: {0}")]
    IdentityStore(DomainError),
    #[error("state store failed: {0}")]
    StateStore(DomainError),
    #[error("session issuance failed: {0}")]
    Session(#[from] SessionError),
}

impl FlowError {
    pub fn state(&self) -> FlowState {
        match self {
            FlowError::IdentityProvider(_) => FlowState::Rejected,
            FlowError::MissingParameters => FlowState::RejectedMissingParams,
            FlowError::InvalidState | FlowError::ClientMismatch { .. } => {
                FlowState::RejectedBadState
            }
            FlowError::Exchange(_) => FlowState::ExchangeFailed,
            FlowError::UserInfo(_) => FlowState::ProfileFetchFailed,
            FlowError::IdentityStore(_) | FlowError::StateStore(_) | FlowError::Session(_) => {
                FlowState::UnexpectedError
            }
        }
    }

    /// Opaque `auth_error` value for the frontend redirect.
    pub fn redirect_reason(&self) -> Cow<'static, str> {
        match self {
            FlowError::IdentityProvider(code) => match sanitize_idp_error(code) {
                Some(code) => Cow::Owned(code),
                None => Cow::Borrowed("oauth_failed"),
            },
            FlowError::MissingParameters => Cow::Borrowed("missing_parameters"),
            FlowError::InvalidState => Cow::Borrowed("invalid_state"),
            FlowError::ClientMismatch { .. } => Cow::Borrowed("security_violation"),
            FlowError::Exchange(_) | FlowError::UserInfo(_) => Cow::Borrowed("oauth_failed"),
            FlowError::IdentityStore(_) | FlowError::StateStore(_) | FlowError::Session(_) => {
                Cow::Borrowed("server_error")
            }
        }
    }
}

fn sanitize_idp_error(code: &str) -> Option<String> {
    let code = code.trim();
    let ok = !code.is_empty()
        && code.len() <= MAX_IDP_ERROR_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    ok.then(|| code.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct InitiateRequest {
    pub return_url: Option<String>,
    pub client_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub authorization_url: String,
    pub state_token: String,
}

/// Query parameters of the provider callback plus the requesting client.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub client_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct CompletedLogin {
    pub user: User,
    pub credential: SessionCredential,
    /// Signed form of `credential`, for the session cookie.
    pub session_token: String,
    /// Re-validated destination; relative path or trusted absolute URL.
    pub return_url: String,
}

/// Static settings of the flow.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub redirect_uri: String,
    /// Reject callbacks arriving from a different IP than the initiation.
    pub bind_client_ip: bool,
    /// Claims copied into every issued credential.
    pub session_claims: Map<String, Value>,
}

/// The collaborators the flow sequences.
#[derive(Clone)]
pub struct FlowComponents {
    pub state_store: Arc<dyn StateStore>,
    pub token_exchanger: Arc<dyn TokenExchanger>,
    pub user_info: Arc<dyn UserInfoFetcher>,
    pub identity_store: Arc<dyn IdentityStore>,
    pub normalizer: IdentityNormalizer,
    pub sessions: SessionIssuer,
    pub return_urls: ReturnUrlValidator,
    pub redirect_uris: RedirectUriValidator,
    pub authorization_urls: AuthorizationUrlBuilder,
    pub clock: Arc<dyn Clock>,
}

/// Sequences one browser-redirect login: `initiate` then `complete`.
#[derive(Clone)]
pub struct OAuthFlow {
    settings: FlowSettings,
    parts: FlowComponents,
}

impl OAuthFlow {
    pub fn new(settings: FlowSettings, components: FlowComponents) -> Self {
        Self {
            settings,
            parts: components,
        }
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.parts.sessions
    }

    pub fn return_urls(&self) -> &ReturnUrlValidator {
        &self.parts.return_urls
    }

    /// Issue a CSRF state and build the provider redirect.
    ///
    /// Never talks to the identity provider.
    pub async fn initiate(&self, req: InitiateRequest) -> Result<LoginRedirect, ConfigurationError> {
        let return_url = self.parts.return_urls.clamp(req.return_url.as_deref());

        let redirect_uri = &self.settings.redirect_uri;
        if !self.parts.redirect_uris.validate(redirect_uri) {
            tracing::error!(
                redirect_uri = %redirect_uri,
                state = FlowState::RejectedBadRedirect.as_str(),
                "Configured redirect URI failed validation"
            );
            record_outcome("initiate", FlowState::RejectedBadRedirect);
            return Err(ConfigurationError::InvalidRedirectUri(redirect_uri.clone()));
        }

        let token = generate_state_token();
        let authorization_url = self.parts.authorization_urls.build(&token, redirect_uri);

        let entry = StateEntry::new(
            token.clone(),
            redirect_uri.clone(),
            req.client_ip,
            req.user_agent,
            return_url,
            self.parts.clock.now(),
        );
        if let Err(e) = self.parts.state_store.insert(entry).await {
            tracing::error!(error = %e, "Failed to store login state");
            record_outcome("initiate", FlowState::UnexpectedError);
            return Err(e.into());
        }

        tracing::debug!(state = FlowState::StateIssued.as_str(), "Login initiated");
        record_outcome("initiate", FlowState::StateIssued);

        Ok(LoginRedirect {
            authorization_url,
            state_token: token,
        })
    }

    /// Validate the callback and, if everything checks out, issue a session.
    ///
    /// Once a stored state has been found it is deleted on every exit path,
    /// so a callback can succeed at most once.
    pub async fn complete(&self, req: CallbackRequest) -> Result<CompletedLogin, FlowError> {
        let result = self.run_callback(&req).await;

        match &result {
            Ok(login) => {
                tracing::info!(
                    user_id = %login.user.id,
                    state = FlowState::SessionIssued.as_str(),
                    "Login completed"
                );
                record_outcome("complete", FlowState::SessionIssued);
            }
            Err(e) => {
                let state = e.state();
                match state {
                    FlowState::UnexpectedError => {
                        tracing::error!(error = %e, state = state.as_str(), "Login failed")
                    }
                    _ => tracing::warn!(error = %e, state = state.as_str(), "Login rejected"),
                }
                record_outcome("complete", state);
            }
        }

        result
    }

    async fn run_callback(&self, req: &CallbackRequest) -> Result<CompletedLogin, FlowError> {
        if let Some(error) = req.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(FlowError::IdentityProvider(error.to_string()));
        }

        let (code, state) = match (non_empty(&req.code), non_empty(&req.state)) {
            (Some(code), Some(state)) => (code, state),
            _ => return Err(FlowError::MissingParameters),
        };
        tracing::debug!(state = FlowState::CallbackReceived.as_str(), "Callback received");

        let entry = self
            .parts
            .state_store
            .peek(state)
            .await
            .map_err(FlowError::StateStore)?
            .ok_or(FlowError::InvalidState)?;

        let result = self.exchange_and_issue(req, code, state, &entry).await;
        if result.is_err() {
            self.discard_state(&entry.token).await;
        }
        result
    }

    async fn exchange_and_issue(
        &self,
        req: &CallbackRequest,
        code: &str,
        state: &str,
        entry: &StateEntry,
    ) -> Result<CompletedLogin, FlowError> {
        if !state_tokens_match(state, &entry.token) {
            return Err(FlowError::InvalidState);
        }

        if self.settings.bind_client_ip && entry.context.client_ip != req.client_ip {
            return Err(FlowError::ClientMismatch {
                initiating_ip: entry.context.client_ip.clone(),
                callback_ip: req.client_ip.clone(),
            });
        }
        tracing::debug!(state = FlowState::StateValidated.as_str(), "State validated");

        let tokens = self
            .parts
            .token_exchanger
            .exchange(code, &entry.context.redirect_uri)
            .await?;
        tracing::debug!(state = FlowState::CodeExchanged.as_str(), "Code exchanged");

        let profile = self.parts.user_info.fetch(&tokens.access_token).await?;
        tracing::debug!(state = FlowState::ProfileFetched.as_str(), "Profile fetched");

        let identity = self.parts.normalizer.normalize(profile);
        let user = self
            .parts
            .identity_store
            .upsert_by_provider_id(&identity)
            .await
            .map_err(FlowError::IdentityStore)?;
        tracing::debug!(
            user_id = %user.id,
            state = FlowState::IdentityResolved.as_str(),
            "Identity resolved"
        );

        self.parts
            .state_store
            .delete(&entry.token)
            .await
            .map_err(FlowError::StateStore)?;

        // bound to the browser completing the flow, not the one that started it
        let issued = self.parts.sessions.issue(
            &user.id,
            &req.user_agent,
            &req.client_ip,
            self.settings.session_claims.clone(),
        )?;

        let return_url = self.parts.return_urls.clamp(Some(&entry.context.return_url));

        Ok(CompletedLogin {
            user,
            credential: issued.credential,
            session_token: issued.token,
            return_url,
        })
    }

    async fn discard_state(&self, token: &str) {
        if let Err(e) = self.parts.state_store.delete(token).await {
            tracing::error!(error = %e, "Failed to delete login state after failure");
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn record_outcome(operation: &'static str, state: FlowState) {
    metrics::counter!(
        "oauth_flow_total",
        "operation" => operation,
        "outcome" => state.as_str()
    )
    .increment(1);
}

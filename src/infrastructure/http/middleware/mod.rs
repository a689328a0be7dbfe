pub mod client;
pub mod error;

pub use client::*;
pub use error::*;

use std::sync::Arc;

use crate::domain::ports::{Clock, IdentityStore};
use crate::infrastructure::http::cookies::SessionCookieSettings;
use crate::services::OAuthFlow;
use crate::shared::LoginRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<OAuthFlow>,
    pub identity_store: Arc<dyn IdentityStore>,
    pub cookies: SessionCookieSettings,
    /// Origin final redirects are sent to, without trailing slash.
    pub frontend_url: String,
    pub login_limiter: LoginRateLimiter,
    pub trust_proxy_headers: bool,
    pub clock: Arc<dyn Clock>,
}

use crate::domain::entities::{RawProfile, TokenSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenExchangeError {
    /// Non-2xx from the token endpoint. `error_code` is the provider's
    /// machine-readable code, when it sent one; the body itself is never kept.
    #[error("token endpoint returned HTTP {status} ({})", .error_code.as_deref().unwrap_or("no error code"))]
    Rejected {
        status: u16,
        error_code: Option<String>,
    },
    #[error("token endpoint request failed: {0}")]
    Transport(String),
    #[error("token endpoint timed out")]
    Timeout,
    #[error("token response did not contain an access token")]
    MissingAccessToken,
    #[error("token response could not be decoded: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum UserInfoError {
    #[error("userinfo endpoint returned HTTP {status}")]
    Rejected { status: u16 },
    #[error("userinfo request failed: {0}")]
    Transport(String),
    #[error("userinfo endpoint timed out")]
    Timeout,
    #[error("userinfo response did not contain a subject id")]
    MissingSubject,
    #[error("userinfo response could not be decoded: {0}")]
    InvalidResponse(String),
}

/// Authorization-code-for-token exchange with the identity provider.
#[async_trait::async_trait]
pub trait TokenExchanger: Send + Sync {
    /// `redirect_uri` must be the one recorded at initiation, byte for byte.
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, TokenExchangeError>;
}

/// Single bearer-authenticated profile lookup. No retries.
#[async_trait::async_trait]
pub trait UserInfoFetcher: Send + Sync {
    async fn fetch(&self, access_token: &str) -> Result<RawProfile, UserInfoError>;
}

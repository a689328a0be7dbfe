//! Google OAuth2 token exchange and userinfo lookup.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::domain::entities::{RawProfile, TokenSet};
use crate::domain::ports::identity_provider::{TokenExchangeError, UserInfoError};
use crate::domain::ports::{TokenExchanger, UserInfoFetcher};

/// Google token response. Every field optional so a 2xx without an access
/// token is reported as such rather than as a decode error.
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
}

/// OAuth2 error body (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(alias = "sub")]
    id: Option<String>,
    email: Option<String>,
    #[serde(alias = "email_verified")]
    verified_email: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
    locale: Option<String>,
}

/// Google `OAuth2` client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    token_url: String,
    userinfo_url: String,
    http_client: Client,
}

impl GoogleOAuthClient {
    /// Every request made by the client is bounded by `timeout`.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        token_url: String,
        userinfo_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client_id,
            client_secret,
            token_url,
            userinfo_url,
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_endpoints(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_token_url.clone(),
            config.google_userinfo_url.clone(),
            Duration::from_secs(config.oauth_http_timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl TokenExchanger for GoogleOAuthClient {
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, TokenExchangeError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TokenExchangeError::Timeout
                } else {
                    TokenExchangeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // only the machine-readable code survives; the body is dropped
            let error_code = response
                .json::<GoogleErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error);
            tracing::warn!(
                status = status.as_u16(),
                error_code = error_code.as_deref().unwrap_or("none"),
                "Token endpoint rejected code exchange"
            );
            return Err(TokenExchangeError::Rejected {
                status: status.as_u16(),
                error_code,
            });
        }

        let body: GoogleTokenResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TokenExchangeError::Timeout
            } else {
                TokenExchangeError::InvalidResponse(e.to_string())
            }
        })?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(TokenExchangeError::MissingAccessToken)?;

        Ok(TokenSet {
            access_token,
            token_type: body.token_type,
            expires_in: body.expires_in,
        })
    }
}

#[async_trait::async_trait]
impl UserInfoFetcher for GoogleOAuthClient {
    async fn fetch(&self, access_token: &str) -> Result<RawProfile, UserInfoError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UserInfoError::Timeout
                } else {
                    UserInfoError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UserInfoError::Rejected {
                status: status.as_u16(),
            });
        }

        let info: GoogleUserInfo = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UserInfoError::Timeout
            } else {
                UserInfoError::InvalidResponse(e.to_string())
            }
        })?;

        let id = info
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(UserInfoError::MissingSubject)?;

        Ok(RawProfile {
            id,
            email: info.email,
            verified_email: info.verified_email,
            name: info.name,
            given_name: info.given_name,
            family_name: info.family_name,
            picture: info.picture,
            locale: info.locale,
        })
    }
}

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::UserProfile;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState, ClientInfo};
use crate::services::{CallbackRequest, InitiateRequest};

/// The only identity provider wired up.
pub const SUPPORTED_PROVIDER: &str = "google";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub return_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub user: Option<UserProfile>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionStatus {
    fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
            expires_at: None,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    client: ClientInfo,
    query: Result<Query<LoginQuery>, QueryRejection>,
) -> ApiResult<Response> {
    ensure_supported(&provider)?;
    // an unreadable return_url falls back to the default like an unsafe one
    let query = lenient_query(query, "login");

    if let Err(wait) = state.login_limiter.check(&client.ip) {
        tracing::warn!(client_ip = %client.ip, "Login rate limit exceeded");
        return Err(ApiError::TooManyRequests(wait));
    }

    let redirect = state
        .flow
        .initiate(InitiateRequest {
            return_url: query.return_url,
            client_ip: client.ip,
            user_agent: client.user_agent,
        })
        .await?;

    Ok(found(&redirect.authorization_url))
}

pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    client: ClientInfo,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> ApiResult<Response> {
    ensure_supported(&provider)?;
    // an unreadable callback carries no code or state and is rejected as such
    let query = lenient_query(query, "callback");

    let result = state
        .flow
        .complete(CallbackRequest {
            code: query.code,
            state: query.state,
            error: query.error,
            client_ip: client.ip,
            user_agent: client.user_agent,
        })
        .await;

    let response = match result {
        Ok(login) => {
            let cookie = state
                .cookies
                .session_cookie(login.session_token, login.credential.lifetime_seconds());
            let target = success_redirect_url(
                &state.frontend_url,
                &login.return_url,
                state.clock.now().timestamp(),
            );
            (jar.add(cookie), found(&target)).into_response()
        }
        Err(e) => found(&error_redirect_url(&state.frontend_url, &e.redirect_reason())),
    };

    Ok(response)
}

/// Clears the session cookie whether or not one was sent.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(state.cookies.removal_cookie()),
        Json(json!({ "success": true })),
    )
}

pub async fn session(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
) -> Json<SessionStatus> {
    let Some(token) = jar
        .get(&state.cookies.name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Json(SessionStatus::anonymous());
    };

    let Some(credential) = state
        .flow
        .sessions()
        .verify(&token, &client.user_agent, &client.ip)
    else {
        return Json(SessionStatus::anonymous());
    };

    match state.identity_store.get_user(&credential.subject_id).await {
        Ok(Some(user)) => Json(SessionStatus {
            authenticated: true,
            user: Some(user.profile()),
            expires_at: Some(credential.expires_at),
        }),
        Ok(None) => {
            tracing::debug!(subject_id = %credential.subject_id, "Session subject no longer exists");
            Json(SessionStatus::anonymous())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session user");
            Json(SessionStatus::anonymous())
        }
    }
}

fn ensure_supported(provider: &str) -> ApiResult<()> {
    if provider == SUPPORTED_PROVIDER {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("Unknown provider: {}", provider)))
    }
}

fn lenient_query<T: Default>(query: Result<Query<T>, QueryRejection>, endpoint: &str) -> T {
    match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!(endpoint, error = %rejection.body_text(), "Malformed query string");
            T::default()
        }
    }
}

/// `302 Found` with a `Location` header.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `return_url` has already been validated: either a relative path, joined
/// onto the frontend origin, or an absolute URL on a trusted host.
pub fn success_redirect_url(frontend_url: &str, return_url: &str, timestamp: i64) -> String {
    let base = if return_url.starts_with('/') {
        format!("{}{}", frontend_url.trim_end_matches('/'), return_url)
    } else {
        return_url.to_string()
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{}{}auth_success=true&auth_timestamp={}",
        base, separator, timestamp
    )
}

pub fn error_redirect_url(frontend_url: &str, reason: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("auth_error", reason)
        .finish();
    format!("{}/?{}", frontend_url.trim_end_matches('/'), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_redirect_joins_relative_path() {
        assert_eq!(
            success_redirect_url("http://localhost:3000", "/conversations", 1700000000),
            "http://localhost:3000/conversations?auth_success=true&auth_timestamp=1700000000"
        );
    }

    #[test]
    fn test_success_redirect_appends_to_existing_query() {
        assert_eq!(
            success_redirect_url("https://app.example.com/", "/inbox?filter=open", 5),
            "https://app.example.com/inbox?filter=open&auth_success=true&auth_timestamp=5"
        );
    }

    #[test]
    fn test_success_redirect_keeps_trusted_absolute_url() {
        assert_eq!(
            success_redirect_url("https://app.example.com", "https://app.example.com/x", 7),
            "https://app.example.com/x?auth_success=true&auth_timestamp=7"
        );
    }

    #[test]
    fn test_error_redirect_encodes_reason() {
        assert_eq!(
            error_redirect_url("http://localhost:3000", "invalid_state"),
            "http://localhost:3000/?auth_error=invalid_state"
        );
        assert_eq!(
            error_redirect_url("http://localhost:3000/", "a b"),
            "http://localhost:3000/?auth_error=a+b"
        );
    }

    #[test]
    fn test_unknown_provider_is_not_found() {
        assert!(ensure_supported("google").is_ok());
        assert!(matches!(
            ensure_supported("github"),
            Err(ApiError::NotFound(_))
        ));
    }
}

use url::form_urlencoded;

/// Scopes requested on every login: identity, email and profile.
pub const DEFAULT_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Builds the identity provider's authorization-request URL.
///
/// Output is a pure function of the inputs; parameter order is fixed.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlBuilder {
    authorization_endpoint: String,
    client_id: String,
}

impl AuthorizationUrlBuilder {
    pub fn new(authorization_endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            client_id: client_id.into(),
        }
    }

    pub fn build(&self, csrf_token: &str, redirect_uri: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &DEFAULT_SCOPES.join(" "))
            .append_pair("response_type", "code")
            .append_pair("state", csrf_token)
            // no refresh token; the flow only needs the profile once
            .append_pair("access_type", "online")
            // never silently reuse a cached provider session
            .append_pair("prompt", "select_account")
            .finish();

        let separator = if self.authorization_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };

        format!("{}{}{}", self.authorization_endpoint, separator, query)
    }
}

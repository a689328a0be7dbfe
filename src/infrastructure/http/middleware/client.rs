use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use super::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

/// Network and browser context of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

#[async_trait]
impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientInfo {
            ip: resolve_client_ip(&parts.headers, peer, state.trust_proxy_headers),
            user_agent: user_agent(&parts.headers),
        })
    }
}

/// Peer address, or the first `X-Forwarded-For` hop when proxy headers are trusted.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_peer_address_used_by_default() {
        let peer: IpAddr = "203.0.113.7".parse().unwrap();
        let headers = forwarded("198.51.100.1");
        assert_eq!(resolve_client_ip(&headers, Some(peer), false), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_when_trusted() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let headers = forwarded("198.51.100.1, 10.0.0.1");
        assert_eq!(resolve_client_ip(&headers, Some(peer), true), "198.51.100.1");
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let headers = forwarded("not-an-ip");
        assert_eq!(resolve_client_ip(&headers, Some(peer), true), "10.0.0.1");
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None, true), "unknown");
    }
}

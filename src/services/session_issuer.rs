use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::domain::entities::{IssuedSession, SessionCredential};
use crate::domain::ports::Clock;

/// Hex characters kept from the SHA-256 fingerprint digest.
pub const FINGERPRINT_LEN: usize = 32;

/// Longest accepted session lifetime: one year.
pub const MAX_LIFETIME_HOURS: i64 = 24 * 366;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session lifetime must be between 1 and {} hours", MAX_LIFETIME_HOURS)]
    InvalidLifetime,
    #[error("session expiry is out of range")]
    ExpiryOutOfRange,
    #[error("failed to sign session credential: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
    jti: String,
    fgp: String,
    #[serde(default)]
    ctx: Map<String, Value>,
}

/// Issues and verifies signed, fingerprinted session credentials.
#[derive(Clone)]
pub struct SessionIssuer {
    secret: String,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(
        secret: impl Into<String>,
        lifetime_hours: i64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        if !(1..=MAX_LIFETIME_HOURS).contains(&lifetime_hours) {
            return Err(SessionError::InvalidLifetime);
        }
        let lifetime = Duration::try_hours(lifetime_hours).ok_or(SessionError::InvalidLifetime)?;
        let secret = secret.into();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            secret,
            lifetime,
            clock,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// One-way binding of a credential to the browser and network it was issued to.
    pub fn fingerprint(&self, user_agent: &str, client_ip: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_agent.as_bytes());
        hasher.update(b"|");
        hasher.update(client_ip.as_bytes());
        hasher.update(b"|");
        hasher.update(self.secret.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..FINGERPRINT_LEN].to_string()
    }

    /// Issue a fresh credential. Every call gets its own `jti`, so reissuing
    /// for the same subject never reuses a prior credential.
    pub fn issue(
        &self,
        subject_id: &str,
        user_agent: &str,
        client_ip: &str,
        claims: Map<String, Value>,
    ) -> Result<IssuedSession, SessionError> {
        let issued_at = truncate_to_seconds(self.clock.now());
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or(SessionError::ExpiryOutOfRange)?;
        let fingerprint = self.fingerprint(user_agent, client_ip);

        let jwt_claims = SessionClaims {
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            fgp: fingerprint.clone(),
            ctx: claims.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &jwt_claims, &self.encoding_key)?;

        Ok(IssuedSession {
            credential: SessionCredential {
                subject_id: subject_id.to_string(),
                issued_at,
                expires_at,
                fingerprint,
                claims,
            },
            token,
        })
    }

    /// Check signature, expiry and fingerprint. Any failure yields `None`.
    pub fn verify(
        &self,
        token: &str,
        user_agent: &str,
        client_ip: &str,
    ) -> Option<SessionCredential> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against the injected clock below
        validation.validate_exp = false;

        let data = match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session credential");
                return None;
            }
        };
        let claims = data.claims;

        let issued_at = Utc.timestamp_opt(claims.iat, 0).single()?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single()?;
        let credential = SessionCredential {
            subject_id: claims.sub,
            issued_at,
            expires_at,
            fingerprint: claims.fgp,
            claims: claims.ctx,
        };

        if credential.is_expired(self.clock.now()) {
            tracing::debug!(subject_id = %credential.subject_id, "Session credential expired");
            return None;
        }

        let expected = self.fingerprint(user_agent, client_ip);
        if !bool::from(expected.as_bytes().ct_eq(credential.fingerprint.as_bytes())) {
            tracing::warn!(
                subject_id = %credential.subject_id,
                "Session fingerprint mismatch"
            );
            return None;
        }

        Some(credential)
    }
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(at.timestamp(), 0).single().unwrap_or(at)
}

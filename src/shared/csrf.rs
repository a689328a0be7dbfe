use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Bytes of entropy in a CSRF state token.
pub const STATE_TOKEN_BYTES: usize = 32;

/// Generate a new CSRF state token (32 random bytes, URL-safe base64, 43 characters)
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare a callback `state` against the stored token in constant time.
///
/// Empty values never match.
pub fn state_tokens_match(presented: &str, stored: &str) -> bool {
    if presented.is_empty() || stored.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand_core::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of entropy per invite token (256 bits).
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invite token secret is missing or empty")]
    Missing,
}

/// Server-held secret used to key token digests.
///
/// Construction is the only gate: a hasher cannot exist without a non-empty
/// secret, so a misconfigured deployment fails at startup instead of hashing
/// with a weak key. Rotating the secret invalidates every outstanding token.
pub struct TokenSecret(Zeroizing<Vec<u8>>);

impl TokenSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, KeyError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(KeyError::Missing);
        }
        Ok(Self(Zeroizing::new(secret.into_bytes())))
    }

    /// Load from the environment (`TORHAUS_TOKEN_SECRET`).
    pub fn from_env() -> Result<Self, KeyError> {
        match std::env::var("TORHAUS_TOKEN_SECRET") {
            Ok(v) => Self::new(v),
            Err(_) => Err(KeyError::Missing),
        }
    }
}

/// Generate a new bearer token: 32 bytes from the OS RNG, base64url without
/// padding so it can ride in a query string untouched.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand_core::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Keyed token digester. Deterministic per secret; only the digest is ever
/// persisted, the plaintext token is handed out once and forgotten.
pub struct TokenHasher {
    secret: TokenSecret,
}

impl TokenHasher {
    pub fn new(secret: TokenSecret) -> Self {
        Self { secret }
    }

    /// HMAC-SHA256 over the token, lowercase hex. Used as the unique lookup
    /// key for invite records.
    pub fn hash(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret.0)
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hasher(secret: &str) -> TokenHasher {
        TokenHasher::new(TokenSecret::new(secret).unwrap())
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(TokenSecret::new(""), Err(KeyError::Missing)));
        assert!(matches!(TokenSecret::new("   "), Err(KeyError::Missing)));
    }

    #[test]
    fn hash_is_deterministic() {
        let h = hasher("s1");
        assert_eq!(h.hash("foo"), h.hash("foo"));
    }

    #[test]
    fn different_secrets_give_different_digests() {
        let a = hasher("s1");
        let b = hasher("s2");
        assert_ne!(a.hash("foo"), b.hash("foo"));
    }

    #[test]
    fn different_tokens_give_different_digests() {
        let h = hasher("s1");
        assert_ne!(h.hash("foo"), h.hash("bar"));
    }

    #[test]
    fn digest_is_hex_sha256_sized() {
        let d = hasher("s1").hash("foo");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_are_url_safe() {
        for _ in 0..100 {
            let t = generate_token();
            assert!(t
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            // 32 bytes of base64 without padding
            assert_eq!(t.len(), 43);
        }
    }

    #[test]
    fn ten_thousand_tokens_hash_distinct() {
        let h = hasher("s1");
        let digests: HashSet<String> =
            (0..10_000).map(|_| h.hash(&generate_token())).collect();
        assert_eq!(digests.len(), 10_000);
    }
}

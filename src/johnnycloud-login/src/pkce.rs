//! PKCE (Proof Key for Code Exchange) verifier/challenge generation.
//!
//! Implements RFC 7636. Only the S256 challenge method is supported; the
//! Plain method defeats the purpose of PKCE and is intentionally absent.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Number of random bytes behind a generated verifier. Encodes to a
/// 64-character URL-safe string, within the RFC's 43-128 range.
const VERIFIER_BYTES: usize = 48;

/// A PKCE verifier/challenge pair for one login attempt.
///
/// The verifier is the client-side secret; it is held only until the token
/// exchange consumes it. The challenge is what the authorization request
/// carries.
#[derive(Debug, Clone)]
pub struct PkceCredential {
    /// The code verifier (secret, never leaves this client except inside
    /// the token exchange request body).
    pub verifier: String,
    /// `base64url(SHA-256(verifier))`, padding stripped.
    pub challenge: String,
}

impl PkceCredential {
    /// Generate a fresh verifier from the OS random source and compute its
    /// S256 challenge.
    ///
    /// # Errors
    /// Returns [`AuthError::CryptoUnavailable`] if the OS random source
    /// fails. This is fatal to the login attempt; callers must not fall
    /// back to a weaker scheme.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| AuthError::CryptoUnavailable)?;
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        Ok(Self::from_verifier(verifier))
    }

    /// Compute the S256 challenge for an existing verifier.
    ///
    /// Used for fixtures and for reconstructing a credential from a
    /// persisted verifier; generated verifiers should come from
    /// [`PkceCredential::generate`].
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = compute_s256_challenge(&verifier);
        Self { verifier, challenge }
    }
}

/// S256: `BASE64URL(SHA256(ASCII(code_verifier)))`.
fn compute_s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_length_and_charset() {
        for _ in 0..100 {
            let pkce = PkceCredential::generate().unwrap();
            assert_eq!(pkce.verifier.len(), 64);
            assert!((43..=128).contains(&pkce.verifier.len()));
            for c in pkce.verifier.chars() {
                assert!(
                    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'),
                    "invalid character in verifier: {c}"
                );
            }
        }
    }

    #[test]
    fn test_challenge_has_no_padding_or_standard_alphabet() {
        let pkce = PkceCredential::generate().unwrap();
        assert!(!pkce.challenge.contains('='));
        assert!(!pkce.challenge.contains('+'));
        assert!(!pkce.challenge.contains('/'));
        // SHA-256 digest encodes to exactly 43 characters.
        assert_eq!(pkce.challenge.len(), 43);
    }

    #[test]
    fn test_known_vector() {
        // RFC 7636 appendix B.
        let pkce = PkceCredential::from_verifier(
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
        );
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_challenge_deterministic() {
        let a = PkceCredential::from_verifier("fixed-verifier-fixed-verifier-fixed-verifier".into());
        let b = PkceCredential::from_verifier("fixed-verifier-fixed-verifier-fixed-verifier".into());
        assert_eq!(a.challenge, b.challenge);
    }

    #[test]
    fn test_generated_pairs_are_unique() {
        let a = PkceCredential::generate().unwrap();
        let b = PkceCredential::generate().unwrap();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.challenge, b.challenge);
        assert_ne!(a.verifier, a.challenge);
    }
}

//! The session gate
//!
//! Issues and verifies the stateless session tokens that bind a request to
//! an identity. Tokens are HMAC-SHA256-signed JWTs carrying the user id and
//! an expiry; there is no revocation list, expiry is the only lifetime
//! bound. The gate knows nothing about resources -- it only answers "who is
//! calling".

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{Header, SignWithKey, Token, VerifyWithKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{FableError, Result};

/// Session token claims
#[derive(Clone, Debug, Deserialize, Serialize)]
struct Claims {
    #[serde(rename = "sub")]
    subject: Uuid,
    #[serde(rename = "iat")]
    issued_at: DateTime<Utc>,
    #[serde(rename = "exp")]
    expires: DateTime<Utc>,
}

/// Mints and verifies session tokens
#[derive(Clone)]
pub struct SessionGate {
    key: Hmac<Sha256>,
    ttl: Duration,
}

impl SessionGate {
    /// Create a gate signing with the given secret
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|e| FableError::Internal(format!("invalid signing key: {e}")))?;
        Ok(Self { key, ttl })
    }

    /// Create a gate with a random per-process key
    ///
    /// Tokens minted by it do not survive a restart; fine for development
    /// and tests.
    pub fn with_random_key(ttl: Duration) -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self {
            key: Hmac::new_from_slice(&secret).expect("HMAC-SHA256 accepts any key length"),
            ttl,
        }
    }

    /// Issue a token naming `user_id`, valid for the gate's TTL
    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            subject: user_id,
            issued_at: now,
            expires: now + self.ttl,
        };
        let token = Token::new(Header::default(), claims)
            .sign_with_key(&self.key)
            .map_err(|e| FableError::Internal(format!("failed to sign token: {e}")))?;
        Ok(token.as_str().to_owned())
    }

    /// Verify a token and resolve the identity it names
    ///
    /// Any failure -- bad signature, malformed token, expiry -- is
    /// `InvalidCredential`; the caller never learns which.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let token: Token<Header, Claims, _> = token
            .verify_with_key(&self.key)
            .map_err(|_| FableError::InvalidCredential)?;
        let claims = token.claims();
        if Utc::now() > claims.expires {
            return Err(FableError::InvalidCredential);
        }
        Ok(claims.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_issued_token() {
        let gate = SessionGate::with_random_key(Duration::hours(1));
        let user = crate::entities::new_id();
        let token = gate.issue(user).unwrap();
        assert_eq!(gate.verify(&token).unwrap(), user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let gate = SessionGate::with_random_key(Duration::seconds(-10));
        let token = gate.issue(crate::entities::new_id()).unwrap();
        assert!(matches!(
            gate.verify(&token),
            Err(FableError::InvalidCredential)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let gate = SessionGate::with_random_key(Duration::hours(1));
        assert!(gate.verify("not-a-token").is_err());
        assert!(gate.verify("").is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let gate = SessionGate::with_random_key(Duration::hours(1));
        let token = gate.issue(crate::entities::new_id()).unwrap();
        // Flip a character in the payload segment
        let mut chars: Vec<char> = token.chars().collect();
        let mid = token.find('.').unwrap() + 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(gate.verify(&tampered).is_err());
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let gate_a = SessionGate::with_random_key(Duration::hours(1));
        let gate_b = SessionGate::with_random_key(Duration::hours(1));
        let token = gate_a.issue(crate::entities::new_id()).unwrap();
        assert!(gate_b.verify(&token).is_err());
    }
}

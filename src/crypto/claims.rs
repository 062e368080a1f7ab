//! Admin capability tokens: a JWT scoped to a single session slug with a
//! bounded validity window.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Claims carried by an organizer's admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    #[serde(rename = "sub")]
    session_slug: String,
    #[serde(rename = "exp")]
    expire_at: u64,
}

impl AdminClaims {
    /// Mint claims for the given session, valid for `ttl` from now.
    ///
    /// Deliberately crate-private: callers obtain verified claims through
    /// [`AdminClaims::verify`] or the engine's `authenticate`, never by
    /// construction.
    pub(crate) fn new(session_slug: String, ttl: Duration) -> Self {
        Self {
            session_slug,
            expire_at: (Utc::now() + ttl).timestamp() as u64,
        }
    }

    /// The session slug this capability is scoped to.
    pub fn session_slug(&self) -> &str {
        &self.session_slug
    }

    /// Serialize and sign into a JWT.
    pub fn sign(&self, secret: &[u8]) -> Result<String> {
        Ok(encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret),
        )?)
    }

    /// Verify a JWT's signature and expiry and return its claims.
    pub fn verify(token: &str, secret: &[u8]) -> Result<Self> {
        Ok(decode(
            token,
            &DecodingKey::from_secret(secret),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-jwt-secret";

    #[test]
    fn sign_and_verify() {
        let claims = AdminClaims::new("team-offsite".to_string(), Duration::hours(24));
        let token = claims.sign(SECRET).unwrap();
        let verified = AdminClaims::verify(&token, SECRET).unwrap();
        assert_eq!(verified.session_slug(), "team-offsite");
    }

    #[test]
    fn wrong_secret_rejected() {
        let claims = AdminClaims::new("team-offsite".to_string(), Duration::hours(24));
        let token = claims.sign(SECRET).unwrap();
        assert!(AdminClaims::verify(&token, b"other-secret").is_err());
    }

    #[test]
    fn tampered_token_rejected() {
        let claims = AdminClaims::new("team-offsite".to_string(), Duration::hours(24));
        let mut token = claims.sign(SECRET).unwrap();
        token.push('x');
        assert!(AdminClaims::verify(&token, SECRET).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let claims = AdminClaims::new("team-offsite".to_string(), Duration::hours(-1));
        let token = claims.sign(SECRET).unwrap();
        assert!(AdminClaims::verify(&token, SECRET).is_err());
    }
}

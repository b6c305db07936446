//! Credentials: argon2 password hashes and HS256 bearer tokens.
//!
//! Tokens are self-contained. Verifying one needs only the server secret, so
//! there is no session table.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Role, User};

mod extract;

pub use extract::{AdminUser, AuthUser};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Malformed token subject")]
    MalformedSubject,

    #[error("Password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(inner: argon2::password_hash::Error) -> Self { AuthError::PasswordHash(inner) }
}

/// Who is making the request, as carried by a verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Checks signature and expiry and returns the identity the token carries.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::MalformedSubject)?;
        Ok(Identity { user_id, email: data.claims.email, role: data.claims.role })
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let keys = TokenKeys::new(b"test-secret", 1);
        let user = User::with_role("Ada", "ada@example.com", "h".into(), Role::Admin);
        let identity = keys.verify(&keys.issue(&user).unwrap()).unwrap();
        assert_eq!(identity, Identity { user_id: user.id, email: "ada@example.com".into(), role: Role::Admin });
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let user = User::register("Bob", "bob@example.com", "h".into());
        let token = TokenKeys::new(b"one", 1).issue(&user).unwrap();
        assert!(matches!(TokenKeys::new(b"two", 1).verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", 1);
        let past = Utc::now() - Duration::hours(2);
        let token = keys
            .sign(&Claims {
                sub: Uuid::new_v4().to_string(), email: "old@example.com".into(), role: Role::User,
                iat: past.timestamp(), exp: (past + Duration::minutes(5)).timestamp(),
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken(_))));
    }
}

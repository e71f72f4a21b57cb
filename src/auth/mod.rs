use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::Account;

/// Session cookie name
pub const SESSION_COOKIE: &str = "sweetpea_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
    #[error("Session secret not configured")]
    InvalidSecret,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: u64,
    secure_cookies: bool,
}

impl SessionKeys {
    pub fn new(security: &SecurityConfig) -> Result<Self, AuthError> {
        let secret = &security.session_secret;
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours: security.session_ttl_hours,
            secure_cookies: security.secure_cookies,
        })
    }

    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Issue a session token for the account
    pub fn issue(&self, account: &Account) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            username: account.username.clone(),
            exp: (now + Duration::hours(self.ttl_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Validate signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Generates a new password hash using argon2.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Uses argon2 to verify the password hash against the provided password.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("failed to parse password hash: {}", err);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// Stand-in checked when no usable account matches the login
static DECOY_HASH: Lazy<String> = Lazy::new(|| hash_password("sweet-pea-decoy").unwrap_or_default());

/// Like [`verify_password`], but still pays for one argon2 verification when
/// there is no stored hash. Always false in that case.
pub fn verify_password_or_decoy(password_hash: Option<&str>, password: &str) -> bool {
    match password_hash {
        Some(hash) => verify_password(hash, password),
        None => {
            verify_password(&DECOY_HASH, password);
            false
        }
    }
}

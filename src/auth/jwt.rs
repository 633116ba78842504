//! JWT Token Handler
//! Mint and verify the single fixed-lifetime bearer token

use crate::auth::models::{Claims, UserRole};
use crate::error::AuthError;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::debug;

/// Signs and verifies HS256 access tokens
pub struct TokenService {
    secret: String,
    expiration: Duration,
}

impl TokenService {
    pub fn new(secret: String, expiration: Duration) -> Self {
        Self { secret, expiration }
    }

    /// Generate a token for `subject` carrying `role`
    pub fn mint(&self, subject: &str, role: UserRole) -> Result<String> {
        if self.secret.is_empty() {
            bail!("JWT signing key is not configured");
        }

        let issued_at = Utc::now().timestamp();
        let lifetime = i64::try_from(self.expiration.as_secs()).context("Invalid token lifetime")?;
        let expires_at = issued_at
            .checked_add(lifetime.max(1))
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: issued_at as usize,
            exp: expires_at as usize,
        };

        debug!(
            "Generating JWT for {} ({}), expires in {}s",
            subject,
            role.as_str(),
            lifetime
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")
    }

    /// Validate signature and expiry, then return the payload
    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("Rejected JWT: {}", e);
            AuthError::TokenInvalid
        })?;

        Ok(decoded.claims)
    }

    /// True only for a well-formed, correctly signed, unexpired token issued to `expected_subject`
    pub fn verify(&self, token: &str, expected_subject: &str) -> bool {
        match self.claims(token) {
            Ok(claims) => claims.sub == expected_subject,
            Err(_) => false,
        }
    }
}

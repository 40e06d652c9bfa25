//! Verification of identity-provider ID tokens.
//!
//! The identity provider signs ID tokens with a shared HS256 secret. A
//! verified token is exchanged for a local access token on sign-in.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Claims carried by an identity-provider ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject identifier at the provider.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Shared HS256 secret used by the identity provider.
    pub secret: String,
}

impl IdentityConfig {
    /// Load from `IDENTITY_JWT_SECRET`.
    ///
    /// # Panics
    ///
    /// Panics if `IDENTITY_JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = lookup("IDENTITY_JWT_SECRET")
            .expect("IDENTITY_JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "IDENTITY_JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Verify an ID token's signature and expiry and return its claims.
pub fn verify_id_token(
    token: &str,
    config: &IdentityConfig,
) -> Result<IdentityClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

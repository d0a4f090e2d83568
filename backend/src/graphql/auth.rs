//! GraphQL authentication
//!
//! Bearer tokens are HS256 JWTs issued by the external session provider.
//! A verified user is attached to the request and used to stamp
//! `created_by_id` on new records; resolvers do not gate on it.

use async_graphql::{Context, ErrorExtensions, Result};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// User context extracted from JWT, available in GraphQL resolvers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    email: Option<String>,
    exp: i64,
}

/// Verify a JWT token and extract user info
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;

    let token_data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.trim().as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        async_graphql::Error::new(format!("Invalid token: {}", e))
            .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
    })?;

    tracing::debug!(user_id = %token_data.claims.sub, "JWT verified");

    Ok(AuthUser {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user if present
    fn try_auth_user(&self) -> Option<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn try_auth_user(&self) -> Option<&AuthUser> {
        self.data_opt::<AuthUser>()
    }
}

//! Bearer-token identity.
//!
//! Token issuance belongs to another service; this module only verifies
//! HS256 tokens and turns their claims into an [`Actor`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::authorization::{Actor, Role};
use crate::error::ApiError;
use crate::state::ApplicationState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingCredential,
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Resolves a request credential to the calling user and role.
pub trait IdentityVerifier: Send + Sync {
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] when the credential cannot be trusted.
    fn verify(&self, credential: &str) -> Result<Actor, AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<Actor, AuthError> {
        let token = jsonwebtoken::decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {e}");
                AuthError::InvalidToken
            })?;
        Ok(Actor::new(token.claims.sub, token.claims.role))
    }
}

/// Signs a token the way the identity service does. Used by local tooling and
/// tests.
///
/// # Errors
///
/// Returns the signing error from `jsonwebtoken`.
pub fn issue_token(
    user_id: &str,
    role: Role,
    secret: &str,
    valid_for: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = usize::try_from((Utc::now() + valid_for).timestamp()).unwrap_or(0);
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn bearer(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredential)
}

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Actor);

impl FromRequestParts<ApplicationState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApplicationState,
    ) -> Result<Self, Self::Rejection> {
        let verifier: &Arc<dyn IdentityVerifier> = &state.verifier;
        let actor = bearer(parts).and_then(|token| verifier.verify(token))?;
        Ok(Authenticated(actor))
    }
}

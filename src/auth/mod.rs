//! Bearer token authorization.
//!
//! Tokens are RS256-signed claim sets issued by an external identity provider.
//! This module only verifies them and reads the `permissions` claim:
//! - [`AuthConfig`] carries issuer, audience and accepted algorithms
//! - [`KeySource`] resolves a signing key by `kid` (fetched JWKS or a fixed set)
//! - [`TokenVerifier`] decodes, verifies and checks a required permission
//! - [`guard`] wires the verifier in front of individual routes

mod claims;
mod config;
pub mod guard;
mod keys;
mod verifier;

pub use claims::Claims;
pub use config::AuthConfig;
pub use keys::{JwksKeySource, KeySource, StaticKeySource};
pub use verifier::{bearer_token, check_permission, TokenVerifier};

use axum::http::StatusCode;

/// Well-known permission names
pub mod permissions {
    pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
    pub const POST_DRINKS: &str = "post:drinks";
    pub const PATCH_DRINKS: &str = "patch:drinks";
    pub const DELETE_DRINKS: &str = "delete:drinks";
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is malformed")]
    InvalidHeader,
    #[error("token has expired")]
    TokenExpired,
    #[error("token audience or issuer does not match")]
    InvalidClaims,
    #[error("no signing key matches the token key id")]
    UnknownKey,
    #[error("token carries no permissions claim")]
    MissingPermissions,
    #[error("permission {0} not granted")]
    Forbidden(String),
    #[error("signing keys unavailable: {0}")]
    KeySetUnavailable(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader => StatusCode::BAD_REQUEST,
            AuthError::InvalidHeader => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::UnknownKey => StatusCode::BAD_REQUEST,
            AuthError::MissingPermissions => StatusCode::BAD_REQUEST,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::KeySetUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing header",
            AuthError::InvalidHeader | AuthError::UnknownKey => "invalid header",
            AuthError::TokenExpired => "token expired",
            AuthError::InvalidClaims | AuthError::MissingPermissions => "invalid claims",
            AuthError::Forbidden(_) => "unauthorized",
            AuthError::KeySetUnavailable(_) => "internal server error",
        }
    }
}

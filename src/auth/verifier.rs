use std::sync::Arc;

use axum::http::HeaderValue;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

use super::{AuthConfig, AuthError, Claims, JwksKeySource, KeySource, StaticKeySource};
use crate::errors::AppError;

#[derive(Clone)]
pub struct TokenVerifier {
    config: Arc<AuthConfig>,
    keys: Arc<dyn KeySource>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").field("config", &self.config).finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: AuthConfig, keys: Arc<dyn KeySource>) -> Self {
        Self {
            config: Arc::new(config),
            keys,
        }
    }

    /// Uses the local JWKS file when configured, the issuer's published set otherwise.
    pub fn from_config(config: AuthConfig) -> Result<Self, AppError> {
        let keys: Arc<dyn KeySource> = match &config.jwks_file {
            Some(path) => Arc::new(StaticKeySource::from_file(path)?),
            None => Arc::new(
                JwksKeySource::new(config.jwks_url(), config.jwks_ttl).with_min_refresh(config.jwks_min_refresh),
            ),
        };
        Ok(Self::new(config, keys))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify signature, expiry, audience and issuer of `token`.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidHeader)?;
        if !self.config.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidHeader);
        }
        let kid = header.kid.as_deref().ok_or(AuthError::InvalidHeader)?;

        let jwk = self.keys.key(kid).await?.ok_or(AuthError::UnknownKey)?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::InvalidHeader)?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.leeway_secs;
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer | ErrorKind::MissingRequiredClaim(_) => {
                    AuthError::InvalidClaims
                }
                _ => AuthError::InvalidHeader,
            })
    }

    /// Full check for a protected route: header, token, then `permission`.
    pub async fn authorize(&self, header: Option<&HeaderValue>, permission: &str) -> Result<Claims, AuthError> {
        let token = bearer_token(header)?;
        let claims = self.verify(token).await?;
        check_permission(&claims, permission)?;
        Ok(claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(*token),
        _ => Err(AuthError::InvalidHeader),
    }
}

pub fn check_permission(claims: &Claims, permission: &str) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::MissingPermissions);
    }
    if !claims.has_permission(permission) {
        return Err(AuthError::Forbidden(permission.to_string()));
    }
    Ok(())
}

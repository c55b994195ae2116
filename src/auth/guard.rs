//! Per-route permission guard.
//!
//! Attached with `route_layer` next to the handler it protects, so every
//! protected route names its permission where it is declared. The guard runs
//! before the handler and before any storage access.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use super::TokenVerifier;
use crate::app::AppState;
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct Guard {
    verifier: TokenVerifier,
    permission: &'static str,
}

impl Guard {
    pub fn new(state: &AppState, permission: &'static str) -> Self {
        Self {
            verifier: state.verifier.clone(),
            permission,
        }
    }
}

/// Verify the bearer token, require the guard's permission and hand the
/// claims to the handler through request extensions.
pub async fn enforce(State(guard): State<Guard>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let claims = match guard
        .verifier
        .authorize(request.headers().get(AUTHORIZATION), guard.permission)
        .await
    {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(
                permission = %guard.permission,
                method = %request.method(),
                path = %request.uri().path(),
                reason = %err,
                "access denied"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        subject = %claims.subject(),
        permission = %guard.permission,
        expires_at = ?claims.expires_at(),
        "permission granted"
    );

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

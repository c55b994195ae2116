use axum::http::header::{ALLOW, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{from_fn_with_state, map_response};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::guard::{self, Guard};
use crate::auth::{permissions, AuthConfig, TokenVerifier};
use crate::errors::{AppError, AppResult};
use crate::routes::{drinks, health};

/// Application context shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub verifier: TokenVerifier,
}

impl AppState {
    pub fn new(pool: SqlitePool, verifier: TokenVerifier) -> Self {
        Self { pool, verifier }
    }

    pub fn from_env(pool: SqlitePool) -> AppResult<Self> {
        let config = AuthConfig::from_env()?;
        let verifier = TokenVerifier::from_config(config)?;
        Ok(Self::new(pool, verifier))
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    // each protected route declares the permission it needs
    let post_drinks = Guard::new(&state, permissions::POST_DRINKS);
    let get_detail = Guard::new(&state, permissions::GET_DRINKS_DETAIL);
    let patch_drinks = Guard::new(&state, permissions::PATCH_DRINKS);
    let delete_drinks = Guard::new(&state, permissions::DELETE_DRINKS);

    Router::new()
        .route("/drinks", get(drinks::list_drinks))
        .route(
            "/drinks",
            post(drinks::create_drink).route_layer(from_fn_with_state(post_drinks, guard::enforce)),
        )
        .route(
            "/drinks-detail",
            get(drinks::list_drinks_detail).route_layer(from_fn_with_state(get_detail, guard::enforce)),
        )
        .route(
            "/drinks",
            patch(drinks::missing_id).route_layer(from_fn_with_state(patch_drinks.clone(), guard::enforce)),
        )
        .route(
            "/drinks",
            delete(drinks::missing_id).route_layer(from_fn_with_state(delete_drinks.clone(), guard::enforce)),
        )
        .route(
            "/drinks/:id",
            patch(drinks::update_drink).route_layer(from_fn_with_state(patch_drinks, guard::enforce)),
        )
        .route(
            "/drinks/:id",
            delete(drinks::delete_drink).route_layer(from_fn_with_state(delete_drinks, guard::enforce)),
        )
        .route("/api/health", get(health::health))
        .fallback(fallback)
        .with_state(state)
        .layer(map_response(method_not_allowed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn fallback(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

/// The router answers a known path with an unsupported method by an empty
/// 405; give it the error envelope and keep the `Allow` header.
async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut enveloped = AppError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(ALLOW, allow);
    }
    enveloped
}

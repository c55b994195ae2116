use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the drinks table is readable, `degraded` otherwise.
    pub status: &'static str,
    pub db_ok: bool,
    /// Number of drinks on the menu.
    pub drinks: Option<i64>,
    /// Version of the latest applied migration.
    pub schema_version: Option<i64>,
    pub db_error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Menu storage status", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    match menu_status(&state.pool).await {
        Ok((drinks, schema_version)) => Ok(Json(HealthResponse {
            status: "ok",
            db_ok: true,
            drinks: Some(drinks),
            schema_version,
            db_error: None,
        })),
        Err(err) => {
            tracing::warn!(error = %err, "health check could not read the drinks table");
            Ok(Json(HealthResponse {
                status: "degraded",
                db_ok: false,
                drinks: None,
                schema_version: None,
                db_error: Some(err.to_string()),
            }))
        }
    }
}

async fn menu_status(pool: &SqlitePool) -> Result<(i64, Option<i64>), sqlx::Error> {
    let drinks = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM drinks")
        .fetch_one(pool)
        .await?;
    let schema_version = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;
    Ok((drinks, schema_version))
}

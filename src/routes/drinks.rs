use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Claims;
use crate::db::drinks;
use crate::errors::{AppError, AppResult};
use crate::models::drink::{
    DeleteDrinkResponse, Drink, DrinkCreateRequest, DrinkUpdateRequest, LongDrinksResponse, ShortDrinksResponse,
};

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses((status = 200, description = "Menu with short recipes", body = ShortDrinksResponse))
)]
pub async fn list_drinks(State(state): State<AppState>) -> AppResult<Json<ShortDrinksResponse>> {
    let drinks = drinks::list(&state.pool).await?;

    Ok(Json(ShortDrinksResponse {
        success: true,
        drinks: drinks.iter().map(Drink::short).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearerAuth" = ["get:drinks-detail"])),
    responses(
        (status = 200, description = "Menu with full recipes", body = LongDrinksResponse),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Missing get:drinks-detail")
    )
)]
pub async fn list_drinks_detail(State(state): State<AppState>) -> AppResult<Json<LongDrinksResponse>> {
    let drinks = drinks::list(&state.pool).await?;

    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: drinks.iter().map(Drink::long).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/drinks",
    tag = "Drinks",
    security(("bearerAuth" = ["post:drinks"])),
    request_body = DrinkCreateRequest,
    responses(
        (status = 200, description = "Drink created", body = LongDrinksResponse),
        (status = 422, description = "Title or recipe missing"),
        (status = 500, description = "Storage rejected the drink, e.g. duplicate title")
    )
)]
pub async fn create_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<LongDrinksResponse>> {
    let payload: DrinkCreateRequest = parse_body(body)?;
    let new_drink = payload.validate()?;

    let drink = drinks::insert(&state.pool, &new_drink).await?;
    tracing::info!(drink_id = drink.id, title = %drink.title, subject = %claims.subject(), "drink created");

    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    tag = "Drinks",
    security(("bearerAuth" = ["patch:drinks"])),
    params(("id" = i64, Path, description = "Drink id")),
    request_body = DrinkUpdateRequest,
    responses(
        (status = 200, description = "Drink updated", body = LongDrinksResponse),
        (status = 400, description = "Id missing or not a positive integer"),
        (status = 404, description = "Drink not found")
    )
)]
pub async fn update_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<LongDrinksResponse>> {
    let id = parse_id(id)?;
    let payload: DrinkUpdateRequest = parse_body(body)?;

    let mut drink = fetch_drink(&state, id).await?;
    payload.apply_to(&mut drink)?;

    drinks::update(&state.pool, &drink).await?;
    tracing::info!(drink_id = drink.id, subject = %claims.subject(), "drink updated");

    Ok(Json(LongDrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    tag = "Drinks",
    security(("bearerAuth" = ["delete:drinks"])),
    params(("id" = i64, Path, description = "Drink id")),
    responses(
        (status = 200, description = "Drink deleted", body = DeleteDrinkResponse),
        (status = 400, description = "Id missing or not a positive integer"),
        (status = 404, description = "Drink not found")
    )
)]
pub async fn delete_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<String>, PathRejection>,
) -> AppResult<Json<DeleteDrinkResponse>> {
    let id = parse_id(id)?;
    let drink = fetch_drink(&state, id).await?;

    drinks::delete(&state.pool, &drink).await?;
    tracing::info!(drink_id = drink.id, subject = %claims.subject(), "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: drink.id,
    }))
}

/// `PATCH /drinks` and `DELETE /drinks` without an id segment.
pub async fn missing_id() -> AppError {
    AppError::bad_request("drink id is required")
}

async fn fetch_drink(state: &AppState, id: i64) -> AppResult<Drink> {
    drinks::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("drink {id}")))
}

/// Storage assigns ids from 1, so anything else cannot name a drink.
fn parse_id(id: Result<Path<String>, PathRejection>) -> AppResult<i64> {
    let Path(raw) = id.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(format!("invalid drink id: {raw}"))),
    }
}

fn parse_body<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> AppResult<T> {
    let Json(value) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    if !value.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }

    serde_path_to_error::deserialize(value)
        .map_err(|err| AppError::unprocessable(format!("{}: {}", err.path(), err.inner())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id(Ok(Path("12".to_string()))).unwrap(), 12);
        for raw in ["0", "-3", "abc", ""] {
            assert!(
                matches!(parse_id(Ok(Path(raw.to_string()))), Err(AppError::BadRequest(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn body_must_be_an_object() {
        let err = parse_body::<DrinkUpdateRequest>(Ok(Json(serde_json::json!([1, 2])))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = parse_body::<DrinkUpdateRequest>(Ok(Json(serde_json::json!({"title": 5})))).unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(_)));
    }
}

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::drinks::list_drinks,
		routes::drinks::list_drinks_detail,
		routes::drinks::create_drink,
		routes::drinks::update_drink,
		routes::drinks::delete_drink,
		routes::health::health
	),
	components(
		schemas(
			models::drink::Ingredient,
			models::drink::ShortIngredient,
			models::drink::ShortDrink,
			models::drink::LongDrink,
			models::drink::DrinkCreateRequest,
			models::drink::DrinkUpdateRequest,
			models::drink::ShortDrinksResponse,
			models::drink::LongDrinksResponse,
			models::drink::DeleteDrinkResponse,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Drinks", description = "Drink menu and recipes"),
		(name = "Health", description = "Service health")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_error_schema(&mut doc)?;
	ensure_servers(&mut doc, port)?;

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn object_entry<'a>(parent: &'a mut Value, key: &str) -> anyhow::Result<&'a mut Map<String, Value>> {
	parent
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI node must be an object"))?
		.entry(key)
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI `{key}` must be an object"))
}

fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let components = object_entry(doc, "components")?;
	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));

	object_entry_insert(
		schemes,
		"bearerAuth",
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT",
			"description": "RS256 token from the identity provider carrying a `permissions` claim"
		}),
	)
}

fn ensure_error_schema(doc: &mut Value) -> anyhow::Result<()> {
	let components = object_entry(doc, "components")?;
	let schemas = components
		.entry("schemas")
		.or_insert_with(|| Value::Object(Map::new()));

	object_entry_insert(
		schemas,
		"ErrorResponse",
		json!({
			"type": "object",
			"required": ["success", "error", "message"],
			"properties": {
				"success": {"type": "boolean", "example": false},
				"error": {"type": "integer", "example": 404},
				"message": {"type": "string", "example": "resource not found"}
			}
		}),
	)
}

fn ensure_servers(doc: &mut Value, port: u16) -> anyhow::Result<()> {
	let root = doc
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))?;
	root.entry("servers")
		.or_insert_with(|| json!([{ "url": format!("http://localhost:{}", port) }]));
	Ok(())
}

fn object_entry_insert(target: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
	target
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI node must be an object"))?
		.entry(key)
		.or_insert(value);
	Ok(())
}

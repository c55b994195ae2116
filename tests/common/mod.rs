#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use coffee_shop::auth::{AuthConfig, KeySource, StaticKeySource, TokenVerifier};
use coffee_shop::{create_app, AppState};

pub const DOMAIN: &str = "coffee.test.auth0.com";
pub const AUDIENCE: &str = "coffee-shop";
pub const KID: &str = "test-key-1";

const PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");

pub const ALL_PERMISSIONS: [&str; 4] = ["get:drinks-detail", "post:drinks", "patch:drinks", "delete:drinks"];

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
}

pub async fn spawn_app() -> Result<TestApp> {
    let jwks: JwkSet = serde_json::from_str(JWKS)?;
    spawn_app_with_keys(Arc::new(StaticKeySource::new(jwks))).await
}

pub async fn spawn_app_with_keys(keys: Arc<dyn KeySource>) -> Result<TestApp> {
    let dir = tempdir()?;
    let db_path = dir.path().join("drinks.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    // run migrations from crate migrations folder
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let verifier = TokenVerifier::new(AuthConfig::new(DOMAIN, AUDIENCE), keys);
    let router = create_app(AppState::new(pool.clone(), verifier));

    Ok(TestApp { router, pool, _dir: dir })
}

pub fn claims(permissions: &[&str]) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": "auth0|test-barista",
        "iss": format!("https://{}/", DOMAIN),
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

pub fn sign(claims: &Value) -> String {
    sign_with_kid(claims, KID)
}

pub fn sign_with_kid(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).expect("fixture key");
    encode(&header, claims, &key).expect("sign token")
}

pub fn token(permissions: &[&str]) -> String {
    sign(&claims(permissions))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Send a request and decode the JSON response body.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = router.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

pub async fn drink_count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM drinks")
        .fetch_one(pool)
        .await?)
}

pub async fn create_drink(app: &TestApp, title: &str, recipe: Value) -> Result<Value> {
    let token = token(&["post:drinks"]);
    let (status, body) = send(
        &app.router,
        "POST",
        "/drinks",
        Some(&bearer(&token)),
        Some(json!({ "title": title, "recipe": recipe })),
    )
    .await?;
    if status != StatusCode::OK {
        panic!("create failed: {} - {}", status, body);
    }
    Ok(body["drinks"][0].clone())
}

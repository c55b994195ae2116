mod common;

use std::path::Path;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use coffee_shop::auth::{AuthConfig, TokenVerifier};
use common::{bearer, claims, drink_count, send, sign, spawn_app, token, ALL_PERMISSIONS, AUDIENCE, DOMAIN};

#[tokio::test]
async fn drinks_detail_requires_a_permitted_token() -> Result<()> {
    let app = spawn_app().await?;

    // 1. No header
    let (status, body) = send(&app.router, "GET", "/drinks-detail", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": 400, "message": "missing header"}));

    // 2. Malformed header
    for header in ["Token abc", "Bearer", "Bearer a b"] {
        let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(header), None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(body["message"], "invalid header");
    }

    // 3. Garbage token
    let (status, _) = send(&app.router, "GET", "/drinks-detail", Some("Bearer not.a.jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 4. Valid token without the permission
    let other = bearer(&token(&["post:drinks", "patch:drinks"]));
    let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(&other), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"success": false, "error": 403, "message": "unauthorized"}));

    // 5. Valid token with the permission
    let reader = bearer(&token(&["get:drinks-detail"]));
    let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(&reader), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "drinks": []}));

    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected_regardless_of_permissions() -> Result<()> {
    let app = spawn_app().await?;

    let mut expired = claims(&ALL_PERMISSIONS);
    expired["exp"] = json!(Utc::now().timestamp() - 3600);
    let auth = bearer(&sign(&expired));

    for (method, uri) in [("GET", "/drinks-detail"), ("DELETE", "/drinks/1")] {
        let (status, body) = send(&app.router, method, uri, Some(&auth), None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["message"], "token expired");
    }

    Ok(())
}

#[tokio::test]
async fn token_is_rejected_as_soon_as_it_expires() -> Result<()> {
    let app = spawn_app().await?;

    let mut just_expired = claims(&ALL_PERMISSIONS);
    just_expired["exp"] = json!(Utc::now().timestamp() - 30);
    let auth = bearer(&sign(&just_expired));

    let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(&auth), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "error": 401, "message": "token expired"}));

    Ok(())
}

#[tokio::test]
async fn claims_are_checked() -> Result<()> {
    let app = spawn_app().await?;

    let mut wrong_audience = claims(&ALL_PERMISSIONS);
    wrong_audience["aud"] = json!("another-api");
    let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(&bearer(&sign(&wrong_audience))), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid claims");

    let mut no_permissions = claims(&[]);
    no_permissions.as_object_mut().expect("claims object").remove("permissions");
    let (status, body) = send(&app.router, "GET", "/drinks-detail", Some(&bearer(&sign(&no_permissions))), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid claims");

    Ok(())
}

#[tokio::test]
async fn guard_runs_before_storage() -> Result<()> {
    let app = spawn_app().await?;
    let payload = json!({"title": "Sneaky", "recipe": []});

    let (status, _) = send(&app.router, "POST", "/drinks", None, Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reader = bearer(&token(&["get:drinks-detail"]));
    let (status, _) = send(&app.router, "POST", "/drinks", Some(&reader), Some(payload)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // missing id is only reported to callers allowed to patch
    let (status, _) = send(&app.router, "PATCH", "/drinks", Some(&reader), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(drink_count(&app.pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn public_menu_needs_no_token() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = send(&app.router, "GET", "/drinks", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "drinks": []}));

    Ok(())
}

#[tokio::test]
async fn verifier_can_load_keys_from_a_jwks_file() -> Result<()> {
    let mut config = AuthConfig::new(DOMAIN, AUDIENCE);
    config.jwks_file = Some(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/jwks.json"));
    let verifier = TokenVerifier::from_config(config)?;

    let claims = verifier.verify(&token(&["post:drinks"])).await?;
    assert!(claims.has_permission("post:drinks"));

    let mut missing = AuthConfig::new(DOMAIN, AUDIENCE);
    missing.jwks_file = Some(Path::new("/nonexistent/jwks.json").to_path_buf());
    assert!(TokenVerifier::from_config(missing).is_err());

    Ok(())
}

mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, PASSWORD};
use serde_json::json;

use kmci_api::auth::Role;

#[tokio::test]
async fn login_returns_token_identity_and_cookie() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.login("EDITOR@kmci.test", PASSWORD).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(res.body["data"]["expires_at"].is_string());
    assert_eq!(res.body["data"]["user"]["email"], "editor@kmci.test");
    assert_eq!(res.body["data"]["user"]["role"], "editor");
    assert!(res.body["meta"]["duration"].is_string());

    let cookie = res.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("kmci_session="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"));
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.request(Method::POST, "/auth/login", None, Some(json!({"email": ""}))).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["details"]["email"].is_string());
    assert!(res.body["details"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() -> Result<()> {
    let app = TestApp::new().await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let res = app.send(request).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_identical() -> Result<()> {
    let app = TestApp::new().await?;
    let unknown = app.login("nobody@kmci.test", PASSWORD).await?;
    let wrong = app.login("viewer@kmci.test", "not-the-password").await?;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["error"], wrong.body["error"]);
    assert_eq!(unknown.body["code"], wrong.body["code"]);
    Ok(())
}

#[tokio::test]
async fn repeated_failures_lock_the_account_until_unlocked() -> Result<()> {
    let app = TestApp::new().await?;
    let email = app.user(Role::Viewer).email.clone();

    // Test config allows three attempts
    for _ in 0..3 {
        let res = app.login(&email, "wrong-password").await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    let locked = app.login(&email, PASSWORD).await?;
    assert_eq!(locked.status, StatusCode::UNAUTHORIZED);
    assert_eq!(locked.body["error"], "Invalid email or password");

    let admin = app.token_for(Role::SuperAdmin).await?;
    let uri = format!("/api/users/{}/unlock", app.user(Role::Viewer).id);
    let res = app.request(Method::POST, &uri, Some(&admin), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["unlocked"], true);

    let res = app.login(&email, PASSWORD).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn whoami_needs_a_session() -> Result<()> {
    let app = TestApp::new().await?;

    let res = app.get("/api/auth/whoami", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Authentication required");

    let token = app.token_for(Role::Finance).await?;
    let res = app.get("/api/auth/whoami", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["role"], "finance");
    assert_eq!(res.body["data"]["id"], app.user(Role::Finance).id.to_string());
    Ok(())
}

#[tokio::test]
async fn session_cookie_authenticates() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for(Role::Editor).await?;

    let request = Request::builder()
        .uri("/api/auth/whoami")
        .header(header::COOKIE, format!("theme=dark; kmci_session={}", token))
        .body(Body::empty())?;
    let res = app.send(request).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["email"], "editor@kmci.test");
    Ok(())
}

#[tokio::test]
async fn bad_token_is_rejected_even_on_public_routes() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.get("/api/products", Some("not.a.token")).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn deactivated_profile_loses_access() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for(Role::Editor).await?;

    assert!(app.accounts.set_profile_active(app.user(Role::Editor).id, false).await);

    let res = app.get("/api/auth/whoami", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Account is inactive");

    let res = app.login("editor@kmci.test", PASSWORD).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn user_administration_is_super_admin_only() -> Result<()> {
    let app = TestApp::new().await?;
    let body = json!({
        "email": "New.Person@KMCI.test",
        "password": "long-enough-password",
        "display_name": "New Person",
        "role": "editor",
    });

    let res = app.request(Method::POST, "/api/users", None, Some(body.clone())).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let editor = app.token_for(Role::Editor).await?;
    let res = app.request(Method::POST, "/api/users", Some(&editor), Some(body.clone())).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let admin = app.token_for(Role::SuperAdmin).await?;
    let res = app.request(Method::POST, "/api/users", Some(&admin), Some(body.clone())).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["email"], "new.person@kmci.test");
    assert_eq!(res.body["data"]["role"], "editor");
    assert!(res.body["data"].get("password_hash").is_none());

    let res = app.request(Method::POST, "/api/users", Some(&admin), Some(body)).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["code"], "DUPLICATE_VALUE");

    let res = app.login("new.person@kmci.test", "long-enough-password").await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn user_creation_validates_input() -> Result<()> {
    let app = TestApp::new().await?;
    let admin = app.token_for(Role::SuperAdmin).await?;
    let body = json!({"email": "nope", "password": "short", "display_name": "", "role": "owner"});

    let res = app.request(Method::POST, "/api/users", Some(&admin), Some(body)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    for field in ["email", "password", "display_name", "role"] {
        assert!(res.body["details"][field].is_string(), "missing {} in {}", field, res.body);
    }
    Ok(())
}

#[tokio::test]
async fn password_change_requires_the_current_password() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for(Role::Viewer).await?;

    let res = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({"current_password": "wrong-password", "new_password": "brand-new-password"})),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .request(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({"current_password": PASSWORD, "new_password": "brand-new-password"})),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    assert_eq!(app.login("viewer@kmci.test", PASSWORD).await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("viewer@kmci.test", "brand-new-password").await?.status, StatusCode::OK);
    Ok(())
}

//! Integration tests for accounts and authentication.
//!
//! Run with a live server: `cargo test -p catalog-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{TestContext, test_image_png, unique_email};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_duplicate_email_registration_conflicts() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let email = unique_email("dup");
    let body = serde_json::json!({
        "name": "First",
        "email": email,
        "password": "first-password",
        "role": "user",
    });

    let first = ctx
        .client
        .post(ctx.url("/api/users/register"))
        .bearer_auth(&admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .client
        .post(ctx.url("/api/users/register"))
        .bearer_auth(&admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // The first account is intact and can still log in.
    ctx.login(&email, "first-password").await;
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_login_failure_is_uniform() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let (email, _password) = ctx.register_user(&admin, "user").await;

    let wrong_password = ctx
        .client
        .post(ctx.url("/api/users/login"))
        .json(&serde_json::json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    let unknown_email = ctx
        .client
        .post(ctx.url("/api/users/login"))
        .json(&serde_json::json!({
            "email": unique_email("ghost"),
            "password": "wrong",
        }))
        .send()
        .await
        .unwrap();

    // Same status, same body: the response must not reveal which accounts
    // exist.
    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_register_requires_admin() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let (email, password) = ctx.register_user(&admin, "user").await;
    let user_token = ctx.login(&email, &password).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/users/register"))
        .bearer_auth(&user_token)
        .json(&serde_json::json!({
            "name": "Sneaky",
            "email": unique_email("sneaky"),
            "password": "password",
            "role": "admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_user_listing_never_exposes_password_hash() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let resp = ctx
        .client
        .get(ctx.url("/api/users"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let users = body["users"].as_array().unwrap();
    assert!(!users.is_empty());
    assert_eq!(body["total"].as_i64().unwrap(), users.len() as i64);
    for user in users {
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());
    }
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_profile_picture_upload_replaces_previous() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let (email, password) = ctx.register_user(&admin, "user").await;
    let token = ctx.login(&email, &password).await;

    let upload = async |payload: Vec<u8>| {
        let form = Form::new().part("profile", Part::bytes(payload).file_name("me.png"));
        let resp = ctx
            .client
            .post(ctx.url("/api/users/upload-profile-pic"))
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    };

    upload(test_image_png(200, 200)).await;
    let me: Value = ctx
        .client
        .get(ctx.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let first = me["profile"].as_str().unwrap().to_owned();

    upload(test_image_png(400, 300)).await;
    let me: Value = ctx
        .client
        .get(ctx.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second = me["profile"].as_str().unwrap().to_owned();

    // The reference points only at the new file, and the old file is gone
    // from the image store.
    assert_ne!(first, second);
    let old = ctx
        .client
        .get(ctx.url(&format!("/api/images/{first}")))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::NOT_FOUND);
    let new = ctx
        .client
        .get(ctx.url(&format!("/api/images/{second}")))
        .send()
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_password_change_requires_old_password() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let (email, password) = ctx.register_user(&admin, "user").await;
    let token = ctx.login(&email, &password).await;

    let wrong = ctx
        .client
        .put(ctx.url("/api/users/update-password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "oldPassword": "not-the-password",
            "newPassword": "new-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

    let right = ctx
        .client
        .put(ctx.url("/api/users/update-password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "oldPassword": password,
            "newPassword": "new-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(right.status(), StatusCode::OK);

    // Old password no longer works, new one does.
    let stale = ctx
        .client
        .post(ctx.url("/api/users/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::BAD_REQUEST);
    ctx.login(&email, "new-password").await;
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_requests_without_token_are_rejected() {
    let ctx = TestContext::new();

    for path in ["/api/users/me", "/api/users", "/api/products"] {
        let resp = ctx.client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {path}"
        );
    }
}

//! Integration tests for Partner Catalog.
//!
//! These tests exercise a running server over HTTP; they are `#[ignore]`d
//! by default and expect:
//!
//! - A running `PostgreSQL` database with migrations applied
//!   (`cargo run -p catalog-cli -- migrate`)
//! - A running server (`cargo run -p catalog-server`)
//! - A bootstrapped admin account
//!   (`catalog-cli admin create -e admin@example.com -n Admin`)
//!
//! # Environment Variables
//!
//! - `CATALOG_BASE_URL` - server under test (default: `http://localhost:3000`)
//! - `CATALOG_TEST_ADMIN_EMAIL` / `CATALOG_TEST_ADMIN_PASSWORD` - admin
//!   credentials (default: `admin@example.com` / `admin-password`)
//!
//! Run with: `cargo test -p catalog-integration-tests -- --ignored`

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;

use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde_json::Value;
use uuid::Uuid;

/// Client plus server address for one test run.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build a context from the environment.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("CATALOG_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Login and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/users/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");
        let body: Value = resp.json().await.expect("login body");
        body["token"].as_str().expect("token").to_owned()
    }

    /// Login with the configured admin credentials.
    pub async fn admin_token(&self) -> String {
        let email = std::env::var("CATALOG_TEST_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@example.com".to_owned());
        let password = std::env::var("CATALOG_TEST_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "admin-password".to_owned());
        self.login(&email, &password).await
    }

    /// Register a fresh account via the API and return its credentials.
    pub async fn register_user(&self, admin_token: &str, role: &str) -> (String, String) {
        let email = unique_email(role);
        let password = "test-password".to_owned();
        let resp = self
            .client
            .post(self.url("/api/users/register"))
            .bearer_auth(admin_token)
            .json(&serde_json::json!({
                "name": format!("Test {role}"),
                "email": email,
                "password": password,
                "role": role,
            }))
            .send()
            .await
            .expect("register request");
        assert_eq!(resp.status(), StatusCode::CREATED, "register failed");
        (email, password)
    }

    /// Create a product with a logo via multipart upload.
    ///
    /// `assigned_to` of `None` lets the server default to the creator.
    pub async fn create_product(
        &self,
        token: &str,
        name: &str,
        sku: &str,
        category: &str,
        assigned_to: Option<&[i64]>,
    ) -> reqwest::Response {
        let mut form = Form::new()
            .text("name", name.to_owned())
            .text("sku", sku.to_owned())
            .text("category", category.to_owned())
            .part(
                "logo",
                Part::bytes(test_image_png(640, 480)).file_name("logo.png"),
            );
        if let Some(ids) = assigned_to {
            form = form.text("assignedTo", serde_json::to_string(ids).unwrap());
        }

        self.client
            .post(self.url("/api/products"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("create product request")
    }

    /// Find a product by exact SKU via the search filter.
    pub async fn find_product_by_sku(&self, token: &str, sku: &str) -> Option<Value> {
        let resp = self
            .client
            .get(self.url("/api/products"))
            .bearer_auth(token)
            .query(&[("search", sku)])
            .send()
            .await
            .expect("list request");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("list body");
        body["products"]
            .as_array()?
            .iter()
            .find(|p| p["sku"] == sku)
            .cloned()
    }
}

/// A unique email per test run, so reruns never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// A unique SKU per test run.
#[must_use]
pub fn unique_sku(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// A small valid PNG for upload tests.
#[must_use]
pub fn test_image_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([40, 90, 220]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .expect("encode test image");
    buf.into_inner()
}

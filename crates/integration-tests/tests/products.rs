//! Integration tests for the product directory and upload lifecycle.
//!
//! Run with a live server: `cargo test -p catalog-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{TestContext, unique_sku};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_duplicate_sku_conflicts_and_first_wins() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let sku = unique_sku("DUP");

    let first = ctx
        .create_product(&admin, "First", &sku, "Hardware", None)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .create_product(&admin, "Second", &sku, "Hardware", None)
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // The surviving record is the first one, logo intact.
    let product = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    assert_eq!(product["name"], "First");
    let logo = product["logo"].as_str().unwrap();
    let img = ctx
        .client
        .get(ctx.url(&format!("/api/images/{logo}")))
        .send()
        .await
        .unwrap();
    assert_eq!(img.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_non_admin_sees_only_assigned_products() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let (email_a, password_a) = ctx.register_user(&admin, "user").await;
    let token_a = ctx.login(&email_a, &password_a).await;
    let (email_b, password_b) = ctx.register_user(&admin, "user").await;
    let token_b = ctx.login(&email_b, &password_b).await;

    let id_a = me_id(&ctx, &token_a).await;
    let id_b = me_id(&ctx, &token_b).await;

    let sku_a = unique_sku("VIS-A");
    let sku_b = unique_sku("VIS-B");
    assert_eq!(
        ctx.create_product(&admin, "For A", &sku_a, "Visibility", Some(&[id_a]))
            .await
            .status(),
        StatusCode::CREATED
    );
    assert_eq!(
        ctx.create_product(&admin, "For B", &sku_b, "Visibility", Some(&[id_b]))
            .await
            .status(),
        StatusCode::CREATED
    );

    // A sees only A's product, whatever filters A supplies.
    for query in [vec![], vec![("category", "Visibility")], vec![("search", "For")]] {
        let body: Value = ctx
            .client
            .get(ctx.url("/api/products"))
            .bearer_auth(&token_a)
            .query(&query)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let skus: Vec<&str> = body["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["sku"].as_str().unwrap())
            .collect();
        assert!(skus.contains(&sku_a.as_str()), "A must see own product");
        assert!(!skus.contains(&sku_b.as_str()), "A must not see B's product");
    }

    // The admin sees both.
    let body: Value = ctx
        .client
        .get(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .query(&[("category", "Visibility")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let skus: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["sku"].as_str().unwrap())
        .collect();
    assert!(skus.contains(&sku_a.as_str()));
    assert!(skus.contains(&sku_b.as_str()));
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_assign_replaces_ownership_list() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let (email_a, password_a) = ctx.register_user(&admin, "user").await;
    let token_a = ctx.login(&email_a, &password_a).await;
    let (email_b, password_b) = ctx.register_user(&admin, "user").await;
    let token_b = ctx.login(&email_b, &password_b).await;
    let id_a = me_id(&ctx, &token_a).await;
    let id_b = me_id(&ctx, &token_b).await;

    let sku = unique_sku("ASSIGN");
    assert_eq!(
        ctx.create_product(&admin, "Reassigned", &sku, "Assignment", Some(&[id_b]))
            .await
            .status(),
        StatusCode::CREATED
    );
    let product = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    let product_id = product["id"].as_i64().unwrap();

    let resp = ctx
        .client
        .post(ctx.url("/api/products/assign"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "productId": product_id,
            "userId": id_a,
            "assignedTo": [id_a],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Replace, never union: exactly {A} now.
    let product = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    assert_eq!(product["assignedTo"], serde_json::json!([id_a]));
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_assign_is_admin_only() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let (email, password) = ctx.register_user(&admin, "user").await;
    let token = ctx.login(&email, &password).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/products/assign"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "productId": 1,
            "userId": 1,
            "assignedTo": [1],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_pagination_window_and_unbounded_limit() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let category = format!("Page-{}", unique_sku("C"));
    for i in 0..7 {
        let sku = unique_sku(&format!("PAGE{i}"));
        assert_eq!(
            ctx.create_product(&admin, &format!("Paged {i:02}"), &sku, &category, None)
                .await
                .status(),
            StatusCode::CREATED
        );
    }

    // limit=0 returns everything in one page, total = full count.
    let all: Value = ctx
        .client
        .get(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .query(&[("category", category.as_str()), ("limit", "0")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["total"].as_i64().unwrap(), 7);
    assert_eq!(all["products"].as_array().unwrap().len(), 7);

    // limit=5&page=2 returns records 6-7 of the sorted set; total is still 7.
    let page2: Value = ctx
        .client
        .get(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .query(&[
            ("category", category.as_str()),
            ("limit", "5"),
            ("page", "2"),
            ("sort", "name"),
            ("order", "asc"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page2["total"].as_i64().unwrap(), 7);
    let names: Vec<&str> = page2["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Paged 05", "Paged 06"]);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_logo_roundtrip_is_normalized_square() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let sku = unique_sku("IMG");
    assert_eq!(
        ctx.create_product(&admin, "Pictured", &sku, "Imaging", None)
            .await
            .status(),
        StatusCode::CREATED
    );

    let product = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    let product_id = product["id"].as_i64().unwrap();

    // Fetch by id, follow the logo reference, decode the served bytes.
    let by_id: Value = ctx
        .client
        .get(ctx.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let logo = by_id["logo"].as_str().unwrap();

    let bytes = ctx
        .client
        .get(ctx.url(&format!("/api/images/{logo}")))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (300, 300));
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_update_replaces_logo_and_keeps_unsupplied_fields() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let sku = unique_sku("UPD");
    assert_eq!(
        ctx.create_product(&admin, "Before", &sku, "Updating", None)
            .await
            .status(),
        StatusCode::CREATED
    );
    let before = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    let product_id = before["id"].as_i64().unwrap();
    let old_logo = before["logo"].as_str().unwrap().to_owned();

    // Partial update: only the name changes; no new logo.
    let form = reqwest::multipart::Form::new().text("name", "After");
    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let after = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    assert_eq!(after["name"], "After");
    assert_eq!(after["sku"], sku.as_str());
    assert_eq!(after["category"], "Updating");
    assert_eq!(after["logo"].as_str().unwrap(), old_logo);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_delete_removes_record_and_logo() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let sku = unique_sku("DEL");
    assert_eq!(
        ctx.create_product(&admin, "Doomed", &sku, "Deleting", None)
            .await
            .status(),
        StatusCode::CREATED
    );
    let product = ctx.find_product_by_sku(&admin, &sku).await.unwrap();
    let product_id = product["id"].as_i64().unwrap();
    let logo = product["logo"].as_str().unwrap().to_owned();

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Record gone.
    let gone = ctx
        .client
        .get(ctx.url(&format!("/api/products/{product_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    // Logo file gone.
    let img = ctx
        .client
        .get(ctx.url(&format!("/api/images/{logo}")))
        .send()
        .await
        .unwrap();
    assert_eq!(img.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_categories_are_distinct() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let category = format!("Distinct-{}", unique_sku("C"));
    for i in 0..2 {
        let sku = unique_sku(&format!("CAT{i}"));
        assert_eq!(
            ctx.create_product(&admin, &format!("Cat {i}"), &sku, &category, None)
                .await
                .status(),
            StatusCode::CREATED
        );
    }

    let body: Value = ctx
        .client
        .get(ctx.url("/api/products/categories"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let count = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| *c == &Value::from(category.as_str()))
        .count();
    assert_eq!(count, 1, "each category value appears exactly once");
}

#[tokio::test]
#[ignore = "requires a running catalog-server and database"]
async fn test_create_without_logo_is_rejected() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let form = reqwest::multipart::Form::new()
        .text("name", "No Logo")
        .text("sku", unique_sku("NOLOGO"))
        .text("category", "Imaging");
    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// The caller's own user id via `/api/users/me`.
async fn me_id(ctx: &TestContext, token: &str) -> i64 {
    let me: Value = ctx
        .client
        .get(ctx.url("/api/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    me["id"].as_i64().unwrap()
}

mod common;

use axum::http::StatusCode;
use hostcompare::storage::MockStorageService;
use serde_json::json;
use uuid::Uuid;

fn provider_payload(slug: &str) -> serde_json::Value {
    json!({
        "name": "  Fast Host  ",
        "slug": slug,
        "website": "https://fast.example",
        "description": "   "
    })
}

#[tokio::test]
async fn test_manager_creates_provider_with_trimmed_fields() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let res = app
        .send("POST", "/providers", Some(manager), Some(provider_payload("fast-host")))
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["name"], "Fast Host");
    assert_eq!(res.body["slug"], "fast-host");
    // A blank optional string is stored as absent.
    assert!(res.body["description"].is_null());
}

#[tokio::test]
async fn test_duplicate_slug_is_409() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let first = app
        .send("POST", "/providers", Some(manager), Some(provider_payload("fast-host")))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .send("POST", "/providers", Some(manager), Some(provider_payload("fast-host")))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "conflict");
}

#[tokio::test]
async fn test_invalid_provider_reports_every_field() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let res = app
        .send(
            "POST",
            "/providers",
            Some(manager),
            Some(json!({ "name": "X", "slug": "Not A Slug", "website": "nope" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "validation_failed");
    let fields: Vec<&str> = res.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"slug"));
    assert!(fields.contains(&"website"));
    let mut sorted = fields.clone();
    sorted.sort();
    assert_eq!(fields, sorted);
}

#[tokio::test]
async fn test_missing_required_field_is_named() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let res = app
        .send("POST", "/providers", Some(manager), Some(json!({ "name": "Fast Host" })))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "slug");
    assert_eq!(res.body["details"][0]["message"], "is required");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .method("POST")
            .uri("/providers")
            .header("x-user-id", manager.to_string())
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_provider_validates_and_resolves_id() {
    let app = common::app();
    let provider = app.seed_provider("alpha").await;

    let bad = app.send("GET", "/providers/123", None, None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["details"][0]["field"], "id");

    let missing = app
        .send("GET", &format!("/providers/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "not_found");

    let found = app
        .send("GET", &format!("/providers/{}", provider.id), None, None)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["slug"], "alpha");
}

#[tokio::test]
async fn test_provider_search_and_pagination() {
    let app = common::app();
    app.seed_provider("alpha-hosting").await;
    app.seed_provider("beta-cloud").await;
    app.seed_provider("gamma-hosting").await;

    let res = app.send("GET", "/providers?search=HOSTING", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let page = app
        .send("GET", "/providers?perPage=2&page=2", None, None)
        .await;
    assert_eq!(page.body.as_array().unwrap().len(), 1);

    let invalid = app.send("GET", "/providers?perPage=abc", None, None).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["details"][0]["field"], "perPage");

    let too_large = app.send("GET", "/providers?perPage=500", None, None).await;
    assert_eq!(too_large.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_provider() {
    let app = common::app();
    let manager = app.seed_user("manager");
    let provider = app.seed_provider("alpha").await;
    app.seed_tariff(provider.id, "Starter", 100).await;

    let updated = app
        .send(
            "PUT",
            &format!("/providers/{}", provider.id),
            Some(manager),
            Some(json!({ "description": "Budget hosting" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["description"], "Budget hosting");
    assert_eq!(updated.body["slug"], "alpha");

    let deleted = app
        .send("DELETE", &format!("/providers/{}", provider.id), Some(manager), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    // Tariffs go with their provider.
    let tariffs = app.send("GET", "/tariffs", None, None).await;
    assert_eq!(tariffs.body, json!([]));

    let again = app
        .send("DELETE", &format!("/providers/{}", provider.id), Some(manager), None)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_tariff_coerces_numbers_and_checks_provider() {
    let app = common::app();
    let manager = app.seed_user("manager");
    let provider = app.seed_provider("alpha").await;

    let res = app
        .send(
            "POST",
            "/tariffs",
            Some(manager),
            Some(json!({
                "providerId": provider.id,
                "name": "Pro",
                "priceCents": "990",
                "billingPeriod": "yearly",
                "diskGb": 50
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["priceCents"], 990);
    assert_eq!(res.body["billingPeriod"], "yearly");
    assert!(res.body["bandwidthGb"].is_null());

    let duplicate = app
        .send(
            "POST",
            "/tariffs",
            Some(manager),
            Some(json!({
                "providerId": provider.id,
                "name": "Pro",
                "priceCents": 100,
                "billingPeriod": "monthly",
                "diskGb": 5
            })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let orphan = app
        .send(
            "POST",
            "/tariffs",
            Some(manager),
            Some(json!({
                "providerId": Uuid::new_v4(),
                "name": "Pro",
                "priceCents": 100,
                "billingPeriod": "monthly",
                "diskGb": 5
            })),
        )
        .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tariff_enum_and_range_violations() {
    let app = common::app();
    let manager = app.seed_user("manager");
    let provider = app.seed_provider("alpha").await;

    let bad_period = app
        .send(
            "POST",
            "/tariffs",
            Some(manager),
            Some(json!({
                "providerId": provider.id,
                "name": "Pro",
                "priceCents": 100,
                "billingPeriod": "weekly",
                "diskGb": 5
            })),
        )
        .await;
    assert_eq!(bad_period.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_period.body["details"][0]["field"], "billingPeriod");

    let negative = app
        .send(
            "POST",
            "/tariffs",
            Some(manager),
            Some(json!({
                "providerId": provider.id,
                "name": "Pro",
                "priceCents": -1,
                "billingPeriod": "monthly",
                "diskGb": 5
            })),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative.body["details"][0]["field"], "priceCents");
}

#[tokio::test]
async fn test_tariff_filters() {
    let app = common::app();
    let alpha = app.seed_provider("alpha").await;
    let beta = app.seed_provider("beta").await;
    app.seed_tariff(alpha.id, "Cheap", 100).await;
    app.seed_tariff(alpha.id, "Pricey", 900).await;
    app.seed_tariff(beta.id, "Mid", 500).await;

    let all = app.send("GET", "/tariffs", None, None).await;
    let prices: Vec<i64> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["priceCents"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![100, 500, 900]);

    let cheap = app.send("GET", "/tariffs?maxPriceCents=500", None, None).await;
    assert_eq!(cheap.body.as_array().unwrap().len(), 2);

    let by_provider = app
        .send("GET", &format!("/tariffs?providerId={}", alpha.id), None, None)
        .await;
    assert_eq!(by_provider.body.as_array().unwrap().len(), 2);

    let yearly = app.send("GET", "/tariffs?billingPeriod=yearly", None, None).await;
    assert_eq!(yearly.body, json!([]));

    let bad_id = app.send("GET", "/tariffs?providerId=xyz", None, None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["details"][0]["field"], "providerId");
}

#[tokio::test]
async fn test_update_tariff_keeps_absent_fields() {
    let app = common::app();
    let manager = app.seed_user("manager");
    let provider = app.seed_provider("alpha").await;
    let tariff = app.seed_tariff(provider.id, "Starter", 100).await;

    let res = app
        .send(
            "PUT",
            &format!("/tariffs/{}", tariff.id),
            Some(manager),
            Some(json!({ "priceCents": "150" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["priceCents"], 150);
    assert_eq!(res.body["name"], "Starter");

    let deleted = app
        .send("DELETE", &format!("/tariffs/{}", tariff.id), Some(manager), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app
        .send("GET", &format!("/tariffs/{}", tariff.id), None, None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presigned_logo_upload() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let res = app
        .send(
            "POST",
            "/upload/presigned",
            Some(manager),
            Some(json!({ "filename": "../../logo.exe", "fileType": "image/png" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let key = res.body["resourceKey"].as_str().unwrap();
    assert!(key.starts_with("logos/"));
    assert!(key.ends_with(".png"));
    assert!(!key.contains(".."));
    assert!(res.body["uploadUrl"].as_str().unwrap().contains(key));
}

#[tokio::test]
async fn test_presigned_rejects_non_image_types() {
    let app = common::app();
    let manager = app.seed_user("manager");

    let res = app
        .send(
            "POST",
            "/upload/presigned",
            Some(manager),
            Some(json!({ "filename": "video.mp4", "fileType": "video/mp4" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "fileType");
}

#[tokio::test]
async fn test_storage_failure_is_opaque_500() {
    let app = common::app_with_storage(MockStorageService::new_failing());
    let manager = app.seed_user("manager");

    let res = app
        .send(
            "POST",
            "/upload/presigned",
            Some(manager),
            Some(json!({ "filename": "logo.png", "fileType": "image/png" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"], "internal");
    assert_eq!(res.body["message"], "internal server error");
}

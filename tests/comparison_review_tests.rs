mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_single_tariff_comparison_is_rejected_with_count_message() {
    let app = common::app();
    let user = app.seed_user("user");

    let res = app
        .send("POST", "/comparisons", Some(user), Some(json!({ "tariffIds": ["a"] })))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "tariffIds");
    assert_eq!(res.body["details"][0]["message"], "minimum 2 tariffs");
}

#[tokio::test]
async fn test_comparison_selection_rules() {
    let app = common::app();
    let user = app.seed_user("user");
    let id = Uuid::new_v4();

    let cases = [
        (json!({ "tariffIds": [] }), "minimum 2 tariffs"),
        (
            json!({ "tariffIds": [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()] }),
            "maximum 4 tariffs",
        ),
        (
            json!({ "tariffIds": [Uuid::new_v4(), "not-an-id"] }),
            "entry 1 must be a valid identifier",
        ),
        (json!({ "tariffIds": [id, id] }), "tariffs must be distinct"),
        (json!({ "title": "Mine" }), "is required"),
    ];

    for (body, message) in cases {
        let res = app.send("POST", "/comparisons", Some(user), Some(body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["details"][0]["field"], "tariffIds");
        assert_eq!(res.body["details"][0]["message"], message);
    }
}

#[tokio::test]
async fn test_comparison_with_unknown_tariff_is_404() {
    let app = common::app();
    let user = app.seed_user("user");
    let provider = app.seed_provider("alpha").await;
    let tariff = app.seed_tariff(provider.id, "Starter", 100).await;

    let res = app
        .send(
            "POST",
            "/comparisons",
            Some(user),
            Some(json!({ "tariffIds": [tariff.id, Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let list = app.send("GET", "/comparisons", Some(user), None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_comparison_lifecycle_is_owner_scoped() {
    let app = common::app();
    let owner = app.seed_user("user");
    let stranger = app.seed_user("user");
    let provider = app.seed_provider("alpha").await;
    let pro = app.seed_tariff(provider.id, "Pro", 900).await;
    let starter = app.seed_tariff(provider.id, "Starter", 100).await;

    let created = app
        .send(
            "POST",
            "/comparisons",
            Some(owner),
            Some(json!({ "tariffIds": [format!(" {} ", pro.id), starter.id] })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "My comparison");
    let id = created.body["id"].as_str().unwrap().to_string();

    // Saved order is preserved, not price order.
    let tariffs = app
        .send("GET", &format!("/comparisons/{id}/tariffs"), Some(owner), None)
        .await;
    assert_eq!(tariffs.status, StatusCode::OK);
    assert_eq!(tariffs.body[0]["name"], "Pro");
    assert_eq!(tariffs.body[1]["name"], "Starter");

    let foreign = app
        .send("GET", &format!("/comparisons/{id}"), Some(stranger), None)
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    let foreign_delete = app
        .send("DELETE", &format!("/comparisons/{id}"), Some(stranger), None)
        .await;
    assert_eq!(foreign_delete.status, StatusCode::NOT_FOUND);

    let mine = app.send("GET", "/comparisons", Some(owner), None).await;
    assert_eq!(mine.body.as_array().unwrap().len(), 1);
    let theirs = app.send("GET", "/comparisons", Some(stranger), None).await;
    assert_eq!(theirs.body, json!([]));

    let deleted = app
        .send("DELETE", &format!("/comparisons/{id}"), Some(owner), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app
        .send("GET", &format!("/comparisons/{id}"), Some(owner), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_moderation_flow() {
    let app = common::app();
    let author = app.seed_user("user");
    let moderator = app.seed_user("moderator");
    let provider = app.seed_provider("alpha").await;
    let reviews_uri = format!("/providers/{}/reviews", provider.id);

    let created = app
        .send(
            "POST",
            &reviews_uri,
            Some(author),
            Some(json!({ "rating": "4", "body": "Solid uptime, slow support." })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "pending");
    assert_eq!(created.body["rating"], 4);
    let review_id = created.body["id"].as_str().unwrap().to_string();

    // Pending reviews are not public.
    let public = app.send("GET", &reviews_uri, None, None).await;
    assert_eq!(public.body, json!([]));

    let forbidden = app
        .send("GET", "/moderation/reviews", Some(author), None)
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let queue = app
        .send("GET", "/moderation/reviews", Some(moderator), None)
        .await;
    assert_eq!(queue.body.as_array().unwrap().len(), 1);

    let approved = app
        .send(
            "PUT",
            &format!("/reviews/{review_id}/status"),
            Some(moderator),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["status"], "approved");

    let public = app.send("GET", &reviews_uri, None, None).await;
    assert_eq!(public.body.as_array().unwrap().len(), 1);

    let queue = app
        .send("GET", "/moderation/reviews", Some(moderator), None)
        .await;
    assert_eq!(queue.body, json!([]));
}

#[tokio::test]
async fn test_review_cannot_return_to_pending() {
    let app = common::app();
    let moderator = app.seed_user("moderator");

    let res = app
        .send(
            "PUT",
            &format!("/reviews/{}/status", Uuid::new_v4()),
            Some(moderator),
            Some(json!({ "status": "pending" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_second_review_by_same_user_is_409() {
    let app = common::app();
    let author = app.seed_user("user");
    let provider = app.seed_provider("alpha").await;
    let uri = format!("/providers/{}/reviews", provider.id);
    let body = json!({ "rating": 5, "body": "Great value for the price." });

    let first = app.send("POST", &uri, Some(author), Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app.send("POST", &uri, Some(author), Some(body)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_review_validation_and_unknown_provider() {
    let app = common::app();
    let author = app.seed_user("user");

    let unknown = app
        .send(
            "POST",
            &format!("/providers/{}/reviews", Uuid::new_v4()),
            Some(author),
            Some(json!({ "rating": 3, "body": "Nothing special here." })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let provider = app.seed_provider("alpha").await;
    let invalid = app
        .send(
            "POST",
            &format!("/providers/{}/reviews", provider.id),
            Some(author),
            Some(json!({ "rating": 6, "body": "short" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["details"][0]["field"], "body");
    assert_eq!(invalid.body["details"][1]["field"], "rating");
    assert_eq!(
        invalid.body["details"][1]["message"],
        "rating must be between 1 and 5"
    );
}

#[tokio::test]
async fn test_moderator_deletes_review() {
    let app = common::app();
    let author = app.seed_user("user");
    let moderator = app.seed_user("moderator");
    let provider = app.seed_provider("alpha").await;

    let created = app
        .send(
            "POST",
            &format!("/providers/{}/reviews", provider.id),
            Some(author),
            Some(json!({ "rating": 1, "body": "Went down every weekend." })),
        )
        .await;
    let review_id = created.body["id"].as_str().unwrap().to_string();

    let by_author = app
        .send("DELETE", &format!("/reviews/{review_id}"), Some(author), None)
        .await;
    assert_eq!(by_author.status, StatusCode::FORBIDDEN);

    let by_moderator = app
        .send("DELETE", &format!("/reviews/{review_id}"), Some(moderator), None)
        .await;
    assert_eq!(by_moderator.status, StatusCode::NO_CONTENT);
}

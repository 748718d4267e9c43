mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_is_public() {
    let app = common::app();
    let res = app.send("GET", "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("ok"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = common::app();
    let res = app.send("GET", "/health", None, None).await;
    assert!(res.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_protected_route_without_session_is_401() {
    let app = common::app();
    let res = app.send("GET", "/me", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_admin_route_without_session_is_401() {
    let app = common::app();
    let res = app.send("GET", "/admin/migration/status", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_for_missing_profile_is_401() {
    let app = common::app();
    let res = app.send("GET", "/me", Some(Uuid::new_v4()), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_me_returns_resolved_identity() {
    let app = common::app();
    let user_id = app.seed_user("moderator");

    let res = app.send("GET", "/me", Some(user_id), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], user_id.to_string());
    assert_eq!(res.body["role"], "moderator");
}

#[tokio::test]
async fn test_unknown_role_is_authenticated_but_denied() {
    let app = common::app();
    let user_id = app.seed_user("superuser");

    let res = app.send("GET", "/me", Some(user_id), None).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "forbidden");
}

#[tokio::test]
async fn test_role_text_is_case_sensitive() {
    let app = common::app();
    let user_id = app.seed_user("Admin");

    let res = app.send("GET", "/admin/stats", Some(user_id), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_on_manager_route_is_403_and_nothing_is_written() {
    let app = common::app();
    let user_id = app.seed_user("user");

    let res = app
        .send(
            "POST",
            "/providers",
            Some(user_id),
            Some(json!({ "name": "Fast Host", "slug": "fast-host", "website": "https://fast.example" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.get("id").is_none());

    let list = app.send("GET", "/providers", None, None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_authorization_is_checked_before_validation() {
    let app = common::app();
    let user_id = app.seed_user("user");

    // Malformed body, but the caller lacks the capability: 403 wins over 400.
    let res = app
        .send("POST", "/tariffs", Some(user_id), Some(json!({ "name": 42 })))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .send("DELETE", "/providers/not-an-id", Some(user_id), None)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_moderator_cannot_manage_catalog() {
    let app = common::app();
    let moderator = app.seed_user("moderator");

    let res = app
        .send("POST", "/upload/presigned", Some(moderator), Some(json!({})))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manager_is_not_admin() {
    let app = common::app();
    let manager = app.seed_user("manager");

    for uri in ["/admin/stats", "/admin/users", "/admin/migration/status"] {
        let res = app.send("GET", uri, Some(manager), None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_inherits_every_lower_capability() {
    let app = common::app();
    let admin = app.seed_user("admin");

    assert_eq!(app.send("GET", "/me", Some(admin), None).await.status, StatusCode::OK);
    assert_eq!(
        app.send("GET", "/moderation/reviews", Some(admin), None)
            .await
            .status,
        StatusCode::OK
    );
    assert_eq!(app.send("GET", "/leads", Some(admin), None).await.status, StatusCode::OK);
    assert_eq!(
        app.send("GET", "/admin/stats", Some(admin), None).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_role_change_takes_effect_on_next_request() {
    let app = common::app();
    let admin = app.seed_user("admin");
    let member = app.seed_user("user");

    let before = app.send("GET", "/leads", Some(member), None).await;
    assert_eq!(before.status, StatusCode::FORBIDDEN);

    let res = app
        .send(
            "PUT",
            &format!("/admin/users/{member}/role"),
            Some(admin),
            Some(json!({ "role": "manager" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "manager");

    let after = app.send("GET", "/leads", Some(member), None).await;
    assert_eq!(after.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_change_own_role() {
    let app = common::app();
    let admin = app.seed_user("admin");

    let res = app
        .send(
            "PUT",
            &format!("/admin/users/{admin}/role"),
            Some(admin),
            Some(json!({ "role": "user" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::CONFLICT);
    let me = app.send("GET", "/me", Some(admin), None).await;
    assert_eq!(me.body["role"], "admin");
}

#[tokio::test]
async fn test_role_change_rejects_unknown_role() {
    let app = common::app();
    let admin = app.seed_user("admin");
    let member = app.seed_user("user");

    let res = app
        .send(
            "PUT",
            &format!("/admin/users/{member}/role"),
            Some(admin),
            Some(json!({ "role": "owner" })),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "role");
}

#[tokio::test]
async fn test_role_change_for_unknown_user_is_404() {
    let app = common::app();
    let admin = app.seed_user("admin");

    let res = app
        .send(
            "PUT",
            &format!("/admin/users/{}/role", Uuid::new_v4()),
            Some(admin),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lists_users_and_stats() {
    let app = common::app();
    let admin = app.seed_user("admin");
    app.seed_user("user");
    let provider = app.seed_provider("alpha").await;
    app.seed_tariff(provider.id, "Starter", 199).await;

    let users = app.send("GET", "/admin/users", Some(admin), None).await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.body.as_array().unwrap().len(), 2);

    let paged = app
        .send("GET", "/admin/users?perPage=1&page=2", Some(admin), None)
        .await;
    assert_eq!(paged.body.as_array().unwrap().len(), 1);

    let stats = app.send("GET", "/admin/stats", Some(admin), None).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["providers"], 1);
    assert_eq!(stats.body["tariffs"], 1);
    assert_eq!(stats.body["users"], 2);
    assert_eq!(stats.body["pendingReviews"], 0);
    assert_eq!(stats.body["openLeads"], 0);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    use hostcompare::auth::Claims;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    let app = common::app();
    let user_id = app.seed_user("user");
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let token = encode(
        &Header::default(),
        &Claims {
            sub: user_id,
            exp: now + 3600,
            iat: now,
        },
        &EncodingKey::from_secret(app.state.config.session_secret.as_bytes()),
    )
    .unwrap();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/me")
            .header("authorization", format!("Bearer {token}"))
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

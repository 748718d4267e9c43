use hostcompare::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::User,
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(
        repo.clone() as RepositoryState,
        Arc::new(MockStorageService::new()) as StorageState,
        AppConfig::default(),
    );
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

impl TestApp {
    fn seed_user(&self, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.repo
            .insert_user(User {
                id,
                email: format!("{role}@example.com"),
                role: role.to_string(),
            })
            .unwrap();
        id
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_protected_route_requires_session() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/comparisons", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_catalog_and_lead_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let manager = app.seed_user("manager");

    // Create provider
    let response = client
        .post(format!("{}/providers", app.address))
        .header("x-user-id", manager.to_string())
        .json(&json!({ "name": "Fast Host", "slug": "fast-host", "website": "https://fast.example" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let provider: Value = response.json().await.unwrap();

    // Create tariff with numbers sent as strings
    let response = client
        .post(format!("{}/tariffs", app.address))
        .header("x-user-id", manager.to_string())
        .json(&json!({
            "providerId": provider["id"],
            "name": "Starter",
            "priceCents": "299",
            "billingPeriod": "monthly",
            "diskGb": "20"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let tariff: Value = response.json().await.unwrap();
    assert_eq!(tariff["priceCents"], 299);

    // Public listing and lead
    let response = client
        .get(format!("{}/tariffs?maxPriceCents=300", app.address))
        .send()
        .await
        .unwrap();
    let listed: Vec<Value> = response.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let response = client
        .post(format!("{}/leads", app.address))
        .json(&json!({
            "name": "Jane",
            "email": "jane@example.com",
            "message": "Is this plan good for WordPress?",
            "tariffId": tariff["id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

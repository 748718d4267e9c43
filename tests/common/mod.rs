#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use hostcompare::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::{BillingPeriod, Provider, Tariff, User},
    repository::{Repository, RepositoryState},
    schemas::{CreateProviderRequest, CreateTariffRequest},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

/// A router over an in-memory repository and mock storage, plus direct handles for seeding.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
}

pub fn app() -> TestApp {
    app_with_storage(MockStorageService::new())
}

pub fn app_with_storage(storage: MockStorageService) -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(
        repo.clone() as RepositoryState,
        Arc::new(storage) as StorageState,
        AppConfig::default(),
    );
    TestApp {
        router: create_router(state.clone()),
        repo,
        state,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Inserts a profile with the given raw role text and returns its id.
    pub fn seed_user(&self, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.repo
            .insert_user(User {
                id,
                email: format!("{}-{}@example.com", role, id.simple()),
                role: role.to_string(),
            })
            .unwrap();
        id
    }

    pub async fn seed_provider(&self, slug: &str) -> Provider {
        self.repo
            .create_provider(CreateProviderRequest {
                name: format!("Provider {slug}"),
                slug: slug.to_string(),
                website: format!("https://{slug}.example"),
                description: None,
                logo_key: None,
            })
            .await
            .unwrap()
    }

    pub async fn seed_tariff(&self, provider_id: Uuid, name: &str, price_cents: i64) -> Tariff {
        self.repo
            .create_tariff(CreateTariffRequest {
                provider_id,
                name: name.to_string(),
                price_cents,
                billing_period: BillingPeriod::Monthly,
                disk_gb: 10,
                bandwidth_gb: None,
                sites: Some(1),
            })
            .await
            .unwrap()
    }

    /// Sends one request through the full router. `user` travels in the local-development
    /// identity header.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header("x-user-id", id.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod policy;
pub mod repository;
pub mod schemas;
pub mod storage;
pub mod validation;

// Routing segregated by guard (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use handlers::{catalog, comparisons, leads, reviews, users};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use migration::{MigrationJob, MigrationTracker, NormalizeLeadEmails};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` with Swagger UI at
/// `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        catalog::list_providers, catalog::get_provider, catalog::create_provider,
        catalog::update_provider, catalog::delete_provider, catalog::list_tariffs,
        catalog::get_tariff, catalog::create_tariff, catalog::update_tariff,
        catalog::delete_tariff, catalog::get_presigned_url,
        comparisons::list_comparisons, comparisons::create_comparison,
        comparisons::get_comparison, comparisons::get_comparison_tariffs,
        comparisons::delete_comparison,
        reviews::list_provider_reviews, reviews::create_review, reviews::list_pending_reviews,
        reviews::set_review_status, reviews::delete_review,
        leads::create_lead, leads::list_leads, leads::update_lead,
        users::get_me, users::get_admin_stats, users::list_users, users::update_user_role,
        handlers::migration::get_migration_status, handlers::migration::start_migration,
        handlers::migration::rollback_migration, handlers::migration::reset_migration
    ),
    components(
        schemas(
            models::Provider, models::Tariff, models::Comparison, models::Review, models::Lead,
            models::User, models::UserProfile, models::DashboardStats,
            models::PresignedUrlResponse, models::BillingPeriod, models::ReviewStatus,
            models::LeadStatus, policy::Role,
            schemas::CreateProviderRequest, schemas::UpdateProviderRequest,
            schemas::CreateTariffRequest, schemas::UpdateTariffRequest,
            schemas::PresignedUrlRequest, schemas::CreateComparisonRequest,
            schemas::CreateReviewRequest, schemas::ReviewDecision, schemas::ReviewStatusRequest,
            schemas::CreateLeadRequest, schemas::UpdateLeadRequest, schemas::UpdateRoleRequest,
            migration::MigrationStatus, migration::MigrationState,
            error::ErrorBody, validation::FieldError,
        )
    ),
    tags(
        (name = "hostcompare", description = "Hosting comparison catalog and CRM API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Object storage for provider logos.
    pub storage: StorageState,
    pub config: AppConfig,
    /// Process-wide migration status.
    pub migrations: MigrationTracker,
    /// The job `POST /admin/migration/start` runs.
    pub migration_job: Arc<dyn MigrationJob>,
}

impl AppState {
    /// Wires the services together with a fresh tracker and the bundled
    /// [`NormalizeLeadEmails`] job.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let migration_job = Arc::new(NormalizeLeadEmails::new(repo.clone()));
        Self {
            repo,
            storage,
            config,
            migrations: MigrationTracker::new(),
            migration_job,
        }
    }

    /// Replaces the job run by the migration endpoints.
    pub fn with_migration_job(mut self, job: Arc<dyn MigrationJob>) -> Self {
        self.migration_job = job;
        self
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Route layer for the protected routers. Extracting [`AuthUser`] runs the session resolver;
/// a request without a valid session is rejected with `401` before any handler runs. The
/// resolved identity is stored in the request extensions, where the handler's own `AuthUser`
/// extractor picks it up without reading the profile again.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, the scoped auth layers and the global observability layers.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS: the browser client is served from a different origin than the API.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // 1. API documentation (OpenAPI JSON + Swagger UI), open to everyone.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // 2. Public routes: catalog reads, approved reviews, the lead form, health.
        .merge(public::public_routes())
        // 3. Authenticated routes. `route_layer` only wraps matched routes, so unknown paths
        //    still answer 404 instead of 401.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // 4. Admin routes under /admin, behind the same session layer. The admin role itself
        //    is checked per handler.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // Global layers. The outermost layer sees the request first: CORS, then request id
    // assignment, then the trace span, then id propagation back onto the response.
    base_router
        .layer(
            ServiceBuilder::new()
                // Assign a UUID x-request-id unless the caller already sent one.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // One span per request, closed with status and latency at INFO.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Copy the request id onto the response so clients can quote it.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`. Records method, URI and the request id assigned by
/// `SetRequestIdLayer`, so every log line emitted while handling the request (handler logs,
/// policy denials, repository errors) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    // SetRequestIdLayer runs first, so the header is normally present.
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

use crate::{
    AppState,
    handlers::{migration, users},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. Every handler requires the `AdminOnly` capability, which only the
/// exact `admin` role satisfies.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters: providers, tariffs, users, comparisons, pending reviews, open leads.
        .route("/stats", get(users::get_admin_stats))
        .route("/users", get(users::list_users))
        // PUT /admin/users/{id}/role
        // Refused (409) when an admin targets their own profile.
        .route("/users/{id}/role", put(users::update_user_role))
        // --- Data migrations ---
        // At most one job runs at a time; start returns 202 and the outcome is polled via status.
        .route("/migration/status", get(migration::get_migration_status))
        .route("/migration/start", post(migration::start_migration))
        .route("/migration/rollback", post(migration::rollback_migration))
        .route("/migration/reset", post(migration::reset_migration))
}

use crate::{
    AppState,
    handlers::{catalog, comparisons, leads, reviews, users},
};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Authenticated Router Module
///
/// Routes that need a session. The auth layer applied in `create_router` rejects requests
/// without one (401); each handler then checks its own capability through
/// `policy::require` (403), so the role rules stay in one place.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Member ---
        .route("/me", get(users::get_me))
        .route(
            "/comparisons",
            get(comparisons::list_comparisons).post(comparisons::create_comparison),
        )
        .route(
            "/comparisons/{id}",
            get(comparisons::get_comparison).delete(comparisons::delete_comparison),
        )
        .route(
            "/comparisons/{id}/tariffs",
            get(comparisons::get_comparison_tariffs),
        )
        // POST /providers/{id}/reviews
        // New reviews start as pending and are invisible until a moderator approves them.
        .route("/providers/{id}/reviews", post(reviews::create_review))
        // --- ModerateReviews ---
        .route("/moderation/reviews", get(reviews::list_pending_reviews))
        .route("/reviews/{id}/status", put(reviews::set_review_status))
        .route("/reviews/{id}", delete(reviews::delete_review))
        // --- ManageCatalog ---
        .route("/providers", post(catalog::create_provider))
        .route(
            "/providers/{id}",
            put(catalog::update_provider).delete(catalog::delete_provider),
        )
        .route("/tariffs", post(catalog::create_tariff))
        .route(
            "/tariffs/{id}",
            put(catalog::update_tariff).delete(catalog::delete_tariff),
        )
        // POST /upload/presigned
        // Short-lived signed URL for a direct logo upload to object storage.
        .route("/upload/presigned", post(catalog::get_presigned_url))
        // --- ManageLeads ---
        .route("/leads", get(leads::list_leads))
        .route("/leads/{id}", patch(leads::update_lead))
}

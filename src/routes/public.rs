use crate::{
    AppState,
    handlers::{self, catalog, leads, reviews},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the catalog read side, approved reviews and the
/// consultation form. Nothing here may expose unmoderated reviews or lead data.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for monitoring and load balancers.
        .route("/health", get(handlers::health))
        // GET /providers?search=&page=&perPage=
        .route("/providers", get(catalog::list_providers))
        .route("/providers/{id}", get(catalog::get_provider))
        // GET /providers/{id}/reviews
        // Approved reviews only; the moderation queue lives behind ModerateReviews.
        .route("/providers/{id}/reviews", get(reviews::list_provider_reviews))
        // GET /tariffs?providerId=&billingPeriod=&maxPriceCents=&page=&perPage=
        .route("/tariffs", get(catalog::list_tariffs))
        .route("/tariffs/{id}", get(catalog::get_tariff))
        // POST /leads
        // Consultation form. Listing and working leads requires ManageLeads.
        .route("/leads", post(leads::create_lead))
}

//! Route handlers.
//!
//! Every protected handler follows the same order: resolve the session (`AuthUser`
//! extractor), check the capability with [`crate::policy::require`], validate path, query and
//! body with [`crate::validation`], then make a single repository call. Authentication and
//! authorization failures therefore always win over malformed input.

pub mod catalog;
pub mod comparisons;
pub mod leads;
pub mod migration;
pub mod reviews;
pub mod users;

/// health
///
/// [Public Route] Liveness check for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

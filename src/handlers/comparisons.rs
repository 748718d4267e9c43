use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{Comparison, Tariff},
    policy::{self, Capability},
    schemas::{CreateComparisonRequest, PageQuery},
    validation,
};

/// list_comparisons
///
/// [Authenticated Route] Lists the caller's saved comparisons, newest first.
#[utoipa::path(
    get,
    path = "/comparisons",
    params(PageQuery),
    responses((status = 200, description = "My comparisons", body = [Comparison]))
)]
pub async fn list_comparisons(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Comparison>>, AppError> {
    policy::require(&user, Capability::Member)?;
    let page: PageQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_comparisons(user.id, page).await?))
}

/// create_comparison
///
/// [Authenticated Route] Saves a comparison of two to four distinct, existing tariffs.
#[utoipa::path(
    post,
    path = "/comparisons",
    request_body = CreateComparisonRequest,
    responses(
        (status = 201, description = "Created", body = Comparison),
        (status = 400, description = "Invalid selection", body = ErrorBody),
        (status = 404, description = "Unknown tariff", body = ErrorBody)
    )
)]
pub async fn create_comparison(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Comparison>), AppError> {
    policy::require(&user, Capability::Member)?;
    let payload: CreateComparisonRequest = validation::validate_json(&body)?;

    let tariff_ids = payload.tariff_uuids();
    let comparison = state
        .repo
        .create_comparison(user.id, payload.title, tariff_ids)
        .await?;
    tracing::info!(comparison_id = %comparison.id, user_id = %user.id, "comparison saved");
    Ok((StatusCode::CREATED, Json(comparison)))
}

/// get_comparison
///
/// [Authenticated Route] Another user's comparison is reported as not found.
#[utoipa::path(
    get,
    path = "/comparisons/{id}",
    params(("id" = uuid::Uuid, Path, description = "Comparison ID")),
    responses(
        (status = 200, description = "Found", body = Comparison),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_comparison(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Comparison>, AppError> {
    policy::require(&user, Capability::Member)?;
    let id = validation::parse_id("id", &id)?;
    Ok(Json(state.repo.get_comparison(id, user.id).await?))
}

/// get_comparison_tariffs
///
/// [Authenticated Route] Resolves a comparison into its tariffs, in the saved order. Tariffs
/// removed from the catalog since saving are skipped.
#[utoipa::path(
    get,
    path = "/comparisons/{id}/tariffs",
    params(("id" = uuid::Uuid, Path, description = "Comparison ID")),
    responses(
        (status = 200, description = "Compared tariffs", body = [Tariff]),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_comparison_tariffs(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Tariff>>, AppError> {
    policy::require(&user, Capability::Member)?;
    let id = validation::parse_id("id", &id)?;
    Ok(Json(state.repo.get_comparison_tariffs(id, user.id).await?))
}

/// delete_comparison
#[utoipa::path(
    delete,
    path = "/comparisons/{id}",
    params(("id" = uuid::Uuid, Path, description = "Comparison ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_comparison(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    policy::require(&user, Capability::Member)?;
    let id = validation::parse_id("id", &id)?;

    state.repo.delete_comparison(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

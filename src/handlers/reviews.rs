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
    models::Review,
    policy::{self, Capability},
    schemas::{CreateReviewRequest, PageQuery, ReviewStatusRequest},
    validation,
};

/// list_provider_reviews
///
/// [Public Route] Approved reviews of a provider, newest first. Pending and rejected reviews
/// are never returned here.
#[utoipa::path(
    get,
    path = "/providers/{id}/reviews",
    params(("id" = uuid::Uuid, Path, description = "Provider ID"), PageQuery),
    responses((status = 200, description = "Approved reviews", body = [Review]))
)]
pub async fn list_provider_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Review>>, AppError> {
    let provider_id = validation::parse_id("id", &id)?;
    let page: PageQuery = validation::validate_query(params)?;
    Ok(Json(
        state.repo.list_approved_reviews(provider_id, page).await?,
    ))
}

/// create_review
///
/// [Authenticated Route] Submits a review for moderation. One review per user and provider.
#[utoipa::path(
    post,
    path = "/providers/{id}/reviews",
    params(("id" = uuid::Uuid, Path, description = "Provider ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Submitted", body = Review),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown provider", body = ErrorBody),
        (status = 409, description = "Already reviewed", body = ErrorBody)
    )
)]
pub async fn create_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Review>), AppError> {
    policy::require(&user, Capability::Member)?;
    let provider_id = validation::parse_id("id", &id)?;
    let payload: CreateReviewRequest = validation::validate_json(&body)?;

    let review = state
        .repo
        .create_review(provider_id, user.id, payload)
        .await?;
    tracing::info!(review_id = %review.id, %provider_id, "review submitted");
    Ok((StatusCode::CREATED, Json(review)))
}

/// list_pending_reviews
///
/// [Moderation Route] The review queue, oldest first.
#[utoipa::path(
    get,
    path = "/moderation/reviews",
    params(PageQuery),
    responses(
        (status = 200, description = "Pending reviews", body = [Review]),
        (status = 403, description = "Forbidden", body = ErrorBody)
    )
)]
pub async fn list_pending_reviews(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Review>>, AppError> {
    policy::require(&user, Capability::ModerateReviews)?;
    let page: PageQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_pending_reviews(page).await?))
}

/// set_review_status
///
/// [Moderation Route] Approves or rejects a review.
#[utoipa::path(
    put,
    path = "/reviews/{id}/status",
    params(("id" = uuid::Uuid, Path, description = "Review ID")),
    request_body = ReviewStatusRequest,
    responses(
        (status = 200, description = "Moderated", body = Review),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn set_review_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Review>, AppError> {
    policy::require(&user, Capability::ModerateReviews)?;
    let id = validation::parse_id("id", &id)?;
    let payload: ReviewStatusRequest = validation::validate_json(&body)?;

    let review = state
        .repo
        .set_review_status(id, payload.status.into())
        .await?;
    tracing::info!(review_id = %id, moderator = %user.id, status = ?review.status, "review moderated");
    Ok(Json(review))
}

/// delete_review
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = uuid::Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    policy::require(&user, Capability::ModerateReviews)?;
    let id = validation::parse_id("id", &id)?;

    state.repo.delete_review(id).await?;
    tracing::info!(review_id = %id, moderator = %user.id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

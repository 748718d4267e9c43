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
    models::Lead,
    policy::{self, Capability},
    schemas::{CreateLeadRequest, LeadQuery, UpdateLeadRequest},
    validation,
};

/// create_lead
///
/// [Public Route] The consultation form. Anyone may leave a lead; the e-mail address is
/// stored trimmed and lower-cased.
#[utoipa::path(
    post,
    path = "/leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Received", body = Lead),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown tariff", body = ErrorBody)
    )
)]
pub async fn create_lead(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let payload: CreateLeadRequest = validation::validate_json(&body)?;

    let lead = state.repo.create_lead(payload).await?;
    tracing::info!(lead_id = %lead.id, "lead received");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// list_leads
///
/// [Leads Route] The lead inbox, newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/leads",
    params(LeadQuery),
    responses(
        (status = 200, description = "Leads", body = [Lead]),
        (status = 403, description = "Forbidden", body = ErrorBody)
    )
)]
pub async fn list_leads(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Lead>>, AppError> {
    policy::require(&user, Capability::ManageLeads)?;
    let query: LeadQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_leads(query).await?))
}

/// update_lead
///
/// [Leads Route] Moves a lead through the pipeline and/or records notes.
#[utoipa::path(
    patch,
    path = "/leads/{id}",
    params(("id" = uuid::Uuid, Path, description = "Lead ID")),
    request_body = UpdateLeadRequest,
    responses(
        (status = 200, description = "Updated", body = Lead),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_lead(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Lead>, AppError> {
    policy::require(&user, Capability::ManageLeads)?;
    let id = validation::parse_id("id", &id)?;
    let payload: UpdateLeadRequest = validation::validate_json(&body)?;

    let lead = state.repo.update_lead(id, payload).await?;
    tracing::info!(lead_id = %id, manager = %user.id, status = ?lead.status, "lead updated");
    Ok(Json(lead))
}

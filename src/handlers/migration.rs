use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    migration::{self, MigrationStatus},
    policy::{self, Capability},
};

/// get_migration_status
///
/// [Admin Route] Current tracker snapshot; `{"status":"idle"}` before the first run.
#[utoipa::path(
    get,
    path = "/admin/migration/status",
    responses(
        (status = 200, description = "Status", body = MigrationStatus),
        (status = 403, description = "Forbidden", body = ErrorBody)
    )
)]
pub async fn get_migration_status(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MigrationStatus>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;
    Ok(Json(state.migrations.status()))
}

/// start_migration
///
/// [Admin Route] Starts the configured migration job in the background and returns the
/// `running` snapshot. Poll the status endpoint for the outcome.
#[utoipa::path(
    post,
    path = "/admin/migration/start",
    responses(
        (status = 202, description = "Started", body = MigrationStatus),
        (status = 409, description = "Already running", body = ErrorBody)
    )
)]
pub async fn start_migration(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MigrationStatus>), AppError> {
    policy::require(&user, Capability::AdminOnly)?;

    let status = migration::start_migration(&state.migrations, state.migration_job.clone())?;
    tracing::info!(admin = %user.id, job = state.migration_job.name(), "migration requested");
    Ok((StatusCode::ACCEPTED, Json(status)))
}

/// rollback_migration
///
/// [Admin Route] Not supported; always `501` and the status is left unchanged.
#[utoipa::path(
    post,
    path = "/admin/migration/rollback",
    responses((status = 501, description = "Not implemented", body = ErrorBody))
)]
pub async fn rollback_migration(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MigrationStatus>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;
    Ok(Json(state.migrations.rollback()?))
}

/// reset_migration
///
/// [Admin Route] Clears a finished run back to idle.
#[utoipa::path(
    post,
    path = "/admin/migration/reset",
    responses(
        (status = 200, description = "Idle", body = MigrationStatus),
        (status = 409, description = "Still running", body = ErrorBody)
    )
)]
pub async fn reset_migration(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MigrationStatus>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;

    let status = state.migrations.reset()?;
    tracing::info!(admin = %user.id, "migration status reset");
    Ok(Json(status))
}

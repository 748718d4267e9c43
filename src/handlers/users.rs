use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use std::collections::HashMap;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{DashboardStats, User, UserProfile},
    policy::{self, Capability},
    schemas::{PageQuery, UpdateRoleRequest},
    validation,
};

/// get_me
///
/// [Authenticated Route] The caller's resolved identity. Requires a recognised role.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn get_me(user: AuthUser) -> Result<Json<UserProfile>, AppError> {
    policy::require(&user, Capability::Member)?;
    let role = user.role.ok_or(AppError::Forbidden)?;

    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        role,
    }))
}

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Forbidden", body = ErrorBody)
    )
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;
    Ok(Json(state.repo.get_stats().await?))
}

/// list_users
///
/// [Admin Route] All profiles ordered by e-mail. Roles are returned as stored.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(PageQuery),
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;
    let page: PageQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_users(page).await?))
}

/// update_user_role
///
/// [Admin Route] Assigns a role to a profile. Admins cannot change their own role, which also
/// keeps the last admin from locking everyone out.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Own role", body = ErrorBody)
    )
)]
pub async fn update_user_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    policy::require(&user, Capability::AdminOnly)?;
    let id = validation::parse_id("id", &id)?;
    let payload: UpdateRoleRequest = validation::validate_json(&body)?;

    if id == user.id {
        return Err(AppError::Conflict(
            "admins cannot change their own role".to_string(),
        ));
    }

    let updated = state.repo.set_user_role(id, payload.role).await?;
    tracing::info!(target_user = %id, admin = %user.id, role = %payload.role, "role changed");
    Ok(Json(updated))
}

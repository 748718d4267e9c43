use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{PresignedUrlResponse, Provider, Tariff},
    policy::{self, Capability},
    schemas::{
        CreateProviderRequest, CreateTariffRequest, PresignedUrlRequest, ProviderQuery,
        TariffQuery, UpdateProviderRequest, UpdateTariffRequest,
    },
    validation,
};

// --- Providers ---

/// list_providers
///
/// [Public Route] Lists providers ordered by name, optionally filtered by a search term
/// matched against name and slug.
#[utoipa::path(
    get,
    path = "/providers",
    params(ProviderQuery),
    responses(
        (status = 200, description = "Providers", body = [Provider]),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
pub async fn list_providers(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Provider>>, AppError> {
    let query: ProviderQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_providers(query).await?))
}

/// get_provider
///
/// [Public Route] Retrieves one provider.
#[utoipa::path(
    get,
    path = "/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 200, description = "Found", body = Provider),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, AppError> {
    let id = validation::parse_id("id", &id)?;
    Ok(Json(state.repo.get_provider(id).await?))
}

/// create_provider
///
/// [Catalog Route] Adds a provider. The slug must be unique.
#[utoipa::path(
    post,
    path = "/providers",
    request_body = CreateProviderRequest,
    responses(
        (status = 201, description = "Created", body = Provider),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 409, description = "Slug taken", body = ErrorBody)
    )
)]
pub async fn create_provider(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Provider>), AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let payload: CreateProviderRequest = validation::validate_json(&body)?;

    let provider = state.repo.create_provider(payload).await?;
    tracing::info!(provider_id = %provider.id, slug = %provider.slug, "provider created");
    Ok((StatusCode::CREATED, Json(provider)))
}

/// update_provider
///
/// [Catalog Route] Partially updates a provider.
#[utoipa::path(
    put,
    path = "/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Updated", body = Provider),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Slug taken", body = ErrorBody)
    )
)]
pub async fn update_provider(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Provider>, AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let id = validation::parse_id("id", &id)?;
    let payload: UpdateProviderRequest = validation::validate_json(&body)?;

    let provider = state.repo.update_provider(id, payload).await?;
    tracing::info!(provider_id = %id, "provider updated");
    Ok(Json(provider))
}

/// delete_provider
///
/// [Catalog Route] Removes a provider together with its tariffs and reviews.
#[utoipa::path(
    delete,
    path = "/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_provider(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let id = validation::parse_id("id", &id)?;

    state.repo.delete_provider(id).await?;
    tracing::info!(provider_id = %id, "provider deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Tariffs ---

/// list_tariffs
///
/// [Public Route] Lists tariffs from cheapest to most expensive.
#[utoipa::path(
    get,
    path = "/tariffs",
    params(TariffQuery),
    responses(
        (status = 200, description = "Tariffs", body = [Tariff]),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
pub async fn list_tariffs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Tariff>>, AppError> {
    let query: TariffQuery = validation::validate_query(params)?;
    Ok(Json(state.repo.list_tariffs(query).await?))
}

/// get_tariff
#[utoipa::path(
    get,
    path = "/tariffs/{id}",
    params(("id" = Uuid, Path, description = "Tariff ID")),
    responses(
        (status = 200, description = "Found", body = Tariff),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_tariff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Tariff>, AppError> {
    let id = validation::parse_id("id", &id)?;
    Ok(Json(state.repo.get_tariff(id).await?))
}

/// create_tariff
///
/// [Catalog Route] Adds a tariff to an existing provider. Tariff names are unique per provider.
#[utoipa::path(
    post,
    path = "/tariffs",
    request_body = CreateTariffRequest,
    responses(
        (status = 201, description = "Created", body = Tariff),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown provider", body = ErrorBody),
        (status = 409, description = "Duplicate name", body = ErrorBody)
    )
)]
pub async fn create_tariff(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Tariff>), AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let payload: CreateTariffRequest = validation::validate_json(&body)?;

    let tariff = state.repo.create_tariff(payload).await?;
    tracing::info!(tariff_id = %tariff.id, provider_id = %tariff.provider_id, "tariff created");
    Ok((StatusCode::CREATED, Json(tariff)))
}

/// update_tariff
#[utoipa::path(
    put,
    path = "/tariffs/{id}",
    params(("id" = Uuid, Path, description = "Tariff ID")),
    request_body = UpdateTariffRequest,
    responses(
        (status = 200, description = "Updated", body = Tariff),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Duplicate name", body = ErrorBody)
    )
)]
pub async fn update_tariff(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Tariff>, AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let id = validation::parse_id("id", &id)?;
    let payload: UpdateTariffRequest = validation::validate_json(&body)?;

    let tariff = state.repo.update_tariff(id, payload).await?;
    tracing::info!(tariff_id = %id, "tariff updated");
    Ok(Json(tariff))
}

/// delete_tariff
///
/// [Catalog Route] Removes a tariff. Leads that referenced it keep existing without the link.
#[utoipa::path(
    delete,
    path = "/tariffs/{id}",
    params(("id" = Uuid, Path, description = "Tariff ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_tariff(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let id = validation::parse_id("id", &id)?;

    state.repo.delete_tariff(id).await?;
    tracing::info!(tariff_id = %id, "tariff deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Media ---

/// get_presigned_url
///
/// [Catalog Route] Generates a short-lived URL for uploading a provider logo straight to
/// object storage. The key is server-generated (`logos/<uuid>.<ext>`) and the upload is pinned
/// to the declared image type.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported file type", body = ErrorBody),
        (status = 500, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn get_presigned_url(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    policy::require(&user, Capability::ManageCatalog)?;
    let payload: PresignedUrlRequest = validation::validate_json(&body)?;

    let object_key = format!("logos/{}.{}", Uuid::new_v4(), payload.extension());
    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(
        user_id = %user.id,
        filename = %payload.filename,
        key = %object_key,
        "issued logo upload url"
    );
    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}

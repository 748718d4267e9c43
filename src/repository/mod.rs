use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{Comparison, DashboardStats, Lead, Provider, Review, ReviewStatus, Tariff, User},
    policy::Role,
    schemas::{
        CreateLeadRequest, CreateProviderRequest, CreateReviewRequest, CreateTariffRequest,
        LeadQuery, PageQuery, ProviderQuery, TariffQuery, UpdateLeadRequest,
        UpdateProviderRequest, UpdateTariffRequest,
    },
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// Classified outcome of a failed persistence call. Every backend maps its native errors onto
/// these three kinds so handlers never see driver types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    /// The addressed row, or a row it references, does not exist.
    #[error("record not found")]
    NotFound,
    /// A uniqueness rule was violated. The message is safe to show to clients.
    #[error("{0}")]
    Conflict(String),
    /// Anything else; the detail is for server logs only.
    #[error("persistence failure: {0}")]
    Internal(String),
}

/// Repository Trait
///
/// Abstract contract for all persistence operations. Each method is one logical operation;
/// handlers call exactly one of them per request.
///
/// Ownership-scoped methods (`*_comparison*`) take the caller's id and report `NotFound` for
/// rows owned by someone else, so existence never leaks across users.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_user(&self, id: Uuid) -> Result<User, RepoError>;
    async fn list_users(&self, page: PageQuery) -> Result<Vec<User>, RepoError>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, RepoError>;

    // --- Providers ---
    async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, RepoError>;
    async fn get_provider(&self, id: Uuid) -> Result<Provider, RepoError>;
    // Conflict when the slug is taken.
    async fn create_provider(&self, req: CreateProviderRequest) -> Result<Provider, RepoError>;
    async fn update_provider(
        &self,
        id: Uuid,
        req: UpdateProviderRequest,
    ) -> Result<Provider, RepoError>;
    // Cascades to the provider's tariffs and reviews.
    async fn delete_provider(&self, id: Uuid) -> Result<(), RepoError>;

    // --- Tariffs ---
    async fn list_tariffs(&self, query: TariffQuery) -> Result<Vec<Tariff>, RepoError>;
    async fn get_tariff(&self, id: Uuid) -> Result<Tariff, RepoError>;
    // NotFound when the provider is missing, Conflict when the provider already has a tariff
    // with that name.
    async fn create_tariff(&self, req: CreateTariffRequest) -> Result<Tariff, RepoError>;
    async fn update_tariff(&self, id: Uuid, req: UpdateTariffRequest)
    -> Result<Tariff, RepoError>;
    async fn delete_tariff(&self, id: Uuid) -> Result<(), RepoError>;

    // --- Comparisons (owner-scoped) ---
    // NotFound unless every tariff exists.
    async fn create_comparison(
        &self,
        user_id: Uuid,
        title: String,
        tariff_ids: Vec<Uuid>,
    ) -> Result<Comparison, RepoError>;
    async fn list_comparisons(
        &self,
        user_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Comparison>, RepoError>;
    async fn get_comparison(&self, id: Uuid, user_id: Uuid) -> Result<Comparison, RepoError>;
    // Tariffs still in the catalog, in the comparison's order.
    async fn get_comparison_tariffs(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Tariff>, RepoError>;
    async fn delete_comparison(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError>;

    // --- Reviews ---
    // NotFound when the provider is missing, Conflict on a second review by the same user.
    async fn create_review(
        &self,
        provider_id: Uuid,
        user_id: Uuid,
        req: CreateReviewRequest,
    ) -> Result<Review, RepoError>;
    async fn list_approved_reviews(
        &self,
        provider_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Review>, RepoError>;
    async fn list_pending_reviews(&self, page: PageQuery) -> Result<Vec<Review>, RepoError>;
    async fn set_review_status(&self, id: Uuid, status: ReviewStatus)
    -> Result<Review, RepoError>;
    async fn delete_review(&self, id: Uuid) -> Result<(), RepoError>;

    // --- Leads ---
    // NotFound when the referenced tariff is missing.
    async fn create_lead(&self, req: CreateLeadRequest) -> Result<Lead, RepoError>;
    async fn list_leads(&self, query: LeadQuery) -> Result<Vec<Lead>, RepoError>;
    async fn update_lead(&self, id: Uuid, req: UpdateLeadRequest) -> Result<Lead, RepoError>;

    // --- Dashboard & maintenance ---
    async fn get_stats(&self) -> Result<DashboardStats, RepoError>;
    // Lower-cases and trims stored lead e-mails; returns the number of rows changed.
    async fn normalize_lead_emails(&self) -> Result<u64, RepoError>;
}

/// RepositoryState
///
/// Shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

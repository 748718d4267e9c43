//! Input schemas, one per operation.
//!
//! Each type is parsed with [`crate::validation::validate`]. serde attributes carry the
//! coercions (trimming, numbers from strings, defaults) and `validate` attributes the constraints.
//! All of them serialize back to the exact wire shape they accept, so re-validating a validated
//! value yields the same value.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{BillingPeriod, LeadStatus, ReviewStatus},
    policy::Role,
    validation::{coerce, coerce::parse_identifier, rules},
};

const DEFAULT_PER_PAGE: i64 = 20;

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

fn default_comparison_title() -> String {
    "My comparison".to_string()
}

// --- Queries ---

/// PageQuery
///
/// Plain pagination for list endpoints without other filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 10_000))]
    pub page: i64,
    #[serde(default = "default_per_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// ProviderQuery
///
/// Filters for the public provider listing (GET /providers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProviderQuery {
    /// Case-insensitive match on name or slug.
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[serde(default = "default_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 10_000))]
    pub page: i64,
    #[serde(default = "default_per_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

impl ProviderQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// TariffQuery
///
/// Filters for the public tariff listing (GET /tariffs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TariffQuery {
    #[serde(default, deserialize_with = "coerce::id_opt")]
    pub provider_id: Option<Uuid>,
    #[serde(default, deserialize_with = "coerce::enum_opt")]
    pub billing_period: Option<BillingPeriod>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 0))]
    pub max_price_cents: Option<i64>,
    #[serde(default = "default_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 10_000))]
    pub page: i64,
    #[serde(default = "default_per_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

impl TariffQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// LeadQuery
///
/// Filters for the lead inbox (GET /leads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadQuery {
    #[serde(default, deserialize_with = "coerce::enum_opt")]
    pub status: Option<LeadStatus>,
    #[serde(default = "default_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 10_000))]
    pub page: i64,
    #[serde(default = "default_per_page", deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

impl LeadQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// --- Catalog ---

/// CreateProviderRequest
///
/// Input payload for adding a provider (POST /providers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderRequest {
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 2, max = 64), custom(function = "rules::slug"))]
    #[schema(example = "fast-host")]
    pub slug: String,
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(url, length(max = 255))]
    #[schema(example = "https://fast-host.example")]
    pub website: String,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 255))]
    pub logo_key: Option<String>,
}

/// UpdateProviderRequest
///
/// Partial update of a provider (PUT /providers/{id}). Absent fields keep their value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProviderRequest {
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(min = 2, max = 64), custom(function = "rules::slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(url, length(max = 255))]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 255))]
    pub logo_key: Option<String>,
}

/// CreateTariffRequest
///
/// Input payload for adding a tariff (POST /tariffs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTariffRequest {
    #[serde(deserialize_with = "coerce::id")]
    pub provider_id: Uuid,
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(deserialize_with = "coerce::number")]
    #[validate(range(min = 0, max = 10_000_000))]
    pub price_cents: i64,
    pub billing_period: BillingPeriod,
    #[serde(deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 100_000))]
    pub disk_gb: i32,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub bandwidth_gb: Option<i32>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 1, max = 10_000))]
    pub sites: Option<i32>,
}

/// UpdateTariffRequest
///
/// Partial update of a tariff (PUT /tariffs/{id}). A tariff cannot move between providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTariffRequest {
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 0, max = 10_000_000))]
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "coerce::enum_opt")]
    pub billing_period: Option<BillingPeriod>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 1, max = 100_000))]
    pub disk_gb: Option<i32>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub bandwidth_gb: Option<i32>,
    #[serde(default, deserialize_with = "coerce::number_opt")]
    #[validate(range(min = 1, max = 10_000))]
    pub sites: Option<i32>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived logo upload URL (POST /upload/presigned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlRequest {
    /// The original filename, kept for audit logging only.
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "logo.png")]
    pub filename: String,
    /// The MIME type the upload is pinned to.
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(custom(function = "rules::logo_content_type"))]
    #[schema(example = "image/png")]
    pub file_type: String,
}

impl PresignedUrlRequest {
    /// File extension for the object key, derived from the validated MIME type.
    pub fn extension(&self) -> &'static str {
        match self.file_type.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

// --- Comparisons & Reviews ---

/// CreateComparisonRequest
///
/// Input payload for saving a comparison (POST /comparisons).
///
/// `tariff_ids` stays textual through parsing so that the count rule is reported before the
/// format of individual entries; [`CreateComparisonRequest::tariff_uuids`] gives the typed ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComparisonRequest {
    #[serde(default = "default_comparison_title", deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(deserialize_with = "coerce::trimmed_list")]
    #[validate(custom(function = "rules::tariff_selection"))]
    #[schema(value_type = Vec<Uuid>, min_items = 2, max_items = 4)]
    pub tariff_ids: Vec<String>,
}

impl CreateComparisonRequest {
    pub fn tariff_uuids(&self) -> Vec<Uuid> {
        self.tariff_ids
            .iter()
            .filter_map(|id| parse_identifier(id))
            .collect()
    }
}

/// CreateReviewRequest
///
/// Input payload for reviewing a provider (POST /providers/{id}/reviews).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(deserialize_with = "coerce::number")]
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 10, max = 2000))]
    pub body: String,
}

/// ReviewDecision
///
/// The outcomes a moderator may pick; a review cannot be sent back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ReviewStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected => ReviewStatus::Rejected,
        }
    }
}

/// ReviewStatusRequest
///
/// Input payload for moderating a review (PUT /reviews/{id}/status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewStatusRequest {
    pub status: ReviewDecision,
}

// --- Leads ---

/// CreateLeadRequest
///
/// Input payload of the public consultation form (POST /leads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(deserialize_with = "coerce::email")]
    #[validate(email, length(max = 255))]
    pub email: String,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 32), custom(function = "rules::phone"))]
    pub phone: Option<String>,
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default, deserialize_with = "coerce::id_opt")]
    pub tariff_id: Option<Uuid>,
}

/// UpdateLeadRequest
///
/// Partial update of a lead by a manager (PATCH /leads/{id}).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(default, deserialize_with = "coerce::enum_opt")]
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "coerce::trimmed_opt")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// --- Administration ---

/// UpdateRoleRequest
///
/// Input payload for changing a user's role (PUT /admin/users/{id}/role).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::policy::Role;

// --- Enumerations (Postgres enum types, see migrations/) ---

/// BillingPeriod
///
/// How often a tariff's price is charged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "billing_period", rename_all = "lowercase")]
#[ts(export)]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

/// ReviewStatus
///
/// Moderation state of a review. Only `Approved` reviews are visible publicly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[ts(export)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// LeadStatus
///
/// Sales pipeline stage of a lead. `Won` and `Lost` are closed; the rest count as open.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[ts(export)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Won,
    Lost,
}

impl LeadStatus {
    pub fn is_open(self) -> bool {
        !matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `profiles` table. `role` is kept as the raw stored text; the session resolver
/// parses it into a [`Role`] and treats anything unrecognised as no role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// UserProfile
///
/// Output of `GET /me`: the resolved identity of the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Provider
///
/// A hosting company listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    /// Unique URL-safe handle.
    pub slug: String,
    pub website: String,
    pub description: Option<String>,
    /// Object-storage key of the uploaded logo.
    pub logo_key: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Tariff
///
/// One hosting plan sold by a provider. Prices are integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tariff {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub billing_period: BillingPeriod,
    pub disk_gb: i32,
    /// `None` means unmetered.
    pub bandwidth_gb: Option<i32>,
    /// `None` means unlimited.
    pub sites: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comparison
///
/// A user's saved side-by-side view of several tariffs. `tariff_ids` keeps the user's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comparison {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub tariff_ids: Vec<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Review
///
/// A user's rating of a provider; one per user and provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub body: String,
    pub status: ReviewStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Lead
///
/// A consultation request left by a visitor, worked by managers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    /// The tariff the visitor asked about, if any.
    pub tariff_id: Option<Uuid>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// DashboardStats
///
/// Output schema for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub providers: i64,
    pub tariffs: i64,
    pub users: i64,
    pub comparisons: i64,
    pub pending_reviews: i64,
    pub open_leads: i64,
}

/// PresignedUrlResponse
///
/// Output schema containing the temporary URL for a direct client-to-storage logo upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store as the provider's `logoKey` once the upload finishes.
    pub resource_key: String,
}

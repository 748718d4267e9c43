use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{RepoError, Repository};
use crate::{
    models::{Comparison, DashboardStats, Lead, Provider, Review, ReviewStatus, Tariff, User},
    policy::Role,
    schemas::{
        CreateLeadRequest, CreateProviderRequest, CreateReviewRequest, CreateTariffRequest,
        LeadQuery, PageQuery, ProviderQuery, TariffQuery, UpdateLeadRequest,
        UpdateProviderRequest, UpdateTariffRequest,
    },
};

const USER_COLUMNS: &str = "id, email, role";
const PROVIDER_COLUMNS: &str =
    "id, name, slug, website, description, logo_key, created_at, updated_at";
const TARIFF_COLUMNS: &str = "id, provider_id, name, price_cents, billing_period, disk_gb, \
     bandwidth_gb, sites, created_at, updated_at";
const COMPARISON_COLUMNS: &str = "id, user_id, title, tariff_ids, created_at";
const REVIEW_COLUMNS: &str = "id, provider_id, user_id, rating, body, status, created_at";
const LEAD_COLUMNS: &str =
    "id, name, email, phone, message, tariff_id, status, notes, created_at, updated_at";

/// classify
///
/// Maps a driver error onto [`RepoError`]: missing rows and foreign-key violations become
/// `NotFound`, unique violations become `Conflict` with the given client-safe message, and
/// everything else is logged and returned as `Internal`.
fn classify(op: &'static str, conflict: &'static str) -> impl FnOnce(sqlx::Error) -> RepoError {
    move |err| match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(conflict.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::NotFound,
        other => {
            tracing::error!("{} error: {:?}", op, other);
            RepoError::Internal(other.to_string())
        }
    }
}

fn db_error(op: &'static str) -> impl FnOnce(sqlx::Error) -> RepoError {
    classify(op, "record already exists")
}

fn affected(op: &'static str, rows: u64) -> Result<(), RepoError> {
    if rows == 0 {
        tracing::debug!("{} matched no rows", op);
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}

/// Escapes `LIKE` wildcards in user input and wraps it for a substring match.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: &PageQuery) {
    builder.push(" LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
}

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are built at runtime (no compile-time database
/// access needed); every user value goes through a bind parameter.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Profiles ---

    async fn get_user(&self, id: Uuid) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM profiles WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("get_user"))
    }

    async fn list_users(&self, page: PageQuery) -> Result<Vec<User>, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles ORDER BY email ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_users"))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE profiles SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("set_user_role"))
    }

    // --- Providers ---

    async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, RepoError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE TRUE"));

        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR slug ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY name ASC");
        push_page(&mut builder, &query.page());

        builder
            .build_query_as::<Provider>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list_providers"))
    }

    async fn get_provider(&self, id: Uuid) -> Result<Provider, RepoError> {
        sqlx::query_as::<_, Provider>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("get_provider"))
    }

    async fn create_provider(&self, req: CreateProviderRequest) -> Result<Provider, RepoError> {
        sqlx::query_as::<_, Provider>(&format!(
            "INSERT INTO providers (id, name, slug, website, description, logo_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {PROVIDER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.slug)
        .bind(req.website)
        .bind(req.description)
        .bind(req.logo_key)
        .fetch_one(&self.pool)
        .await
        .map_err(classify("create_provider", "provider slug is already taken"))
    }

    /// Partial update: `COALESCE` keeps the stored value for every absent field.
    async fn update_provider(
        &self,
        id: Uuid,
        req: UpdateProviderRequest,
    ) -> Result<Provider, RepoError> {
        sqlx::query_as::<_, Provider>(&format!(
            r#"
            UPDATE providers
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                website = COALESCE($4, website),
                description = COALESCE($5, description),
                logo_key = COALESCE($6, logo_key),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROVIDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.slug)
        .bind(req.website)
        .bind(req.description)
        .bind(req.logo_key)
        .fetch_one(&self.pool)
        .await
        .map_err(classify("update_provider", "provider slug is already taken"))
    }

    async fn delete_provider(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_provider"))?;
        affected("delete_provider", result.rows_affected())
    }

    // --- Tariffs ---

    async fn list_tariffs(&self, query: TariffQuery) -> Result<Vec<Tariff>, RepoError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {TARIFF_COLUMNS} FROM tariffs WHERE TRUE"));

        if let Some(provider_id) = query.provider_id {
            builder.push(" AND provider_id = ");
            builder.push_bind(provider_id);
        }
        if let Some(period) = query.billing_period {
            builder.push(" AND billing_period = ");
            builder.push_bind(period);
        }
        if let Some(max_price) = query.max_price_cents {
            builder.push(" AND price_cents <= ");
            builder.push_bind(max_price);
        }

        builder.push(" ORDER BY price_cents ASC, name ASC");
        push_page(&mut builder, &query.page());

        builder
            .build_query_as::<Tariff>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list_tariffs"))
    }

    async fn get_tariff(&self, id: Uuid) -> Result<Tariff, RepoError> {
        sqlx::query_as::<_, Tariff>(&format!("SELECT {TARIFF_COLUMNS} FROM tariffs WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("get_tariff"))
    }

    async fn create_tariff(&self, req: CreateTariffRequest) -> Result<Tariff, RepoError> {
        sqlx::query_as::<_, Tariff>(&format!(
            "INSERT INTO tariffs (id, provider_id, name, price_cents, billing_period, disk_gb, \
             bandwidth_gb, sites, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) RETURNING {TARIFF_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.provider_id)
        .bind(req.name)
        .bind(req.price_cents)
        .bind(req.billing_period)
        .bind(req.disk_gb)
        .bind(req.bandwidth_gb)
        .bind(req.sites)
        .fetch_one(&self.pool)
        .await
        .map_err(classify(
            "create_tariff",
            "provider already has a tariff with this name",
        ))
    }

    async fn update_tariff(
        &self,
        id: Uuid,
        req: UpdateTariffRequest,
    ) -> Result<Tariff, RepoError> {
        sqlx::query_as::<_, Tariff>(&format!(
            r#"
            UPDATE tariffs
            SET name = COALESCE($2, name),
                price_cents = COALESCE($3, price_cents),
                billing_period = COALESCE($4, billing_period),
                disk_gb = COALESCE($5, disk_gb),
                bandwidth_gb = COALESCE($6, bandwidth_gb),
                sites = COALESCE($7, sites),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TARIFF_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.price_cents)
        .bind(req.billing_period)
        .bind(req.disk_gb)
        .bind(req.bandwidth_gb)
        .bind(req.sites)
        .fetch_one(&self.pool)
        .await
        .map_err(classify(
            "update_tariff",
            "provider already has a tariff with this name",
        ))
    }

    async fn delete_tariff(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tariffs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_tariff"))?;
        affected("delete_tariff", result.rows_affected())
    }

    // --- Comparisons ---

    /// Single statement: the row is only inserted when every referenced tariff exists.
    async fn create_comparison(
        &self,
        user_id: Uuid,
        title: String,
        tariff_ids: Vec<Uuid>,
    ) -> Result<Comparison, RepoError> {
        sqlx::query_as::<_, Comparison>(&format!(
            r#"
            INSERT INTO comparisons (id, user_id, title, tariff_ids, created_at)
            SELECT $1, $2, $3, $4, NOW()
            WHERE (SELECT COUNT(*) FROM tariffs WHERE id = ANY($4)) = cardinality($4)
            RETURNING {COMPARISON_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(tariff_ids)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("create_comparison"))?
        .ok_or(RepoError::NotFound)
    }

    async fn list_comparisons(
        &self,
        user_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Comparison>, RepoError> {
        sqlx::query_as::<_, Comparison>(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM comparisons WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_comparisons"))
    }

    async fn get_comparison(&self, id: Uuid, user_id: Uuid) -> Result<Comparison, RepoError> {
        sqlx::query_as::<_, Comparison>(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM comparisons WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("get_comparison"))
    }

    async fn get_comparison_tariffs(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Tariff>, RepoError> {
        let tariff_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT tariff_ids FROM comparisons WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("get_comparison_tariffs"))?;

        sqlx::query_as::<_, Tariff>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM tariffs WHERE id = ANY($1) \
             ORDER BY array_position($1, id)"
        ))
        .bind(tariff_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("get_comparison_tariffs"))
    }

    async fn delete_comparison(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comparisons WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_comparison"))?;
        affected("delete_comparison", result.rows_affected())
    }

    // --- Reviews ---

    async fn create_review(
        &self,
        provider_id: Uuid,
        user_id: Uuid,
        req: CreateReviewRequest,
    ) -> Result<Review, RepoError> {
        sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (id, provider_id, user_id, rating, body, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'pending', NOW()) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(provider_id)
        .bind(user_id)
        .bind(req.rating)
        .bind(req.body)
        .fetch_one(&self.pool)
        .await
        .map_err(classify(
            "create_review",
            "you have already reviewed this provider",
        ))
    }

    async fn list_approved_reviews(
        &self,
        provider_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Review>, RepoError> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE provider_id = $1 AND status = 'approved' \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(provider_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_approved_reviews"))
    }

    /// Oldest first, so the moderation queue is worked in arrival order.
    async fn list_pending_reviews(&self, page: PageQuery) -> Result<Vec<Review>, RepoError> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE status = 'pending' \
             ORDER BY created_at ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_pending_reviews"))
    }

    async fn set_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<Review, RepoError> {
        sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews SET status = $2 WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("set_review_status"))
    }

    async fn delete_review(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_review"))?;
        affected("delete_review", result.rows_affected())
    }

    // --- Leads ---

    async fn create_lead(&self, req: CreateLeadRequest) -> Result<Lead, RepoError> {
        sqlx::query_as::<_, Lead>(&format!(
            "INSERT INTO leads (id, name, email, phone, message, tariff_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'new', NOW(), NOW()) RETURNING {LEAD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.email)
        .bind(req.phone)
        .bind(req.message)
        .bind(req.tariff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create_lead"))
    }

    async fn list_leads(&self, query: LeadQuery) -> Result<Vec<Lead>, RepoError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LEAD_COLUMNS} FROM leads WHERE TRUE"));

        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        builder.push(" ORDER BY created_at DESC");
        push_page(&mut builder, &query.page());

        builder
            .build_query_as::<Lead>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list_leads"))
    }

    async fn update_lead(&self, id: Uuid, req: UpdateLeadRequest) -> Result<Lead, RepoError> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads
            SET status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.status)
        .bind(req.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("update_lead"))
    }

    // --- Dashboard & maintenance ---

    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM providers) AS providers,
                (SELECT COUNT(*) FROM tariffs) AS tariffs,
                (SELECT COUNT(*) FROM profiles) AS users,
                (SELECT COUNT(*) FROM comparisons) AS comparisons,
                (SELECT COUNT(*) FROM reviews WHERE status = 'pending') AS pending_reviews,
                (SELECT COUNT(*) FROM leads WHERE status NOT IN ('won', 'lost')) AS open_leads
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("get_stats"))
    }

    async fn normalize_lead_emails(&self) -> Result<u64, RepoError> {
        let result = sqlx::query(
            "UPDATE leads SET email = LOWER(TRIM(email)), updated_at = NOW() \
             WHERE email <> LOWER(TRIM(email))",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error("normalize_lead_emails"))?;
        Ok(result.rows_affected())
    }
}

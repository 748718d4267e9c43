use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RepoError, Repository};
use crate::{
    models::{
        Comparison, DashboardStats, Lead, LeadStatus, Provider, Review, ReviewStatus, Tariff,
        User,
    },
    policy::Role,
    schemas::{
        CreateLeadRequest, CreateProviderRequest, CreateReviewRequest, CreateTariffRequest,
        LeadQuery, PageQuery, ProviderQuery, TariffQuery, UpdateLeadRequest,
        UpdateProviderRequest, UpdateTariffRequest,
    },
};

#[derive(Default)]
struct MemoryStore {
    users: HashMap<Uuid, User>,
    providers: HashMap<Uuid, Provider>,
    tariffs: HashMap<Uuid, Tariff>,
    // Insertion order doubles as creation order for the list endpoints.
    comparisons: Vec<Comparison>,
    reviews: Vec<Review>,
    leads: Vec<Lead>,
}

fn paginate<T>(items: impl Iterator<Item = T>, page: &PageQuery) -> Vec<T> {
    items
        .skip(page.offset().max(0) as usize)
        .take(page.limit().max(0) as usize)
        .collect()
}

/// MemoryRepository
///
/// `Repository` kept entirely in process memory. It enforces the same uniqueness, reference and
/// cascade rules as the Postgres schema and is what the HTTP tests run against.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<MemoryStore>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn insert_user(&self, user: User) -> Result<(), RepoError> {
        self.store()?.users.insert(user.id, user);
        Ok(())
    }

    fn store(&self) -> Result<MutexGuard<'_, MemoryStore>, RepoError> {
        self.store
            .lock()
            .map_err(|_| RepoError::Internal("memory store lock poisoned".to_string()))
    }
}

impl MemoryStore {
    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.providers
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn tariff_name_taken(&self, provider_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.tariffs
            .values()
            .any(|t| t.provider_id == provider_id && t.name == name && Some(t.id) != except)
    }

    fn detach_leads(&mut self, tariff_ids: &[Uuid]) {
        for lead in &mut self.leads {
            if lead.tariff_id.is_some_and(|id| tariff_ids.contains(&id)) {
                lead.tariff_id = None;
            }
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- Profiles ---

    async fn get_user(&self, id: Uuid) -> Result<User, RepoError> {
        self.store()?.users.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn list_users(&self, page: PageQuery) -> Result<Vec<User>, RepoError> {
        let store = self.store()?;
        let mut users: Vec<User> = store.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(paginate(users.into_iter(), &page))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, RepoError> {
        let mut store = self.store()?;
        let user = store.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.role = role.as_str().to_string();
        Ok(user.clone())
    }

    // --- Providers ---

    async fn list_providers(&self, query: ProviderQuery) -> Result<Vec<Provider>, RepoError> {
        let store = self.store()?;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut providers: Vec<Provider> = store
            .providers
            .values()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n) || p.slug.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(providers.into_iter(), &query.page()))
    }

    async fn get_provider(&self, id: Uuid) -> Result<Provider, RepoError> {
        self.store()?
            .providers
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_provider(&self, req: CreateProviderRequest) -> Result<Provider, RepoError> {
        let mut store = self.store()?;
        if store.slug_taken(&req.slug, None) {
            return Err(RepoError::Conflict("provider slug is already taken".to_string()));
        }
        let now = Utc::now();
        let provider = Provider {
            id: Uuid::new_v4(),
            name: req.name,
            slug: req.slug,
            website: req.website,
            description: req.description,
            logo_key: req.logo_key,
            created_at: now,
            updated_at: now,
        };
        store.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn update_provider(
        &self,
        id: Uuid,
        req: UpdateProviderRequest,
    ) -> Result<Provider, RepoError> {
        let mut store = self.store()?;
        if !store.providers.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        if let Some(slug) = &req.slug {
            if store.slug_taken(slug, Some(id)) {
                return Err(RepoError::Conflict("provider slug is already taken".to_string()));
            }
        }
        let provider = store.providers.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(name) = req.name {
            provider.name = name;
        }
        if let Some(slug) = req.slug {
            provider.slug = slug;
        }
        if let Some(website) = req.website {
            provider.website = website;
        }
        if req.description.is_some() {
            provider.description = req.description;
        }
        if req.logo_key.is_some() {
            provider.logo_key = req.logo_key;
        }
        provider.updated_at = Utc::now();
        Ok(provider.clone())
    }

    async fn delete_provider(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store()?;
        store.providers.remove(&id).ok_or(RepoError::NotFound)?;

        let removed: Vec<Uuid> = store
            .tariffs
            .values()
            .filter(|t| t.provider_id == id)
            .map(|t| t.id)
            .collect();
        store.tariffs.retain(|_, t| t.provider_id != id);
        store.reviews.retain(|r| r.provider_id != id);
        store.detach_leads(&removed);
        Ok(())
    }

    // --- Tariffs ---

    async fn list_tariffs(&self, query: TariffQuery) -> Result<Vec<Tariff>, RepoError> {
        let store = self.store()?;
        let mut tariffs: Vec<Tariff> = store
            .tariffs
            .values()
            .filter(|t| query.provider_id.is_none_or(|id| t.provider_id == id))
            .filter(|t| query.billing_period.is_none_or(|p| t.billing_period == p))
            .filter(|t| query.max_price_cents.is_none_or(|max| t.price_cents <= max))
            .cloned()
            .collect();
        tariffs.sort_by(|a, b| {
            a.price_cents
                .cmp(&b.price_cents)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(paginate(tariffs.into_iter(), &query.page()))
    }

    async fn get_tariff(&self, id: Uuid) -> Result<Tariff, RepoError> {
        self.store()?
            .tariffs
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_tariff(&self, req: CreateTariffRequest) -> Result<Tariff, RepoError> {
        let mut store = self.store()?;
        if !store.providers.contains_key(&req.provider_id) {
            return Err(RepoError::NotFound);
        }
        if store.tariff_name_taken(req.provider_id, &req.name, None) {
            return Err(RepoError::Conflict(
                "provider already has a tariff with this name".to_string(),
            ));
        }
        let now = Utc::now();
        let tariff = Tariff {
            id: Uuid::new_v4(),
            provider_id: req.provider_id,
            name: req.name,
            price_cents: req.price_cents,
            billing_period: req.billing_period,
            disk_gb: req.disk_gb,
            bandwidth_gb: req.bandwidth_gb,
            sites: req.sites,
            created_at: now,
            updated_at: now,
        };
        store.tariffs.insert(tariff.id, tariff.clone());
        Ok(tariff)
    }

    async fn update_tariff(
        &self,
        id: Uuid,
        req: UpdateTariffRequest,
    ) -> Result<Tariff, RepoError> {
        let mut store = self.store()?;
        let provider_id = store
            .tariffs
            .get(&id)
            .map(|t| t.provider_id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = &req.name {
            if store.tariff_name_taken(provider_id, name, Some(id)) {
                return Err(RepoError::Conflict(
                    "provider already has a tariff with this name".to_string(),
                ));
            }
        }
        let tariff = store.tariffs.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(name) = req.name {
            tariff.name = name;
        }
        if let Some(price) = req.price_cents {
            tariff.price_cents = price;
        }
        if let Some(period) = req.billing_period {
            tariff.billing_period = period;
        }
        if let Some(disk) = req.disk_gb {
            tariff.disk_gb = disk;
        }
        if req.bandwidth_gb.is_some() {
            tariff.bandwidth_gb = req.bandwidth_gb;
        }
        if req.sites.is_some() {
            tariff.sites = req.sites;
        }
        tariff.updated_at = Utc::now();
        Ok(tariff.clone())
    }

    async fn delete_tariff(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store()?;
        store.tariffs.remove(&id).ok_or(RepoError::NotFound)?;
        store.detach_leads(&[id]);
        Ok(())
    }

    // --- Comparisons ---

    async fn create_comparison(
        &self,
        user_id: Uuid,
        title: String,
        tariff_ids: Vec<Uuid>,
    ) -> Result<Comparison, RepoError> {
        let mut store = self.store()?;
        if !tariff_ids.iter().all(|id| store.tariffs.contains_key(id)) {
            return Err(RepoError::NotFound);
        }
        let comparison = Comparison {
            id: Uuid::new_v4(),
            user_id,
            title,
            tariff_ids,
            created_at: Utc::now(),
        };
        store.comparisons.push(comparison.clone());
        Ok(comparison)
    }

    async fn list_comparisons(
        &self,
        user_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Comparison>, RepoError> {
        let store = self.store()?;
        let owned = store
            .comparisons
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned();
        Ok(paginate(owned, &page))
    }

    async fn get_comparison(&self, id: Uuid, user_id: Uuid) -> Result<Comparison, RepoError> {
        self.store()?
            .comparisons
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_comparison_tariffs(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Tariff>, RepoError> {
        let store = self.store()?;
        let comparison = store
            .comparisons
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        Ok(comparison
            .tariff_ids
            .iter()
            .filter_map(|tariff_id| store.tariffs.get(tariff_id).cloned())
            .collect())
    }

    async fn delete_comparison(&self, id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store()?;
        let before = store.comparisons.len();
        store
            .comparisons
            .retain(|c| !(c.id == id && c.user_id == user_id));
        if store.comparisons.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- Reviews ---

    async fn create_review(
        &self,
        provider_id: Uuid,
        user_id: Uuid,
        req: CreateReviewRequest,
    ) -> Result<Review, RepoError> {
        let mut store = self.store()?;
        if !store.providers.contains_key(&provider_id) {
            return Err(RepoError::NotFound);
        }
        if store
            .reviews
            .iter()
            .any(|r| r.provider_id == provider_id && r.user_id == user_id)
        {
            return Err(RepoError::Conflict(
                "you have already reviewed this provider".to_string(),
            ));
        }
        let review = Review {
            id: Uuid::new_v4(),
            provider_id,
            user_id,
            rating: req.rating,
            body: req.body,
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
        };
        store.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_approved_reviews(
        &self,
        provider_id: Uuid,
        page: PageQuery,
    ) -> Result<Vec<Review>, RepoError> {
        let store = self.store()?;
        let approved = store
            .reviews
            .iter()
            .rev()
            .filter(|r| r.provider_id == provider_id && r.status == ReviewStatus::Approved)
            .cloned();
        Ok(paginate(approved, &page))
    }

    async fn list_pending_reviews(&self, page: PageQuery) -> Result<Vec<Review>, RepoError> {
        let store = self.store()?;
        let pending = store
            .reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Pending)
            .cloned();
        Ok(paginate(pending, &page))
    }

    async fn set_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<Review, RepoError> {
        let mut store = self.store()?;
        let review = store
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepoError::NotFound)?;
        review.status = status;
        Ok(review.clone())
    }

    async fn delete_review(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store()?;
        let before = store.reviews.len();
        store.reviews.retain(|r| r.id != id);
        if store.reviews.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- Leads ---

    async fn create_lead(&self, req: CreateLeadRequest) -> Result<Lead, RepoError> {
        let mut store = self.store()?;
        if let Some(tariff_id) = req.tariff_id {
            if !store.tariffs.contains_key(&tariff_id) {
                return Err(RepoError::NotFound);
            }
        }
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            phone: req.phone,
            message: req.message,
            tariff_id: req.tariff_id,
            status: LeadStatus::New,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        store.leads.push(lead.clone());
        Ok(lead)
    }

    async fn list_leads(&self, query: LeadQuery) -> Result<Vec<Lead>, RepoError> {
        let store = self.store()?;
        let leads = store
            .leads
            .iter()
            .rev()
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned();
        Ok(paginate(leads, &query.page()))
    }

    async fn update_lead(&self, id: Uuid, req: UpdateLeadRequest) -> Result<Lead, RepoError> {
        let mut store = self.store()?;
        let lead = store
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(status) = req.status {
            lead.status = status;
        }
        if req.notes.is_some() {
            lead.notes = req.notes;
        }
        lead.updated_at = Utc::now();
        Ok(lead.clone())
    }

    // --- Dashboard & maintenance ---

    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        let store = self.store()?;
        Ok(DashboardStats {
            providers: store.providers.len() as i64,
            tariffs: store.tariffs.len() as i64,
            users: store.users.len() as i64,
            comparisons: store.comparisons.len() as i64,
            pending_reviews: store
                .reviews
                .iter()
                .filter(|r| r.status == ReviewStatus::Pending)
                .count() as i64,
            open_leads: store.leads.iter().filter(|l| l.status.is_open()).count() as i64,
        })
    }

    async fn normalize_lead_emails(&self) -> Result<u64, RepoError> {
        let mut store = self.store()?;
        let mut changed = 0;
        for lead in &mut store.leads {
            let normalized = lead.email.trim().to_lowercase();
            if normalized != lead.email {
                lead.email = normalized;
                lead.updated_at = Utc::now();
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// Professional profiles: public search, owner-only edits, photos

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::professional::{AttendanceType, Professional, ProfessionalFilter};
use crate::services::photos::{check_upload, PhotoStorage, PhotoStorageError};
use crate::store::{Store, StoreError};
use crate::validation::{validate_profile, FieldErrors, ProfileInput};

/// Default listing page size
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Error type for profile operations
#[derive(Debug, thiserror::Error)]
pub enum ProfessionalError {
    #[error("Professional not found")]
    NotFound,

    /// Caller does not own the profile
    #[error("You can only modify your own profile")]
    Forbidden,

    #[error("Invalid page")]
    PageNotFound,

    #[error("{0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Photo(#[from] PhotoStorageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalSummary {
    pub id: i64,
    pub name: String,
    pub services: Vec<String>,
    pub city: String,
    pub state: String,
    pub price_per_session: f64,
    pub attendance_type: AttendanceType,
    pub photo_url: Option<String>,
}

impl From<&Professional> for ProfessionalSummary {
    fn from(p: &Professional) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            services: p.services.clone(),
            city: p.city.clone(),
            state: p.state.clone(),
            price_per_session: p.price_per_session,
            attendance_type: p.attendance_type,
            photo_url: p.photo_url.clone(),
        }
    }
}

/// One listing page; `next`/`previous` are page numbers
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

#[derive(Clone)]
pub struct ProfessionalService {
    store: Arc<dyn Store>,
    photos: Arc<dyn PhotoStorage>,
    page_size: u32,
}

impl ProfessionalService {
    pub fn new(store: Arc<dyn Store>, photos: Arc<dyn PhotoStorage>, page_size: u32) -> Self {
        Self {
            store,
            photos,
            page_size: page_size.max(1),
        }
    }

    /// Filtered listing, newest first
    ///
    /// Pages are 1-based. An empty result still has page 1; any page past
    /// the last is `PageNotFound`.
    pub async fn list(
        &self,
        filter: &ProfessionalFilter,
        page: u32,
    ) -> Result<Page<ProfessionalSummary>, ProfessionalError> {
        if page == 0 {
            return Err(ProfessionalError::PageNotFound);
        }

        let size = i64::from(self.page_size);
        let offset = i64::from(page - 1) * size;
        let (rows, count) = self.store.list_professionals(filter, size, offset).await?;

        let last_page = ((count + size - 1) / size).max(1);
        if i64::from(page) > last_page {
            return Err(ProfessionalError::PageNotFound);
        }

        Ok(Page {
            count,
            next: (i64::from(page) < last_page).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results: rows.iter().map(ProfessionalSummary::from).collect(),
        })
    }

    pub async fn get(&self, id: i64) -> Result<Professional, ProfessionalError> {
        self.store
            .find_professional(id)
            .await?
            .ok_or(ProfessionalError::NotFound)
    }

    /// Full (`partial = false`) or partial update by the owner
    ///
    /// Absent fields keep their stored values; a full update additionally
    /// requires every mandatory field to be present.
    pub async fn update(
        &self,
        account_id: i64,
        id: i64,
        input: &ProfileInput,
        partial: bool,
    ) -> Result<Professional, ProfessionalError> {
        let current = self.owned(account_id, id).await?;

        if !partial {
            let missing = input.missing_required();
            if !missing.is_empty() {
                return Err(ProfessionalError::Validation(missing));
            }
        }

        let fields = validate_profile(&input.merged_over(&current.fields())).map_err(ProfessionalError::Validation)?;

        let updated = self
            .store
            .update_professional(id, &fields)
            .await?
            .ok_or(ProfessionalError::NotFound)?;

        info!(professional_id = id, account_id, "Profile updated");

        Ok(updated)
    }

    /// Deletes the profile and its photo; the account remains
    pub async fn delete(&self, account_id: i64, id: i64) -> Result<(), ProfessionalError> {
        let current = self.owned(account_id, id).await?;

        if !self.store.delete_professional(id).await? {
            return Err(ProfessionalError::NotFound);
        }

        if let Some(url) = &current.photo_url {
            if let Err(e) = self.photos.delete(url).await {
                warn!(professional_id = id, error = %e, "Failed to delete photo of removed profile");
            }
        }

        info!(professional_id = id, account_id, "Profile deleted");

        Ok(())
    }

    /// Replaces the profile photo and returns the updated profile
    pub async fn upload_photo(
        &self,
        account_id: i64,
        id: i64,
        data: Bytes,
        content_type: &str,
    ) -> Result<Professional, ProfessionalError> {
        let current = self.owned(account_id, id).await?;
        check_upload(content_type, data.len())?;

        let url = self.photos.save(data, content_type).await?;

        let updated = match self.store.set_professional_photo(id, Some(&url)).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard(&url).await;
                return Err(ProfessionalError::NotFound);
            }
            Err(e) => {
                self.discard(&url).await;
                return Err(e.into());
            }
        };

        if let Some(old) = &current.photo_url {
            self.discard(old).await;
        }

        info!(professional_id = id, "Photo uploaded");

        Ok(updated)
    }

    async fn owned(&self, account_id: i64, id: i64) -> Result<Professional, ProfessionalError> {
        let professional = self.get(id).await?;

        if professional.account_id != account_id {
            warn!(professional_id = id, account_id, "Refused edit of foreign profile");
            return Err(ProfessionalError::Forbidden);
        }

        Ok(professional)
    }

    async fn discard(&self, url: &str) {
        if let Err(e) = self.photos.delete(url).await {
            warn!(error = %e, "Failed to delete photo");
        }
    }
}

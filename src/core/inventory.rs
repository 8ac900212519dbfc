//! Inventory workflow - ties the catalog view, the form session and the API.

use crate::api::{CatalogApi, with_timeout};
use crate::config::{AppConfig, CatalogSettings};
use crate::core::catalog::CatalogView;
use crate::core::session::FormSession;
use crate::errors::{Error, Result};
use crate::models::{Category, GroupId, ProductGroup};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Catalog plus the one form that may be open over it.
pub struct Inventory {
    api: Arc<dyn CatalogApi>,
    settings: CatalogSettings,
    catalog: CatalogView,
    session: FormSession,
    timeout: Duration,
}

impl Inventory {
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>, config: &AppConfig) -> Self {
        Self {
            api,
            catalog: CatalogView::new(config.catalog.low_stock_threshold),
            settings: config.catalog.clone(),
            session: FormSession::new(config.api.request_timeout()),
            timeout: config.api.request_timeout(),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogView {
        &self.catalog
    }

    pub const fn catalog_mut(&mut self) -> &mut CatalogView {
        &mut self.catalog
    }

    #[must_use]
    pub const fn session(&self) -> &FormSession {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut FormSession {
        &mut self.session
    }

    /// Shared handle to the backend, for work such as uploads that must run
    /// while the session is being edited.
    #[must_use]
    pub fn api_handle(&self) -> Arc<dyn CatalogApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches every group and replaces the catalog with them.
    ///
    /// # Errors
    /// Returns the API error; the catalog is left as it was.
    pub async fn load(&mut self) -> Result<usize> {
        let records = with_timeout("list groups", self.timeout, self.api.list_groups()).await?;
        let groups: Vec<ProductGroup> = records
            .into_iter()
            .map(|record| record.into_group(&self.settings))
            .collect();
        let count = groups.len();
        self.catalog.replace_all(groups);
        info!("Loaded {count} product groups");
        Ok(count)
    }

    /// Re-fetches one group and puts it into the catalog.
    ///
    /// # Errors
    /// Returns `Error::GroupNotFound` for an id the backend cannot know, or
    /// the API error.
    pub async fn refresh_group(&mut self, id: &GroupId) -> Result<&ProductGroup> {
        let remote_id = id
            .as_remote()
            .ok_or_else(|| Error::GroupNotFound { id: id.to_string() })?;
        let record = with_timeout("get group", self.timeout, self.api.get_group(remote_id)).await?;
        let group = record.into_group(&self.settings);
        self.catalog.upsert(group);
        self.catalog
            .get(id)
            .ok_or_else(|| Error::GroupNotFound { id: id.to_string() })
    }

    /// Opens the form for a new group of `category`.
    ///
    /// # Errors
    /// Returns `Error::InvalidSession` if a form is already open.
    pub async fn start_create(&mut self, category: Category) -> Result<()> {
        self.session
            .open_create(&self.api, category, &self.settings.material)
            .await
    }

    /// Opens the form for the catalog group `id`.
    ///
    /// # Errors
    /// Returns `Error::GroupNotFound` or `Error::InvalidSession`.
    pub async fn start_edit(&mut self, id: &GroupId) -> Result<()> {
        let group = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::GroupNotFound { id: id.to_string() })?;
        self.session.open_edit(&self.api, group).await
    }

    pub async fn cancel(&mut self) {
        self.session.close().await;
    }

    /// Saves the open form. The saved group replaces its catalog entry, also
    /// when only some variant requests succeeded, so completed work stays
    /// visible.
    ///
    /// # Errors
    /// Returns the error of [`FormSession::submit`].
    pub async fn save(&mut self) -> Result<ProductGroup> {
        match self.session.submit(self.api.as_ref(), self.timeout).await {
            Ok(group) => {
                self.catalog.upsert(group.clone());
                Ok(group)
            }
            Err(Error::PartialBatch(failure)) => {
                warn!("Saved with failures: {failure}");
                if let Some(draft) = self.session.draft() {
                    let draft = draft.clone();
                    self.catalog.upsert(draft);
                }
                Err(Error::PartialBatch(failure))
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a group from the view only.
    ///
    /// # Errors
    /// Returns `Error::GroupNotFound` if the group is not in the catalog.
    pub fn delete_group(&mut self, id: &GroupId) -> Result<ProductGroup> {
        let removed = self.catalog.remove_group(id)?;
        info!("Removed group {id} from the catalog view");
        Ok(removed)
    }
}

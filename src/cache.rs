//! Session-scoped cache of reference data (colors and sizes).
//!
//! Each form session owns one epoch of the cache. Fetches capture the epoch they
//! were started for and only write their result back if it is still current, so
//! a late response for a session that has since closed is dropped.

use crate::api::{CatalogApi, with_timeout};
use crate::errors::{Error, ReferenceKind, Result};
use crate::models::{Color, Size};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Load state of one reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceList<T> {
    /// Nothing requested yet
    Idle,
    /// Request in flight
    Loading,
    /// Fetched successfully
    Loaded(Vec<T>),
    /// Fetch failed; the list reads as empty and the message is shown as a warning
    Failed(String),
}

impl<T> Default for ReferenceList<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ReferenceList<T> {
    /// The items, or an empty slice unless loaded.
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Loaded(items) => items,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Warning text for a failed load.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ReferenceState {
    epoch: u64,
    colors: ReferenceList<Color>,
    sizes: ReferenceList<Size>,
}

/// Shared handle to the reference lists of the active session.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    inner: Arc<RwLock<ReferenceState>>,
}

impl ReferenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch.
    pub async fn epoch(&self) -> u64 {
        self.inner.read().await.epoch
    }

    /// Starts a new epoch and empties both lists. Fetches started for an older
    /// epoch will no longer apply.
    pub async fn reset(&self) -> u64 {
        let mut state = self.inner.write().await;
        state.epoch += 1;
        state.colors = ReferenceList::Idle;
        state.sizes = ReferenceList::Idle;
        trace!("Reference cache reset to epoch {}", state.epoch);
        state.epoch
    }

    pub async fn colors(&self) -> ReferenceList<Color> {
        self.inner.read().await.colors.clone()
    }

    pub async fn sizes(&self) -> ReferenceList<Size> {
        self.inner.read().await.sizes.clone()
    }

    pub async fn find_color(&self, color_id: i64) -> Option<Color> {
        let state = self.inner.read().await;
        state.colors.items().iter().find(|c| c.id == color_id).cloned()
    }

    pub async fn find_size(&self, size_id: i64) -> Option<Size> {
        let state = self.inner.read().await;
        state.sizes.items().iter().find(|s| s.id == size_id).cloned()
    }

    /// Warnings for every list that failed to load.
    pub async fn warnings(&self) -> Vec<String> {
        let state = self.inner.read().await;
        state
            .colors
            .warning()
            .into_iter()
            .chain(state.sizes.warning())
            .map(ToString::to_string)
            .collect()
    }

    /// Fetches the color list for `epoch`, giving up after `timeout`.
    ///
    /// # Errors
    /// Returns `Error::ReferenceData` if the fetch failed or timed out. The
    /// failure is also recorded in the cache, unless the epoch went stale in
    /// the meantime.
    pub async fn refresh_colors(
        &self,
        api: &dyn CatalogApi,
        epoch: u64,
        timeout: Duration,
    ) -> Result<()> {
        if !self.mark_loading(epoch, ReferenceKind::Colors).await {
            return Ok(());
        }
        info!("Refreshing colors cache...");
        let fetched = with_timeout("list colors", timeout, api.list_colors()).await;

        let mut state = self.inner.write().await;
        if state.epoch != epoch {
            debug!("Discarding colors fetched for stale epoch {epoch}");
            return Ok(());
        }
        match fetched {
            Ok(colors) => {
                info!("Colors cache refreshed with {} items.", colors.len());
                state.colors = ReferenceList::Loaded(colors);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                state.colors = ReferenceList::Failed(message.clone());
                Err(Error::ReferenceData {
                    kind: ReferenceKind::Colors,
                    message,
                })
            }
        }
    }

    /// Fetches the sizes of a sales group for `epoch`. Without a sales group
    /// the list is simply empty.
    ///
    /// # Errors
    /// Returns `Error::ReferenceData` if the fetch failed or timed out.
    pub async fn refresh_sizes(
        &self,
        api: &dyn CatalogApi,
        sales_group_id: Option<i64>,
        epoch: u64,
        timeout: Duration,
    ) -> Result<()> {
        let Some(sales_group_id) = sales_group_id else {
            let mut state = self.inner.write().await;
            if state.epoch == epoch {
                state.sizes = ReferenceList::Loaded(Vec::new());
            }
            return Ok(());
        };
        if !self.mark_loading(epoch, ReferenceKind::Sizes).await {
            return Ok(());
        }
        info!("Refreshing sizes cache for sales group {sales_group_id}...");
        let fetched = with_timeout("list sizes", timeout, api.list_sizes(sales_group_id)).await;

        let mut state = self.inner.write().await;
        if state.epoch != epoch {
            debug!("Discarding sizes fetched for stale epoch {epoch}");
            return Ok(());
        }
        match fetched {
            Ok(sizes) => {
                info!("Sizes cache refreshed with {} items.", sizes.len());
                state.sizes = ReferenceList::Loaded(sizes);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                state.sizes = ReferenceList::Failed(message.clone());
                Err(Error::ReferenceData {
                    kind: ReferenceKind::Sizes,
                    message,
                })
            }
        }
    }

    async fn mark_loading(&self, epoch: u64, kind: ReferenceKind) -> bool {
        let mut state = self.inner.write().await;
        if state.epoch != epoch {
            debug!("Skipping {kind} fetch for stale epoch {epoch}");
            return false;
        }
        match kind {
            ReferenceKind::Colors => state.colors = ReferenceList::Loading,
            ReferenceKind::Sizes => state.sizes = ReferenceList::Loading,
        }
        true
    }

    /// Starts both fetches as independent background tasks, each bounded by
    /// `timeout`.
    #[must_use]
    pub fn spawn_refresh(
        &self,
        api: &Arc<dyn CatalogApi>,
        sales_group_id: Option<i64>,
        epoch: u64,
        timeout: Duration,
    ) -> ReferenceLoad {
        let colors = {
            let cache = self.clone();
            let api = Arc::clone(api);
            tokio::spawn(async move {
                if let Err(e) = cache.refresh_colors(api.as_ref(), epoch, timeout).await {
                    warn!("{e}");
                }
            })
        };
        let sizes = {
            let cache = self.clone();
            let api = Arc::clone(api);
            tokio::spawn(async move {
                let refreshed = cache
                    .refresh_sizes(api.as_ref(), sales_group_id, epoch, timeout)
                    .await;
                if let Err(e) = refreshed {
                    warn!("{e}");
                }
            })
        };
        ReferenceLoad { colors, sizes }
    }
}

/// Handles of the background reference fetches of one session.
#[derive(Debug)]
pub struct ReferenceLoad {
    colors: JoinHandle<()>,
    sizes: JoinHandle<()>,
}

impl ReferenceLoad {
    /// Waits for both fetches to settle.
    pub async fn finished(self) {
        let (colors, sizes) = futures::join!(self.colors, self.sizes);
        for joined in [colors, sizes] {
            if let Err(e) = joined {
                warn!("Reference fetch task ended abnormally: {e}");
            }
        }
    }
}

//! Form session controller - the create/edit form for one product group.
//!
//! A session is `Closed`, `Creating` a new group, or `Editing` an existing one.
//! Opening a session starts a fresh reference-data epoch and fetches colors and
//! sizes in the background; closing it bumps the epoch so late results are
//! dropped. Image uploads are tracked per target and run without borrowing the
//! session, so other fields stay editable while one is in flight. Only the
//! latest upload started for a target may apply its result.

use crate::api::{CatalogApi, ImageFile, UpdateGroupRequest, with_timeout};
use crate::cache::{ReferenceCache, ReferenceList, ReferenceLoad};
use crate::core::reconcile::{Reconciler, partition_variants, validate_new_variants};
use crate::errors::{Error, Result};
use crate::models::{
    Category, Color, ColorRef, GroupId, ProductGroup, ProductVariant, Size, SizeRef, VariantId,
    coerce_price, coerce_stock,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Identifier given to the draft of a group that does not exist yet.
pub const DRAFT_GROUP_ID: &str = "draft";

/// Which form is open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Closed,
    /// New group, category chosen up front
    Creating { category: Category },
    /// Existing group loaded from the catalog
    Editing { group_id: GroupId },
}

/// What an image upload is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UploadTarget {
    Group,
    Variant(VariantId),
}

/// Progress of the latest upload for one target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Uploaded { image_ref: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Default)]
struct UploadSlot {
    /// Sequence of the latest upload started for the target
    sequence: u64,
    state: UploadState,
}

/// Permission to run one upload, issued by [`FormSession::begin_upload`].
#[derive(Debug, Clone)]
pub struct UploadTicket {
    target: UploadTarget,
    epoch: u64,
    sequence: u64,
}

/// A settled upload, to be handed back to [`FormSession::finish_upload`].
#[derive(Debug)]
pub struct UploadCompletion {
    target: UploadTarget,
    epoch: u64,
    sequence: u64,
    outcome: Result<String>,
}

impl UploadTicket {
    #[must_use]
    pub const fn target(&self) -> &UploadTarget {
        &self.target
    }

    /// Uploads `file`. Does not touch the session.
    pub async fn upload(
        self,
        api: &dyn CatalogApi,
        file: ImageFile,
        timeout: Duration,
    ) -> UploadCompletion {
        debug!("Uploading {} for {:?}", file.file_name, self.target);
        let outcome = with_timeout("upload image", timeout, api.upload_image(file)).await;
        UploadCompletion {
            target: self.target,
            epoch: self.epoch,
            sequence: self.sequence,
            outcome,
        }
    }
}

/// State of the product-group form.
#[derive(Debug)]
pub struct FormSession {
    mode: SessionMode,
    draft: Option<ProductGroup>,
    uploads: HashMap<UploadTarget, UploadSlot>,
    upload_sequence: u64,
    cache: ReferenceCache,
    epoch: u64,
    reference_load: Option<ReferenceLoad>,
    reference_timeout: Duration,
}

impl FormSession {
    /// A closed session whose reference fetches give up after `reference_timeout`.
    #[must_use]
    pub fn new(reference_timeout: Duration) -> Self {
        Self {
            mode: SessionMode::Closed,
            draft: None,
            uploads: HashMap::new(),
            upload_sequence: 0,
            cache: ReferenceCache::new(),
            epoch: 0,
            reference_load: None,
            reference_timeout,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> &SessionMode {
        &self.mode
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.mode, SessionMode::Closed)
    }

    /// The group being edited, as it currently stands.
    #[must_use]
    pub const fn draft(&self) -> Option<&ProductGroup> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn upload_state(&self, target: &UploadTarget) -> UploadState {
        self.uploads
            .get(target)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    pub async fn colors(&self) -> ReferenceList<Color> {
        self.cache.colors().await
    }

    pub async fn sizes(&self) -> ReferenceList<Size> {
        self.cache.sizes().await
    }

    /// Warnings for reference lists that failed to load. The form stays usable.
    pub async fn reference_warnings(&self) -> Vec<String> {
        self.cache.warnings().await
    }

    /// Waits until the background reference fetches have settled.
    pub async fn wait_for_reference_data(&mut self) {
        if let Some(load) = self.reference_load.take() {
            load.finished().await;
        }
    }

    fn ensure_closed(&self) -> Result<()> {
        if self.is_open() {
            return Err(Error::InvalidSession {
                message: "a form is already open".to_string(),
            });
        }
        Ok(())
    }

    async fn start(&mut self, api: &Arc<dyn CatalogApi>, mode: SessionMode, draft: ProductGroup) {
        self.epoch = self.cache.reset().await;
        let load = self.cache.spawn_refresh(
            api,
            draft.sales_group_id,
            self.epoch,
            self.reference_timeout,
        );
        self.reference_load = Some(load);
        self.uploads.clear();
        self.draft = Some(draft);
        self.mode = mode;
    }

    /// Opens the form for a new group of `category` with one blank variant.
    ///
    /// # Errors
    /// Returns `Error::InvalidSession` if a form is already open.
    pub async fn open_create(
        &mut self,
        api: &Arc<dyn CatalogApi>,
        category: Category,
        material: &str,
    ) -> Result<()> {
        self.ensure_closed()?;
        info!("Opening form for a new {category} group");
        let draft = ProductGroup {
            id: GroupId::from(DRAFT_GROUP_ID),
            name: String::new(),
            description: String::new(),
            category: category.clone(),
            image: String::new(),
            material: material.to_string(),
            sales_group_id: None,
            variants: vec![ProductVariant::blank(&category)],
        };
        self.start(api, SessionMode::Creating { category }, draft).await;
        Ok(())
    }

    /// Opens the form for an existing group. Variants carrying a server id are
    /// seeded as persisted, any other as new, and an unset SKU becomes an
    /// empty one.
    ///
    /// # Errors
    /// Returns `Error::InvalidSession` if a form is already open.
    pub async fn open_edit(&mut self, api: &Arc<dyn CatalogApi>, group: &ProductGroup) -> Result<()> {
        self.ensure_closed()?;
        info!("Opening form for group {} ({})", group.id, group.name);
        let mut draft = group.clone();
        for variant in &mut draft.variants {
            variant.is_new = variant.id.is_local();
            variant.sku.get_or_insert_with(String::new);
        }
        let mode = SessionMode::Editing {
            group_id: group.id.clone(),
        };
        self.start(api, mode, draft).await;
        Ok(())
    }

    /// Closes the form and discards the draft. Reference fetches and uploads
    /// still in flight will not apply.
    pub async fn close(&mut self) {
        if self.is_open() {
            debug!("Closing form session");
        }
        self.epoch = self.cache.reset().await;
        self.reference_load = None;
        self.uploads.clear();
        self.draft = None;
        self.mode = SessionMode::Closed;
    }

    fn draft_mut(&mut self) -> Result<&mut ProductGroup> {
        self.draft.as_mut().ok_or_else(|| Error::InvalidSession {
            message: "no form is open".to_string(),
        })
    }

    fn variant_mut(&mut self, id: &VariantId) -> Result<&mut ProductVariant> {
        self.draft_mut()?
            .variants
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| Error::VariantNotFound { id: id.to_string() })
    }

    /// # Errors
    /// Returns `Error::InvalidSession` if no form is open.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.draft_mut()?.name = name.to_string();
        Ok(())
    }

    /// # Errors
    /// Returns `Error::InvalidSession` if no form is open.
    pub fn set_description(&mut self, description: &str) -> Result<()> {
        self.draft_mut()?.description = description.to_string();
        Ok(())
    }

    /// Appends a blank variant for the group's category and returns its id.
    ///
    /// # Errors
    /// Returns `Error::InvalidSession` if no form is open.
    pub fn add_variant(&mut self) -> Result<VariantId> {
        let draft = self.draft_mut()?;
        let variant = ProductVariant::blank(&draft.category);
        let id = variant.id.clone();
        draft.variants.push(variant);
        Ok(id)
    }

    /// Removes a variant from the draft. The last one cannot be removed.
    ///
    /// # Errors
    /// Returns `Error::LastVariant`, `Error::VariantNotFound` or
    /// `Error::InvalidSession`.
    pub fn remove_variant(&mut self, id: &VariantId) -> Result<()> {
        let draft = self.draft_mut()?;
        let index = draft
            .variants
            .iter()
            .position(|v| &v.id == id)
            .ok_or_else(|| Error::VariantNotFound { id: id.to_string() })?;
        if draft.variants.len() == 1 {
            return Err(Error::LastVariant);
        }
        draft.variants.remove(index);
        self.uploads.remove(&UploadTarget::Variant(id.clone()));
        Ok(())
    }

    /// Sets the price from raw form input; anything unparseable becomes 0.
    ///
    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub fn set_price(&mut self, id: &VariantId, raw: &str) -> Result<()> {
        self.variant_mut(id)?.price = coerce_price(raw);
        Ok(())
    }

    /// Sets the stock from raw form input; anything unparseable becomes 0.
    ///
    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub fn set_stock(&mut self, id: &VariantId, raw: &str) -> Result<()> {
        self.variant_mut(id)?.stock = coerce_stock(raw);
        Ok(())
    }

    /// An empty SKU clears it on the next save.
    ///
    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub fn set_sku(&mut self, id: &VariantId, sku: &str) -> Result<()> {
        self.variant_mut(id)?.sku = Some(sku.trim().to_string());
        Ok(())
    }

    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub fn set_length(&mut self, id: &VariantId, length: &str) -> Result<()> {
        self.variant_mut(id)?.length = Some(length.to_string());
        Ok(())
    }

    /// Selects a color by id, taking its name from the loaded color list.
    /// `None` clears the selection.
    ///
    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub async fn select_color(&mut self, id: &VariantId, color_id: Option<i64>) -> Result<()> {
        let color = match color_id {
            Some(color_id) => Some(match self.cache.find_color(color_id).await {
                Some(color) => ColorRef::from(&color),
                None => {
                    warn!("Color {color_id} is not in the loaded list");
                    ColorRef {
                        id: color_id,
                        name: String::new(),
                    }
                }
            }),
            None => None,
        };
        self.variant_mut(id)?.color = color;
        Ok(())
    }

    /// Selects a size by id, taking its label from the loaded size list.
    /// `None` clears the selection.
    ///
    /// # Errors
    /// Returns `Error::VariantNotFound` or `Error::InvalidSession`.
    pub async fn select_size(&mut self, id: &VariantId, size_id: Option<i64>) -> Result<()> {
        let size = match size_id {
            Some(size_id) => Some(match self.cache.find_size(size_id).await {
                Some(size) => SizeRef::from(&size),
                None => {
                    warn!("Size {size_id} is not in the loaded list");
                    SizeRef {
                        id: size_id,
                        label: String::new(),
                    }
                }
            }),
            None => None,
        };
        self.variant_mut(id)?.size = size;
        Ok(())
    }

    /// Marks `target` as uploading and hands out the ticket to run the upload.
    ///
    /// # Errors
    /// Returns `Error::InvalidSession` if no form is open, or
    /// `Error::VariantNotFound` for an unknown variant.
    pub fn begin_upload(&mut self, target: UploadTarget) -> Result<UploadTicket> {
        match &target {
            UploadTarget::Group => {
                self.draft_mut()?;
            }
            UploadTarget::Variant(id) => {
                self.variant_mut(id)?;
            }
        }
        self.upload_sequence += 1;
        let sequence = self.upload_sequence;
        self.uploads.insert(
            target.clone(),
            UploadSlot {
                sequence,
                state: UploadState::Uploading,
            },
        );
        Ok(UploadTicket {
            target,
            epoch: self.epoch,
            sequence,
        })
    }

    /// Applies a settled upload. Completions from an earlier session, for a
    /// variant that was removed meanwhile, or superseded by a later upload to
    /// the same target are ignored.
    pub fn finish_upload(&mut self, completion: UploadCompletion) {
        if completion.epoch != self.epoch || !self.is_open() {
            debug!("Ignoring upload for a closed session");
            return;
        }
        let UploadCompletion {
            target,
            sequence,
            outcome,
            ..
        } = completion;
        let latest = self.uploads.get(&target).map(|slot| slot.sequence);
        if latest != Some(sequence) {
            debug!("Ignoring superseded upload for {target:?}");
            return;
        }
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        if let UploadTarget::Variant(id) = &target {
            if draft.variant(id).is_none() {
                debug!("Ignoring upload for removed variant {id}");
                return;
            }
        }
        let state = match outcome {
            Ok(image_ref) => {
                info!("Image uploaded for {target:?}: {image_ref}");
                match &target {
                    UploadTarget::Group => draft.image.clone_from(&image_ref),
                    UploadTarget::Variant(id) => {
                        if let Some(variant) = draft.variants.iter_mut().find(|v| &v.id == id) {
                            variant.image_ref = Some(image_ref.clone());
                        }
                    }
                }
                UploadState::Uploaded { image_ref }
            }
            Err(e) => {
                error!("Error uploading image for {target:?}: {e}");
                UploadState::Failed {
                    message: e.to_string(),
                }
            }
        };
        self.uploads.insert(target, UploadSlot { sequence, state });
    }

    /// Begins, runs and applies one upload in sequence.
    ///
    /// # Errors
    /// Returns the error of [`FormSession::begin_upload`]. Upload failures are
    /// recorded in the upload state instead.
    pub async fn upload_image(
        &mut self,
        api: &dyn CatalogApi,
        target: UploadTarget,
        file: ImageFile,
        timeout: Duration,
    ) -> Result<UploadState> {
        let ticket = self.begin_upload(target.clone())?;
        let completion = ticket.upload(api, file, timeout).await;
        self.finish_upload(completion);
        Ok(self.upload_state(&target))
    }

    /// Saves the form.
    ///
    /// For an edit: validates new variants, updates the group, then creates
    /// and updates variants concurrently. On full success the session closes
    /// and the saved group is returned. If some variant requests failed, the
    /// successful ones are merged into the draft, the session stays open for a
    /// retry, and `Error::PartialBatch` is returned.
    ///
    /// # Errors
    /// - `Error::InvalidSession` if no form is open or the group has no server id
    /// - `Error::GroupCreationUnsupported` for a `Creating` session
    /// - `Error::Validation` if a new variant lacks a required reference; nothing is sent
    /// - `Error::GroupUpdate` if the group update failed; no variant is sent
    /// - `Error::PartialBatch` if some variant requests failed
    pub async fn submit(&mut self, api: &dyn CatalogApi, timeout: Duration) -> Result<ProductGroup> {
        let group_id = match &self.mode {
            SessionMode::Closed => {
                return Err(Error::InvalidSession {
                    message: "no form is open".to_string(),
                });
            }
            SessionMode::Creating { .. } => return Err(Error::GroupCreationUnsupported),
            SessionMode::Editing { group_id } => group_id.clone(),
        };
        let mut draft = self.draft_mut()?.clone();
        let remote_id = group_id.as_remote().ok_or_else(|| Error::InvalidSession {
            message: format!("group {group_id} has no server id"),
        })?;

        let partition = partition_variants(&draft.variants);
        validate_new_variants(&draft.category, &partition.new_variants).map_err(|failures| {
            warn!("Group {group_id} not saved: {} invalid variant(s)", failures.len());
            Error::Validation(failures)
        })?;

        let request = UpdateGroupRequest {
            name: draft.name.clone(),
            image_ref: Some(draft.image.clone()).filter(|image| !image.is_empty()),
        };
        let record = with_timeout("update group", timeout, api.update_group(remote_id, &request))
            .await
            .map_err(|e| {
                error!("Error updating group {group_id}: {e}");
                Error::GroupUpdate {
                    group_id: group_id.to_string(),
                    reason: e.to_string(),
                }
            })?;
        draft.image = record.url_foto.unwrap_or_default();

        let outcome = Reconciler::new(api, timeout)
            .reconcile(remote_id, &draft.category, &draft.variants)
            .await?;
        draft.variants = outcome.variants.clone();

        if let Some(failure) = outcome.failure() {
            self.draft = Some(draft);
            return Err(Error::PartialBatch(failure));
        }

        info!("Group {group_id} saved");
        self.close().await;
        Ok(draft)
    }
}

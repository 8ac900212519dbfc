//! Variant reconciliation - pushes a locally edited variant list to the backend.
//!
//! New variants are created, persisted ones are updated. Validation runs first
//! and is all-or-nothing: one invalid new variant and nothing is sent. After
//! that every request is independent. They all run concurrently, each one
//! settles on its own, and the merge keeps whatever succeeded.

use crate::api::{CatalogApi, CreateVariantRequest, UpdateVariantRequest, with_timeout};
use crate::errors::{
    BatchFailure, Error, MissingReference, Result, ValidationFailure, ValidationFailures,
    VariantFailure, VariantOperation,
};
use crate::models::{Category, ProductVariant, VariantId, sanitize_price};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A variant list split by `is_new`.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    /// Variants to create
    pub new_variants: Vec<&'a ProductVariant>,
    /// Variants to update
    pub existing_variants: Vec<&'a ProductVariant>,
}

/// Splits variants into new and existing, preserving order within each side.
#[must_use]
pub fn partition_variants(variants: &[ProductVariant]) -> Partition<'_> {
    let (new_variants, existing_variants) = variants.iter().partition(|v| v.is_new);
    Partition {
        new_variants,
        existing_variants,
    }
}

/// Checks that a new variant has every reference its category needs. Reports
/// the first missing one: color before size.
#[must_use]
pub fn check_new_variant(category: &Category, variant: &ProductVariant) -> Option<ValidationFailure> {
    let missing = if variant.color.is_none() {
        MissingReference::Color
    } else if category.requires_size() && variant.size.is_none() {
        MissingReference::Size
    } else {
        return None;
    };
    Some(ValidationFailure {
        variant_id: variant.id.to_string(),
        label: variant.display_label(),
        missing,
    })
}

/// Validates every new variant, collecting all failures.
///
/// # Errors
/// Returns every offending variant, in input order.
pub fn validate_new_variants(
    category: &Category,
    new_variants: &[&ProductVariant],
) -> std::result::Result<(), ValidationFailures> {
    let failures: Vec<ValidationFailure> = new_variants
        .iter()
        .filter_map(|v| check_new_variant(category, v))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailures(failures))
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Builds the creation payload for a new variant, or `None` if it is missing
/// a reference its category requires (see [`check_new_variant`]).
///
/// Optional SKU and image are only sent when non-empty. Categories that require
/// a size always send `idTalla`, as `null` when missing; others send it only
/// when a size is set.
#[must_use]
pub fn build_create_request(
    group_id: i64,
    category: &Category,
    variant: &ProductVariant,
) -> Option<CreateVariantRequest> {
    if check_new_variant(category, variant).is_some() {
        return None;
    }
    let color = variant.color.as_ref()?;
    let size_id = variant.size.as_ref().map(|s| s.id);
    Some(CreateVariantRequest {
        group_id,
        color_id: color.id,
        size_id: if category.requires_size() {
            Some(size_id)
        } else {
            size_id.map(Some)
        },
        price: sanitize_price(variant.price),
        stock: variant.stock,
        sku: non_empty(variant.sku.as_ref()),
        image_ref: non_empty(variant.image_ref.as_ref()),
    })
}

/// Builds the update payload for a persisted variant.
///
/// Price and stock are always sent, color only when set. Categories that
/// require a size always send `idTalla`. SKU and image are sent only when the
/// field is set at all; an empty value is sent as `null` to clear it.
#[must_use]
pub fn build_update_request(category: &Category, variant: &ProductVariant) -> UpdateVariantRequest {
    let clearable = |value: Option<&String>| value.map(|s| (!s.is_empty()).then(|| s.clone()));
    UpdateVariantRequest {
        color_id: variant.color.as_ref().map(|c| c.id),
        size_id: category
            .requires_size()
            .then(|| variant.size.as_ref().map(|s| s.id)),
        price: sanitize_price(variant.price),
        stock: variant.stock,
        sku: clearable(variant.sku.as_ref()),
        image_ref: clearable(variant.image_ref.as_ref()),
    }
}

/// Result of a dispatched reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The input list with successful creations merged in, in input order
    pub variants: Vec<ProductVariant>,
    /// Successful creations
    pub created: usize,
    /// Successful updates
    pub updated: usize,
    /// Requests that failed
    pub failures: Vec<VariantFailure>,
}

impl Reconciliation {
    /// Requests that were dispatched.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.created + self.updated + self.failures.len()
    }

    /// True when every request succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The aggregate failure, if any request failed.
    #[must_use]
    pub fn failure(&self) -> Option<BatchFailure> {
        (!self.is_complete()).then(|| BatchFailure {
            attempted: self.attempted(),
            failures: self.failures.clone(),
        })
    }
}

/// Dispatches variant creates and updates against a [`CatalogApi`].
pub struct Reconciler<'a> {
    api: &'a dyn CatalogApi,
    timeout: Duration,
}

impl<'a> Reconciler<'a> {
    /// Every request is bounded by `timeout`.
    #[must_use]
    pub const fn new(api: &'a dyn CatalogApi, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    async fn bounded<T>(&self, operation: &str, request: impl Future<Output = Result<T>>) -> Result<T> {
        with_timeout(operation, self.timeout, request).await
    }

    /// Reconciles `variants` of group `group_id` against the backend.
    ///
    /// # Errors
    /// Returns `Error::Validation` listing every new variant that is missing a
    /// required reference; nothing is dispatched in that case. Request
    /// failures are not errors here: they are collected in the returned
    /// [`Reconciliation`] alongside the merged list.
    pub async fn reconcile(
        &self,
        group_id: i64,
        category: &Category,
        variants: &[ProductVariant],
    ) -> Result<Reconciliation> {
        let partition = partition_variants(variants);

        if let Err(failures) = validate_new_variants(category, &partition.new_variants) {
            warn!(
                "Group {group_id}: {} new variant(s) failed validation, nothing dispatched",
                failures.len()
            );
            return Err(Error::Validation(failures));
        }

        // Creates are keyed by position so that duplicate local ids still
        // merge one-to-one with their server records.
        let creates: Vec<(usize, CreateVariantRequest)> = variants
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_new)
            .filter_map(|(index, v)| {
                build_create_request(group_id, category, v).map(|request| (index, request))
            })
            .collect();
        let updates: Vec<(VariantId, UpdateVariantRequest)> = partition
            .existing_variants
            .iter()
            .map(|v| (v.id.clone(), build_update_request(category, v)))
            .collect();

        info!(
            "Group {group_id}: dispatching {} create(s) and {} update(s)",
            creates.len(),
            updates.len()
        );

        let create_tasks = creates.iter().map(|(index, request)| async move {
            debug!("Creating variant {}: {request:?}", variants[*index].id);
            let outcome = self
                .bounded("create variant", self.api.create_variant(request))
                .await;
            (*index, outcome)
        });
        let update_tasks = updates.iter().map(|(id, request)| async move {
            debug!("Updating variant {id}: {request:?}");
            let outcome = self
                .bounded("update variant", self.api.update_variant(id, request))
                .await;
            (id, outcome)
        });
        let (create_results, update_results) =
            futures::join!(join_all(create_tasks), join_all(update_tasks));

        let mut failures = Vec::new();
        let mut assigned: Vec<Option<i64>> = vec![None; variants.len()];
        let mut created = 0;
        for (index, outcome) in create_results {
            let id = &variants[index].id;
            match outcome {
                Ok(record) => {
                    assigned[index] = Some(record.id);
                    created += 1;
                }
                Err(e) => {
                    error!("Error creating variant {id}: {e}");
                    failures.push(VariantFailure {
                        variant_id: id.to_string(),
                        operation: VariantOperation::Create,
                        reason: e.to_string(),
                    });
                }
            }
        }
        let mut updated = 0;
        for (id, outcome) in update_results {
            match outcome {
                Ok(_) => updated += 1,
                Err(e) => {
                    error!("Error updating variant {id}: {e}");
                    failures.push(VariantFailure {
                        variant_id: id.to_string(),
                        operation: VariantOperation::Update,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let merged = merge_created(variants, &assigned);

        if failures.is_empty() {
            info!("Group {group_id}: {created} created, {updated} updated");
        } else {
            warn!(
                "Group {group_id}: {created} created, {updated} updated, {} failed",
                failures.len()
            );
        }

        Ok(Reconciliation {
            variants: merged,
            created,
            updated,
            failures,
        })
    }
}

/// Applies confirmed creations: the variant at each assigned position adopts
/// the server id and stops being new. Everything else is returned as is.
fn merge_created(variants: &[ProductVariant], assigned: &[Option<i64>]) -> Vec<ProductVariant> {
    variants
        .iter()
        .zip(assigned)
        .map(|(variant, server_id)| {
            let mut merged = variant.clone();
            if let Some(server_id) = server_id {
                merged.confirm_created(*server_id);
            }
            merged
        })
        .collect()
}

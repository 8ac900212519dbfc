//! Catalog view state - the in-memory list of product groups for the session.
//!
//! Aggregates and category sections are computed on every read from the
//! currently filtered set; nothing is cached.

use crate::errors::{Error, Result};
use crate::models::{Category, GroupId, ProductGroup, ProductVariant, StockLevel};
use tracing::{debug, trace};

/// Totals over the groups that pass the current filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub group_count: usize,
    pub variant_count: usize,
    pub total_stock: u64,
}

/// Groups sharing one category tag, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection<'a> {
    pub category: &'a Category,
    pub groups: Vec<&'a ProductGroup>,
}

/// Product groups plus the active search filter.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    groups: Vec<ProductGroup>,
    search: String,
    low_stock_threshold: u64,
}

impl CatalogView {
    #[must_use]
    pub fn new(low_stock_threshold: u64) -> Self {
        Self {
            groups: Vec::new(),
            search: String::new(),
            low_stock_threshold,
        }
    }

    #[must_use]
    pub fn with_groups(low_stock_threshold: u64, groups: Vec<ProductGroup>) -> Self {
        Self {
            groups,
            ..Self::new(low_stock_threshold)
        }
    }

    /// Replaces the whole list, e.g. after a fresh fetch. The filter is kept.
    pub fn replace_all(&mut self, groups: Vec<ProductGroup>) {
        debug!("Catalog replaced with {} groups", groups.len());
        self.groups = groups;
    }

    /// Appends a group.
    ///
    /// # Errors
    /// Returns `Error::DuplicateGroup` if a group with the same id is present.
    pub fn add_group(&mut self, group: ProductGroup) -> Result<()> {
        if self.get(&group.id).is_some() {
            return Err(Error::DuplicateGroup {
                id: group.id.to_string(),
            });
        }
        trace!("Adding group {} to catalog", group.id);
        self.groups.push(group);
        Ok(())
    }

    /// Replaces the group with the same id, keeping its position.
    ///
    /// # Errors
    /// Returns `Error::GroupNotFound` if no group has that id.
    pub fn replace_group(&mut self, group: ProductGroup) -> Result<()> {
        let slot = self
            .groups
            .iter_mut()
            .find(|g| g.id == group.id)
            .ok_or_else(|| Error::GroupNotFound {
                id: group.id.to_string(),
            })?;
        trace!("Replacing group {} in catalog", group.id);
        *slot = group;
        Ok(())
    }

    /// Replaces the group with the same id, or appends it if there is none.
    pub fn upsert(&mut self, group: ProductGroup) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => *slot = group,
            None => self.groups.push(group),
        }
    }

    /// Removes a group from the view. Nothing is deleted remotely.
    ///
    /// # Errors
    /// Returns `Error::GroupNotFound` if no group has that id.
    pub fn remove_group(&mut self, id: &GroupId) -> Result<ProductGroup> {
        let index = self
            .groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| Error::GroupNotFound { id: id.to_string() })?;
        Ok(self.groups.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &GroupId) -> Option<&ProductGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Every group, ignoring the filter.
    #[must_use]
    pub fn groups(&self) -> &[ProductGroup] {
        &self.groups
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn low_stock_threshold(&self) -> u64 {
        self.low_stock_threshold
    }

    /// Groups whose name or description contains the search text, ignoring case.
    #[must_use]
    pub fn filtered(&self) -> Vec<&ProductGroup> {
        let needle = self.search.trim();
        self.groups.iter().filter(|g| g.matches(needle)).collect()
    }

    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        self.filtered()
            .into_iter()
            .fold(CatalogStats::default(), |mut stats, group| {
                stats.group_count += 1;
                stats.variant_count += group.variants.len();
                stats.total_stock += group.total_stock();
                stats
            })
    }

    /// Filtered groups partitioned by category. Sections appear in the order
    /// their category is first seen; groups keep catalog order within each.
    #[must_use]
    pub fn sections(&self) -> Vec<CategorySection<'_>> {
        let mut sections: Vec<CategorySection<'_>> = Vec::new();
        for group in self.filtered() {
            match sections.iter_mut().find(|s| s.category == &group.category) {
                Some(section) => section.groups.push(group),
                None => sections.push(CategorySection {
                    category: &group.category,
                    groups: vec![group],
                }),
            }
        }
        sections
    }

    /// Filtered groups whose total stock is under the threshold.
    #[must_use]
    pub fn low_stock_groups(&self) -> Vec<&ProductGroup> {
        self.filtered()
            .into_iter()
            .filter(|g| g.is_low_stock(self.low_stock_threshold))
            .collect()
    }

    /// Variants of filtered groups whose own stock is low or critical.
    #[must_use]
    pub fn variants_needing_restock(&self) -> Vec<(&ProductGroup, &ProductVariant, StockLevel)> {
        self.filtered()
            .into_iter()
            .flat_map(|group| {
                group
                    .variants
                    .iter()
                    .map(move |variant| (group, variant, variant.stock_level()))
            })
            .filter(|(_, _, level)| *level != StockLevel::Healthy)
            .collect()
    }
}

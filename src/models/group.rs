//! Product groups: a named product with its ordered list of variants.

use crate::models::{Category, ProductVariant, VariantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group identifier. Groups loaded from the backend have numeric ids; groups
/// added locally may not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    #[must_use]
    pub fn remote(id: i64) -> Self {
        Self(id.to_string())
    }

    /// The server id, if this is one.
    #[must_use]
    pub fn as_remote(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry such as "Anillo Corazón" with its variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub category: Category,
    /// Image reference; empty when the group has none
    pub image: String,
    pub material: String,
    pub sales_group_id: Option<i64>,
    pub variants: Vec<ProductVariant>,
}

impl ProductGroup {
    /// Sum of stock over every variant.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }

    /// True when total stock is under `threshold`.
    #[must_use]
    pub fn is_low_stock(&self, threshold: u64) -> bool {
        self.total_stock() < threshold
    }

    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Case-insensitive substring match on name or description. An empty
    /// needle matches everything.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

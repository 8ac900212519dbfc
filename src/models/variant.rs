//! Product variants: one color/size/price/stock combination of a group.

use crate::models::{Category, ColorRef, SizeRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const LOCAL_PREFIX: &str = "local-";

static LOCAL_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Variant identifier. Server ids are numeric; locally generated ones carry a
/// `local-` prefix and can never be mistaken for a server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Generates a fresh temporary identifier for an unsaved variant.
    #[must_use]
    pub fn local() -> Self {
        let seq = LOCAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("{LOCAL_PREFIX}{millis}-{seq}"))
    }

    /// Wraps a server-assigned identifier.
    #[must_use]
    pub fn remote(id: i64) -> Self {
        Self(id.to_string())
    }

    /// The server id, if this is one.
    #[must_use]
    pub fn as_remote(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// True for identifiers generated by [`VariantId::local`].
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.as_remote().is_none()
    }

    /// Raw string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How healthy a single variant's stock is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    /// Fewer than 3 units
    Critical,
    /// Fewer than 5 units
    Low,
    /// 5 or more
    Healthy,
}

/// A color/size/price/stock combination within a product group.
///
/// `sku` and `image_ref` distinguish "not set" (`None`) from "cleared"
/// (`Some` of an empty string): an update only sends fields that are set, and
/// sends an explicit null for cleared ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub color: Option<ColorRef>,
    pub size: Option<SizeRef>,
    pub length: Option<String>,
    pub weight: Option<f64>,
    pub stock: u32,
    pub price: f64,
    pub image_ref: Option<String>,
    pub sku: Option<String>,
    /// Created locally and not yet persisted
    pub is_new: bool,
}

impl ProductVariant {
    /// A blank unsaved variant with the attributes the category exposes.
    #[must_use]
    pub fn blank(category: &Category) -> Self {
        let length = category
            .profile()
            .length
            .is_visible()
            .then(String::new);
        Self {
            id: VariantId::local(),
            color: None,
            size: None,
            length,
            weight: None,
            stock: 0,
            price: 0.0,
            image_ref: None,
            sku: Some(String::new()),
            is_new: true,
        }
    }

    /// Identity shown to the operator: the color name, or the id when no
    /// color has been chosen yet.
    #[must_use]
    pub fn display_label(&self) -> String {
        match &self.color {
            Some(color) if !color.name.is_empty() => color.name.clone(),
            _ => self.id.to_string(),
        }
    }

    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        match self.stock {
            0..=2 => StockLevel::Critical,
            3..=4 => StockLevel::Low,
            _ => StockLevel::Healthy,
        }
    }

    /// Marks a successful creation: adopt the server id and clear `is_new`.
    pub fn confirm_created(&mut self, server_id: i64) {
        self.id = VariantId::remote(server_id);
        self.is_new = false;
    }
}

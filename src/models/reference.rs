//! Read-only reference data owned by the backend: colors and sizes.

use serde::{Deserialize, Serialize};

/// A selectable color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Server identifier
    pub id: i64,
    /// Display name (e.g. "Dorado")
    pub name: String,
    /// Hex code, when the backend provides one
    pub hex: Option<String>,
}

/// A selectable size, scoped to a sales group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    /// Server identifier
    pub id: i64,
    /// Display label (e.g. "7")
    pub label: String,
}

/// A variant's reference to a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRef {
    pub id: i64,
    pub name: String,
}

/// A variant's reference to a size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRef {
    pub id: i64,
    pub label: String,
}

impl From<&Color> for ColorRef {
    fn from(color: &Color) -> Self {
        Self {
            id: color.id,
            name: color.name.clone(),
        }
    }
}

impl From<&Size> for SizeRef {
    fn from(size: &Size) -> Self {
        Self {
            id: size.id,
            label: size.label.clone(),
        }
    }
}

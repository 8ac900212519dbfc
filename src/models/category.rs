//! Category tags and the variant attributes each one uses.
//!
//! The backend groups products by "sales group" name. Two of those names change
//! how variants are edited and submitted: rings (`Anillos`) must carry a size,
//! and necklaces (`Collares`) expose a free-text length. Every other tag is kept
//! verbatim and uses neither attribute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag used by the backend for rings.
pub const RINGS_TAG: &str = "Anillos";
/// Tag used by the backend for necklaces.
pub const NECKLACES_TAG: &str = "Collares";

/// How a category treats an optional variant attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRule {
    /// Must be present before a variant can be created
    Required,
    /// Shown and sent when present
    Optional,
    /// Not shown for this category
    Hidden,
}

impl AttributeRule {
    /// True unless the attribute is hidden.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// Attribute rules for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeProfile {
    /// Size reference (`idTalla`)
    pub size: AttributeRule,
    /// Free-text length, local only
    pub length: AttributeRule,
}

/// Product category, keyed by the backend's sales-group name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// `Anillos`
    Rings,
    /// `Collares`
    Necklaces,
    /// Any other tag, kept as received
    Other(String),
}

impl Category {
    /// Maps a tag to a category. Matching is exact, as the backend sends it.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            RINGS_TAG => Self::Rings,
            NECKLACES_TAG => Self::Necklaces,
            other => Self::Other(other.to_string()),
        }
    }

    /// The tag as the backend spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rings => RINGS_TAG,
            Self::Necklaces => NECKLACES_TAG,
            Self::Other(tag) => tag,
        }
    }

    /// Which optional attributes this category uses.
    #[must_use]
    pub const fn profile(&self) -> AttributeProfile {
        match self {
            Self::Rings => AttributeProfile {
                size: AttributeRule::Required,
                length: AttributeRule::Hidden,
            },
            Self::Necklaces => AttributeProfile {
                size: AttributeRule::Hidden,
                length: AttributeRule::Optional,
            },
            Self::Other(_) => AttributeProfile {
                size: AttributeRule::Hidden,
                length: AttributeRule::Hidden,
            },
        }
    }

    /// Shorthand for `profile().size == Required`.
    #[must_use]
    pub const fn requires_size(&self) -> bool {
        matches!(self.profile().size, AttributeRule::Required)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_tag(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

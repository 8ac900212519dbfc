//! Domain model - product groups, variants, categories and reference data.
//! These types are independent of the wire format; see `api::wire` for the
//! backend's JSON shapes.

pub mod category;
pub mod group;
pub mod input;
pub mod reference;
pub mod variant;

pub use category::{AttributeProfile, AttributeRule, Category};
pub use group::{GroupId, ProductGroup};
pub use input::{coerce_price, coerce_stock, sanitize_price};
pub use reference::{Color, ColorRef, Size, SizeRef};
pub use variant::{ProductVariant, StockLevel, VariantId};

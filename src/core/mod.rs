/// Catalog view state: groups, search, aggregates and category sections
pub mod catalog;
/// Top-level workflow over the catalog, the form session and the API
pub mod inventory;
/// Variant create/update reconciliation against the remote catalog
pub mod reconcile;
/// Create/edit form state machine, reference data and image uploads
pub mod session;

pub use catalog::{CatalogStats, CatalogView, CategorySection};
pub use inventory::Inventory;
pub use reconcile::{Reconciler, Reconciliation};
pub use session::{FormSession, SessionMode, UploadState, UploadTarget};

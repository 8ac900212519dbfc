//! Remote catalog client.
//!
//! [`CatalogApi`] is the seam between the local workflow and the backend. The
//! HTTP implementation lives in [`http`]; tests use an in-memory fake.

pub mod http;
pub mod wire;

pub use http::HttpCatalogClient;
pub use wire::{
    CreateVariantRequest, GroupRecord, UpdateGroupRequest, UpdateVariantRequest, VariantRecord,
};

use crate::errors::{Error, Result};
use crate::models::{Color, Size, VariantId};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Runs one remote call, turning an elapsed `limit` into `Error::Timeout`.
///
/// # Errors
/// Returns the call's own error, or `Error::Timeout`.
pub async fn with_timeout<T>(
    operation: &str,
    limit: Duration,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, request)
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout {
                operation: operation.to_string(),
                seconds: limit.as_secs(),
            })
        })
}

/// An image picked by the operator, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Operations the backend offers. Every call is a single request/response and
/// every failure comes back as a typed [`crate::errors::Error`].
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /grupos-producto`
    async fn list_groups(&self) -> Result<Vec<GroupRecord>>;

    /// `GET /grupos-producto/{id}`
    async fn get_group(&self, group_id: i64) -> Result<GroupRecord>;

    /// `PATCH /grupos-producto/{id}`
    async fn update_group(&self, group_id: i64, request: &UpdateGroupRequest)
    -> Result<GroupRecord>;

    /// `GET /colores`
    async fn list_colors(&self) -> Result<Vec<Color>>;

    /// `GET /tallas?id_grupo_venta=`
    async fn list_sizes(&self, sales_group_id: i64) -> Result<Vec<Size>>;

    /// `POST /productos`
    async fn create_variant(&self, request: &CreateVariantRequest) -> Result<VariantRecord>;

    /// `PATCH /productos/{id}`
    async fn update_variant(
        &self,
        variant_id: &VariantId,
        request: &UpdateVariantRequest,
    ) -> Result<VariantRecord>;

    /// `POST /files/upload`; returns the stored image reference.
    async fn upload_image(&self, file: ImageFile) -> Result<String>;
}

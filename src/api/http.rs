//! HTTP implementation of [`CatalogApi`] on top of `reqwest`.

use crate::api::wire::{ColorRecord, SizeRecord, UploadRecord};
use crate::api::{
    CatalogApi, CreateVariantRequest, GroupRecord, ImageFile, UpdateGroupRequest,
    UpdateVariantRequest, VariantRecord,
};
use crate::config::ApiSettings;
use crate::errors::{Error, Result};
use crate::models::{Color, Size, VariantId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// Talks JSON to `{base_url}/api/v1/...`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpCatalogClient {
    /// Builds a client with the configured per-request timeout.
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.request_timeout_secs,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.base_url)
    }

    fn transport_error(&self, operation: &str, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                operation: operation.to_string(),
                seconds: self.timeout_secs,
            }
        } else {
            Error::Network {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        debug!("{operation}");
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(operation, &e))?;
        trace!("{operation} -> {} bytes", bytes.len());
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }

    /// Reference lists: anything other than a JSON array reads as empty.
    async fn send_list<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>> {
        let value: Value = self.send(operation, request).await?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| Error::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        let request = self.client.get(self.endpoint("grupos-producto"));
        self.send("list groups", request).await
    }

    async fn get_group(&self, group_id: i64) -> Result<GroupRecord> {
        let request = self
            .client
            .get(self.endpoint(&format!("grupos-producto/{group_id}")));
        self.send("get group", request).await
    }

    async fn update_group(
        &self,
        group_id: i64,
        request: &UpdateGroupRequest,
    ) -> Result<GroupRecord> {
        let request = self
            .client
            .patch(self.endpoint(&format!("grupos-producto/{group_id}")))
            .json(request);
        self.send("update group", request).await
    }

    async fn list_colors(&self) -> Result<Vec<Color>> {
        let request = self.client.get(self.endpoint("colores"));
        let records: Vec<ColorRecord> = self.send_list("list colors", request).await?;
        Ok(records.into_iter().map(Color::from).collect())
    }

    async fn list_sizes(&self, sales_group_id: i64) -> Result<Vec<Size>> {
        let request = self
            .client
            .get(self.endpoint("tallas"))
            .query(&[("id_grupo_venta", sales_group_id)]);
        let records: Vec<SizeRecord> = self.send_list("list sizes", request).await?;
        Ok(records.into_iter().map(Size::from).collect())
    }

    async fn create_variant(&self, request: &CreateVariantRequest) -> Result<VariantRecord> {
        let request = self.client.post(self.endpoint("productos")).json(request);
        self.send("create variant", request).await
    }

    async fn update_variant(
        &self,
        variant_id: &VariantId,
        request: &UpdateVariantRequest,
    ) -> Result<VariantRecord> {
        let request = self
            .client
            .patch(self.endpoint(&format!("productos/{variant_id}")))
            .json(request);
        self.send("update variant", request).await
    }

    async fn upload_image(&self, file: ImageFile) -> Result<String> {
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| Error::Network {
                operation: "upload image".to_string(),
                message: e.to_string(),
            })?;
        let form = multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.endpoint("files/upload"))
            .multipart(form);
        let record: UploadRecord = self.send("upload image", request).await?;
        Ok(record.file_path)
    }
}

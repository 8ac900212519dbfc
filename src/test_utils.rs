//! Shared test utilities.
//!
//! This module provides an in-memory stand-in for the catalog backend that
//! records every request it receives, plus builders for test groups and
//! variants with sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::api::wire::{ColorRecord, SalesGroupRecord, SizeRecord};
use crate::api::{
    CatalogApi, CreateVariantRequest, GroupRecord, ImageFile, UpdateGroupRequest,
    UpdateVariantRequest, VariantRecord,
};
use crate::errors::{Error, Result};
use crate::models::{
    Category, Color, ColorRef, GroupId, ProductGroup, ProductVariant, Size, VariantId,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Everything the fake backend knows and everything it was asked to do.
#[derive(Debug, Default)]
pub struct FakeState {
    pub groups: Vec<GroupRecord>,
    pub colors: Vec<Color>,
    /// Sizes per sales group
    pub sizes: HashMap<i64, Vec<Size>>,
    /// Id handed to the next created variant
    pub next_variant_id: i64,

    pub create_requests: Vec<CreateVariantRequest>,
    pub update_requests: Vec<(VariantId, UpdateVariantRequest)>,
    pub group_updates: Vec<(i64, UpdateGroupRequest)>,
    pub uploads: Vec<String>,
    pub size_requests: usize,

    pub fail_colors: bool,
    pub fail_sizes: bool,
    pub fail_group_update: bool,
    /// Creations with one of these color ids are rejected
    pub fail_create_for_colors: HashSet<i64>,
    /// Creations with one of these color ids never resolve
    pub hang_create_for_colors: HashSet<i64>,
    pub fail_update_for: HashSet<VariantId>,
    /// Uploads of these file names are rejected
    pub fail_uploads: HashSet<String>,
}

impl FakeState {
    /// Variant requests of either kind that reached the backend.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.create_requests.len() + self.update_requests.len()
    }
}

/// In-memory [`CatalogApi`].
#[derive(Debug)]
pub struct FakeCatalogApi {
    state: Mutex<FakeState>,
    colors_gate: Option<Arc<Notify>>,
    upload_gate: Option<Arc<Notify>>,
}

impl Default for FakeCatalogApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCatalogApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_variant_id: 500,
                ..FakeState::default()
            }),
            colors_gate: None,
            upload_gate: None,
        }
    }

    /// Builder form of [`FakeCatalogApi::with_state`].
    #[must_use]
    pub fn seeded(self, f: impl FnOnce(&mut FakeState)) -> Self {
        self.with_state(f);
        self
    }

    /// `list_colors` waits for a notification before answering.
    #[must_use]
    pub fn with_colors_gate(mut self, gate: Arc<Notify>) -> Self {
        self.colors_gate = Some(gate);
        self
    }

    /// `upload_image` waits for a notification before answering.
    #[must_use]
    pub fn with_upload_gate(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

fn rejected(operation: &str, status: u16, body: &str) -> Error {
    Error::Api {
        operation: operation.to_string(),
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        Ok(self.with_state(|s| s.groups.clone()))
    }

    async fn get_group(&self, group_id: i64) -> Result<GroupRecord> {
        self.with_state(|s| s.groups.iter().find(|g| g.id == group_id).cloned())
            .ok_or_else(|| rejected("get group", 404, "grupo no encontrado"))
    }

    async fn update_group(
        &self,
        group_id: i64,
        request: &UpdateGroupRequest,
    ) -> Result<GroupRecord> {
        self.with_state(|s| {
            s.group_updates.push((group_id, request.clone()));
            if s.fail_group_update {
                return Err(rejected("update group", 500, "error interno"));
            }
            let existing = s.groups.iter_mut().find(|g| g.id == group_id);
            let record = match existing {
                Some(group) => {
                    group.nombre.clone_from(&request.name);
                    group.url_foto.clone_from(&request.image_ref);
                    group.clone()
                }
                None => GroupRecord {
                    id: group_id,
                    nombre: request.name.clone(),
                    url_foto: request.image_ref.clone(),
                    grupo_venta: None,
                    productos: Vec::new(),
                },
            };
            Ok(record)
        })
    }

    async fn list_colors(&self) -> Result<Vec<Color>> {
        if let Some(gate) = &self.colors_gate {
            gate.notified().await;
        }
        self.with_state(|s| {
            if s.fail_colors {
                Err(rejected("list colors", 503, "No se pudieron cargar los colores"))
            } else {
                Ok(s.colors.clone())
            }
        })
    }

    async fn list_sizes(&self, sales_group_id: i64) -> Result<Vec<Size>> {
        self.with_state(|s| {
            s.size_requests += 1;
            if s.fail_sizes {
                Err(rejected("list sizes", 503, "No se pudieron cargar las tallas"))
            } else {
                Ok(s.sizes.get(&sales_group_id).cloned().unwrap_or_default())
            }
        })
    }

    async fn create_variant(&self, request: &CreateVariantRequest) -> Result<VariantRecord> {
        let hang = self.with_state(|s| {
            s.create_requests.push(request.clone());
            s.hang_create_for_colors.contains(&request.color_id)
        });
        if hang {
            std::future::pending::<()>().await;
        }
        self.with_state(|s| {
            if s.fail_create_for_colors.contains(&request.color_id) {
                return Err(rejected("create variant", 400, "color inválido"));
            }
            let id = s.next_variant_id;
            s.next_variant_id += 1;
            let nombre = s
                .colors
                .iter()
                .find(|c| c.id == request.color_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            Ok(VariantRecord {
                id,
                precio: request.price,
                stock: request.stock,
                color: Some(ColorRecord {
                    id: request.color_id,
                    nombre,
                    codigo_hex: None,
                }),
                talla: request.size_id.flatten().map(|id| SizeRecord {
                    id,
                    talla: String::new(),
                }),
                peso: None,
                url_foto: request.image_ref.clone(),
                sku: request.sku.clone(),
            })
        })
    }

    async fn update_variant(
        &self,
        variant_id: &VariantId,
        request: &UpdateVariantRequest,
    ) -> Result<VariantRecord> {
        self.with_state(|s| {
            s.update_requests.push((variant_id.clone(), request.clone()));
            if s.fail_update_for.contains(variant_id) {
                return Err(Error::Network {
                    operation: "update variant".to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(VariantRecord {
                id: variant_id.as_remote().unwrap_or_default(),
                precio: request.price,
                stock: request.stock,
                color: None,
                talla: None,
                peso: None,
                url_foto: request.image_ref.clone().flatten(),
                sku: request.sku.clone().flatten(),
            })
        })
    }

    async fn upload_image(&self, file: ImageFile) -> Result<String> {
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        self.with_state(|s| {
            s.uploads.push(file.file_name.clone());
            if s.fail_uploads.contains(&file.file_name) {
                Err(rejected("upload image", 413, "Error al subir la imagen"))
            } else {
                Ok(format!("/uploads/{}", file.file_name))
            }
        })
    }
}

// --- Builders ---

/// Rojo (1), Dorado (2), Azul (3)
#[must_use]
pub fn test_colors() -> Vec<Color> {
    [(1, "Rojo"), (2, "Dorado"), (3, "Azul")]
        .into_iter()
        .map(|(id, name)| Color {
            id,
            name: name.to_string(),
            hex: None,
        })
        .collect()
}

/// Sizes "6" (10) and "7" (11)
#[must_use]
pub fn test_sizes() -> Vec<Size> {
    vec![
        Size {
            id: 10,
            label: "6".to_string(),
        },
        Size {
            id: 11,
            label: "7".to_string(),
        },
    ]
}

/// A group with no variants, sales group 2.
#[must_use]
pub fn test_group(id: i64, name: &str, category: Category) -> ProductGroup {
    ProductGroup {
        id: GroupId::remote(id),
        name: name.to_string(),
        description: name.to_string(),
        category,
        image: String::new(),
        material: "Acero inoxidable 316L".to_string(),
        sales_group_id: Some(2),
        variants: Vec::new(),
    }
}

/// A persisted red variant.
#[must_use]
pub fn existing_variant(id: i64, stock: u32, price: f64) -> ProductVariant {
    ProductVariant {
        id: VariantId::remote(id),
        color: Some(ColorRef {
            id: 1,
            name: "Rojo".to_string(),
        }),
        size: None,
        length: None,
        weight: None,
        stock,
        price,
        image_ref: None,
        sku: Some(String::new()),
        is_new: false,
    }
}

/// An unsaved variant with no color, size, price or stock.
#[must_use]
pub fn new_variant(local_id: &str) -> ProductVariant {
    ProductVariant {
        id: VariantId::from(local_id),
        color: None,
        size: None,
        length: None,
        weight: None,
        stock: 0,
        price: 0.0,
        image_ref: None,
        sku: Some(String::new()),
        is_new: true,
    }
}

/// Group 7 (sales group 2) with variant 101 (Rojo, 10.0, 5 units) and the
/// unsaved variant `new1` without a color.
#[must_use]
pub fn scenario_group(category: Category) -> ProductGroup {
    let mut group = test_group(7, "Pulsera Corazón", category);
    group.variants = vec![existing_variant(101, 5, 10.0), new_variant("new1")];
    group
}

/// Wire record for a group, as the backend would return it.
#[must_use]
pub fn group_record(id: i64, name: &str, category: &str, variants: &[(i64, u32)]) -> GroupRecord {
    GroupRecord {
        id,
        nombre: name.to_string(),
        url_foto: None,
        grupo_venta: Some(SalesGroupRecord {
            id: 2,
            nombre: category.to_string(),
        }),
        productos: variants
            .iter()
            .map(|&(id, stock)| VariantRecord {
                id,
                precio: 10.0,
                stock,
                color: Some(ColorRecord {
                    id: 1,
                    nombre: "Rojo".to_string(),
                    codigo_hex: None,
                }),
                talla: None,
                peso: None,
                url_foto: None,
                sku: None,
            })
            .collect(),
    }
}

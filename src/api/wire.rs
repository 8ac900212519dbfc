//! JSON shapes exchanged with the catalog backend.
//!
//! The backend speaks Spanish field names (`nombre`, `precio`, `idTalla`...).
//! Records are lenient on input: amounts may arrive as numbers or numeric
//! strings and anything malformed coerces to zero. Request payloads are strict:
//! every optional key is either omitted, `null`, or a value, and the field types
//! say which.

use crate::config::CatalogSettings;
use crate::models::{
    Category, Color, ColorRef, GroupId, ProductGroup, ProductVariant, Size, SizeRef, VariantId,
    coerce_price, coerce_stock, sanitize_price,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Records (responses) ---

/// `grupos-producto` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombre: String,
    #[serde(default)]
    pub url_foto: Option<String>,
    #[serde(default)]
    pub grupo_venta: Option<SalesGroupRecord>,
    #[serde(default)]
    pub productos: Vec<VariantRecord>,
}

/// Sales group nested in a group record; its name is the category tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalesGroupRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombre: String,
}

/// `productos` record, i.e. one variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub precio: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub stock: u32,
    #[serde(default)]
    pub color: Option<ColorRecord>,
    #[serde(default)]
    pub talla: Option<SizeRecord>,
    #[serde(default)]
    pub peso: Option<f64>,
    #[serde(default)]
    pub url_foto: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// `colores` record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombre: String,
    #[serde(default)]
    pub codigo_hex: Option<String>,
}

/// `tallas` record. Nested inside a variant the label is sent as `nombre`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SizeRecord {
    pub id: i64,
    #[serde(default, alias = "nombre", deserialize_with = "null_as_empty")]
    pub talla: String,
}

/// Response of the file upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// A `null` name reads as an empty one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map_or(0.0, sanitize_price),
        Value::String(s) => coerce_price(&s),
        _ => 0.0,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => coerce_stock(&n.to_string()),
        Value::String(s) => coerce_stock(&s),
        _ => 0,
    })
}

impl GroupRecord {
    /// Converts to the domain model. The backend has no description, so the
    /// name doubles as one; groups without a sales group fall back to the
    /// configured default category.
    #[must_use]
    pub fn into_group(self, settings: &CatalogSettings) -> ProductGroup {
        let (category, sales_group_id) = match self.grupo_venta {
            Some(sales) if !sales.nombre.is_empty() => {
                (Category::from_tag(&sales.nombre), Some(sales.id))
            }
            Some(sales) => (
                Category::from_tag(&settings.default_category),
                Some(sales.id),
            ),
            None => (Category::from_tag(&settings.default_category), None),
        };
        ProductGroup {
            id: GroupId::remote(self.id),
            description: self.nombre.clone(),
            name: self.nombre,
            category,
            image: self.url_foto.unwrap_or_default(),
            material: settings.material.clone(),
            sales_group_id,
            variants: self
                .productos
                .into_iter()
                .map(VariantRecord::into_variant)
                .collect(),
        }
    }
}

impl VariantRecord {
    /// Converts to a persisted variant (`is_new == false`). Empty optional
    /// strings are treated as absent.
    #[must_use]
    pub fn into_variant(self) -> ProductVariant {
        ProductVariant {
            id: VariantId::remote(self.id),
            color: self.color.map(|c| ColorRef {
                id: c.id,
                name: c.nombre,
            }),
            size: self.talla.map(|t| SizeRef {
                id: t.id,
                label: t.talla,
            }),
            length: None,
            weight: self.peso,
            stock: self.stock,
            price: self.precio,
            image_ref: self.url_foto.filter(|s| !s.is_empty()),
            sku: self.sku.filter(|s| !s.is_empty()),
            is_new: false,
        }
    }
}

impl From<ColorRecord> for Color {
    fn from(record: ColorRecord) -> Self {
        Self {
            id: record.id,
            name: record.nombre,
            hex: record.codigo_hex,
        }
    }
}

impl From<SizeRecord> for Size {
    fn from(record: SizeRecord) -> Self {
        Self {
            id: record.id,
            label: record.talla,
        }
    }
}

// --- Requests ---

/// `PATCH /grupos-producto/{id}` body. A missing image is sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateGroupRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "urlFoto")]
    pub image_ref: Option<String>,
}

/// `POST /productos` body for one new variant.
///
/// `size_id` is omitted when `None`, sent as `null` when `Some(None)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVariantRequest {
    #[serde(rename = "idGrupoProducto")]
    pub group_id: i64,
    #[serde(rename = "idColor")]
    pub color_id: i64,
    #[serde(rename = "idTalla", skip_serializing_if = "Option::is_none")]
    pub size_id: Option<Option<i64>>,
    #[serde(rename = "precio")]
    pub price: f64,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "urlFoto", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// `PATCH /productos/{id}` body for one persisted variant.
///
/// Price and stock are always sent. Every `Option<Option<_>>` field is omitted
/// when `None`, sent as `null` when `Some(None)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateVariantRequest {
    #[serde(rename = "idColor", skip_serializing_if = "Option::is_none")]
    pub color_id: Option<i64>,
    #[serde(rename = "idTalla", skip_serializing_if = "Option::is_none")]
    pub size_id: Option<Option<i64>>,
    #[serde(rename = "precio")]
    pub price: f64,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Option<String>>,
    #[serde(rename = "urlFoto", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_record_into_group() {
        let raw = json!({
            "id": 7,
            "nombre": "Anillo Corazón",
            "urlFoto": "/uploads/corazon.png",
            "grupoVenta": { "id": 2, "nombre": "Anillos" },
            "productos": [
                {
                    "id": 101,
                    "precio": "10.50",
                    "stock": 5,
                    "color": { "id": 1, "nombre": "Rojo" },
                    "talla": { "id": 4, "nombre": "7" },
                    "peso": 2.5,
                    "urlFoto": "",
                    "sku": "AN-101"
                }
            ]
        });
        let record: GroupRecord = serde_json::from_value(raw).unwrap();
        let group = record.into_group(&CatalogSettings::default());

        assert_eq!(group.id, GroupId::remote(7));
        assert_eq!(group.description, "Anillo Corazón");
        assert_eq!(group.category, Category::Rings);
        assert_eq!(group.sales_group_id, Some(2));
        assert_eq!(group.material, "Acero inoxidable 316L");

        let variant = &group.variants[0];
        assert_eq!(variant.id, VariantId::remote(101));
        assert_eq!(variant.price, 10.5);
        assert_eq!(variant.stock, 5);
        assert_eq!(variant.size.as_ref().unwrap().label, "7");
        assert_eq!(variant.image_ref, None);
        assert_eq!(variant.sku.as_deref(), Some("AN-101"));
        assert!(!variant.is_new);
    }

    #[test]
    fn test_group_without_sales_group_uses_default_category() {
        let record: GroupRecord =
            serde_json::from_value(json!({ "id": 3, "nombre": "Pulsera" })).unwrap();
        let group = record.into_group(&CatalogSettings::default());
        assert_eq!(group.category, Category::Other("Otros".to_string()));
        assert_eq!(group.sales_group_id, None);
        assert!(group.image.is_empty());
        assert!(group.variants.is_empty());
    }

    #[test]
    fn test_null_names_read_as_empty() {
        let records: Vec<GroupRecord> = serde_json::from_value(json!([
            {
                "id": 5,
                "nombre": null,
                "grupoVenta": { "id": 2, "nombre": null },
                "productos": [
                    {
                        "id": 51,
                        "precio": 8,
                        "stock": 1,
                        "color": { "id": 1, "nombre": null },
                        "talla": { "id": 4, "nombre": null }
                    }
                ]
            },
            { "id": 6, "nombre": "Collar Luna" }
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].nombre.is_empty());
        let variant = &records[0].productos[0];
        assert_eq!(variant.color.as_ref().unwrap().nombre, "");
        assert_eq!(variant.talla.as_ref().unwrap().talla, "");

        let group = records[0].clone().into_group(&CatalogSettings::default());
        assert_eq!(group.category, Category::Other("Otros".to_string()));
        assert_eq!(records[1].nombre, "Collar Luna");
    }

    #[test]
    fn test_malformed_amounts_coerce_to_zero() {
        let record: VariantRecord = serde_json::from_value(json!({
            "id": 1,
            "precio": "n/a",
            "stock": -4
        }))
        .unwrap();
        assert_eq!(record.precio, 0.0);
        assert_eq!(record.stock, 0);
    }

    #[test]
    fn test_create_request_omits_or_nulls_size() {
        let mut request = CreateVariantRequest {
            group_id: 7,
            color_id: 3,
            size_id: None,
            price: 0.0,
            stock: 0,
            sku: None,
            image_ref: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "idGrupoProducto": 7, "idColor": 3, "precio": 0.0, "stock": 0 })
        );

        request.size_id = Some(None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["idTalla"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("idTalla"));
    }

    #[test]
    fn test_update_request_distinguishes_clear_from_unset() {
        let request = UpdateVariantRequest {
            color_id: None,
            size_id: None,
            price: 12.0,
            stock: 1,
            sku: Some(None),
            image_ref: Some(Some("/uploads/a.png".to_string())),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "precio": 12.0, "stock": 1, "sku": null, "urlFoto": "/uploads/a.png" })
        );
    }

    #[test]
    fn test_reference_records() {
        let color: Color = serde_json::from_value::<ColorRecord>(
            json!({ "id": 3, "nombre": "Azul", "codigoHex": "#0000FF" }),
        )
        .unwrap()
        .into();
        assert_eq!(color.hex.as_deref(), Some("#0000FF"));

        let size: Size = serde_json::from_value::<SizeRecord>(json!({ "id": 9, "talla": "8" }))
            .unwrap()
            .into();
        assert_eq!(size.label, "8");
    }
}

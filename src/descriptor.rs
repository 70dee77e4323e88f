//! Layer metadata, fetched once per layer and kept for the life of the client.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Deserializer};

use crate::cache::MemoCache;
use crate::endpoint::ServiceUrl;
use crate::error::Result;
use crate::io::esri::EsriGeometryType;
use crate::transport::{check_envelope, Params, Transport};
use crate::LayerId;

/// One attribute field of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    /// The ESRI field type, e.g. `esriFieldTypeOID` or `esriFieldTypeString`.
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,
}

/// Metadata the service reports for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    #[serde(default)]
    pub id: Option<LayerId>,

    #[serde(default)]
    pub name: String,

    /// Absent when the layer is a table.
    #[serde(default)]
    pub geometry_type: Option<String>,

    #[serde(default)]
    pub object_id_field: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<FieldDescriptor>,
}

impl LayerDescriptor {
    /// Field names in the order the service lists them.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn is_table(&self) -> bool {
        self.geometry_type.is_none()
    }

    /// The geometry kind of the layer, `None` for tables.
    pub fn geometry_kind(&self) -> Result<Option<EsriGeometryType>> {
        self.geometry_type
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// The field the service designates as object id, either directly or through its field type.
    pub fn object_id_field(&self) -> Option<&str> {
        self.object_id_field.as_deref().or_else(|| {
            self.fields
                .iter()
                .find(|field| field.field_type.as_deref() == Some("esriFieldTypeOID"))
                .map(|field| field.name.as_str())
        })
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Memoizes descriptors by layer id. Failed lookups are not cached.
#[derive(Debug, Default)]
pub(crate) struct DescriptorCache {
    entries: MemoCache<LayerId, Arc<LayerDescriptor>>,
}

impl DescriptorCache {
    pub fn describe<T: Transport>(
        &self,
        transport: &T,
        service: &ServiceUrl,
        layer: LayerId,
        token: Option<&str>,
    ) -> Result<Arc<LayerDescriptor>> {
        if let Some(descriptor) = self.entries.get(&layer) {
            debug!("Descriptor cache hit for layer {}", layer);
            return Ok(descriptor);
        }
        self.entries.get_or_try_insert_with(&layer, || {
            let mut params: Params = vec![("f", "json".to_string())];
            if let Some(token) = token {
                params.push(("token", token.to_string()));
            }
            let body = check_envelope(transport.get_json(&service.layer(layer), &params)?)?;
            let descriptor: LayerDescriptor = serde_json::from_value(body)?;
            Ok(Arc::new(descriptor))
        })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

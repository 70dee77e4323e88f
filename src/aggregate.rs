//! Fetching several layers into one collection.

use geojson::{Feature, FeatureCollection};
use log::debug;
use serde_json::Value;

use crate::client::ArcGis;
use crate::error::{ArcGisError, Result};
use crate::io::esri::Attributes;
use crate::paginate::FetchResult;
use crate::query::QueryFilter;
use crate::transport::Transport;
use crate::LayerId;

impl<T: Transport> ArcGis<T> {
    /// Fetch each of `layers` under the same filter and concatenate the results, in the order the
    /// layers are given.
    ///
    /// When `provenance_field` is set, every feature gets a property of that name holding the name
    /// of the layer it came from. Records of tables become features without geometry. Features are
    /// not deduplicated across layers.
    pub fn fetch_many(
        &self,
        layers: &[LayerId],
        filter: &QueryFilter,
        provenance_field: Option<&str>,
    ) -> Result<FeatureCollection> {
        let filter = QueryFilter {
            count_only: false,
            ..filter.clone()
        };
        let mut features = Vec::new();
        for &layer in layers {
            let mut layer_features = match self.fetch(layer, &filter)? {
                FetchResult::Features(collection) => collection.features,
                FetchResult::Records(records) => records.into_iter().map(record_feature).collect(),
                FetchResult::Count(_) => return Err(ArcGisError::MissingField("features")),
            };
            debug!("Layer {} gave {} features", layer, layer_features.len());

            if let Some(field) = provenance_field {
                let name = Value::String(self.describe(layer)?.name.clone());
                for feature in layer_features.iter_mut() {
                    feature
                        .properties
                        .get_or_insert_with(Default::default)
                        .insert(field.to_string(), name.clone());
                }
            }
            features.extend(layer_features);
        }
        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn record_feature(attributes: Attributes) -> Feature {
    Feature {
        bbox: None,
        geometry: None,
        id: None,
        properties: Some(attributes),
        foreign_members: None,
    }
}

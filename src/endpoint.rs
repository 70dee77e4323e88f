use url::Url;

use crate::error::Result;
use crate::LayerId;

/// The root URL of a map or feature service, e.g.
/// `https://services.arcgis.com/<org>/ArcGIS/rest/services/<name>/FeatureServer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl {
    root: String,
}

impl ServiceUrl {
    pub fn new(url: &str) -> Result<Self> {
        Url::parse(url)?;
        Ok(Self {
            root: url.trim_end_matches('/').to_string(),
        })
    }

    /// Locate a `MapServer` from the server address, the folder holding the map, and the map name.
    pub fn from_parts(base_url: &str, folder: &str, map_name: &str) -> Result<Self> {
        Self::new(&join(&[
            base_url,
            "arcgis/rest/services",
            folder,
            map_name,
            "MapServer",
        ]))
    }

    pub fn as_str(&self) -> &str {
        &self.root
    }

    /// The layer resource, which answers with the layer descriptor.
    pub fn layer(&self, layer: LayerId) -> String {
        join(&[&self.root, &layer.to_string()])
    }

    pub fn query(&self, layer: LayerId) -> String {
        join(&[&self.root, &layer.to_string(), "query"])
    }
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_end_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

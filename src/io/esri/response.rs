use serde::Deserialize;
use serde_json::{Map, Value};

/// Attribute values of one record, in the order the service listed them.
pub type Attributes = Map<String, Value>;

/// One record of a query response, before geometry translation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub attributes: Attributes,

    #[serde(default)]
    pub geometry: Option<Value>,
}

/// The decoded body of a `query` request.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Only present for count-only requests.
    #[serde(default)]
    pub count: Option<u64>,

    /// Absent for layers without geometry.
    #[serde(default)]
    pub geometry_type: Option<String>,

    #[serde(default)]
    pub exceeded_transfer_limit: bool,

    #[serde(default)]
    pub features: Vec<RawFeature>,
}

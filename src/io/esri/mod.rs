//! Decoding of the ESRI JSON responses returned by map and feature services.

pub use geometry::{translate, EsriGeometryType, GeometryTranslator};
pub use response::{Attributes, QueryResponse, RawFeature};

mod geometry;
mod response;

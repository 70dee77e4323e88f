//! Readers for the ESRI JSON wire format and writers for GeoJSON output.

pub mod esri;
pub mod geojson;

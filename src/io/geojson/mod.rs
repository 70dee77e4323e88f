//! Write fetched layers as [GeoJSON](https://geojson.org/).

pub use writer::{write_geojson, write_records};

mod writer;

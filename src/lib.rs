//! Download layers from an [ArcGIS REST](https://developers.arcgis.com/rest/) map or feature
//! service as [GeoJSON](https://geojson.org/).
//!
//! Services answer queries in ESRI JSON and cap the number of records per response. [`ArcGis`]
//! pages through a layer on its object-id field and converts each geometry, returning a GeoJSON
//! [`FeatureCollection`](geojson::FeatureCollection). Layers without geometry (tables) come back
//! as flat attribute records.
//!
//! ```no_run
//! use arcgis_rest_query::{ArcGis, FetchResult, QueryFilter};
//!
//! let districts = ArcGis::new(
//!     "https://services.arcgis.com/P3ePLMYs2RVChkJx/ArcGIS/rest/services/USA_Congressional_Districts/FeatureServer",
//! )?;
//! let filter = QueryFilter::new().with_where("STATE_ABBR = 'IN'");
//! if let FetchResult::Features(indiana) = districts.fetch(0, &filter)? {
//!     arcgis_rest_query::io::geojson::write_geojson(&indiana, std::io::stdout())?;
//! }
//! # Ok::<(), arcgis_rest_query::ArcGisError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub use client::ArcGis;
pub use descriptor::{FieldDescriptor, LayerDescriptor};
pub use endpoint::ServiceUrl;
pub use error::{ArcGisError, AuthErrorKind, Result};
pub use options::{ClientOptions, Credentials, TerminationSignal};
pub use paginate::{FetchResult, PaginationCursor};
pub use query::{Fields, QueryFilter, QueryRequest, WhereClause};
pub use transport::{HttpTransport, Transport};

/// The numeric id of a layer or table within a service.
pub type LayerId = u32;

mod aggregate;
mod cache;
mod client;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod io;
pub mod options;
pub mod paginate;
pub mod query;
#[cfg(test)]
pub(crate) mod test;
mod token;
pub mod transport;

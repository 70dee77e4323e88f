//! Translation of ESRI JSON geometries to GeoJSON geometries.
//!
//! Coordinates are passed through exactly as the service returned them. No reprojection, ring
//! winding correction or validation happens here.

use std::fmt;
use std::str::FromStr;

use geojson::{Geometry, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ArcGisError, Result};

/// The geometry kinds a layer may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EsriGeometryType {
    #[serde(rename = "esriGeometryPoint")]
    Point,
    #[serde(rename = "esriGeometryMultipoint")]
    Multipoint,
    #[serde(rename = "esriGeometryPolyline")]
    Polyline,
    #[serde(rename = "esriGeometryPolygon")]
    Polygon,
}

impl EsriGeometryType {
    /// The name the service uses on the wire, e.g. `esriGeometryPolyline`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EsriGeometryType::Point => "esriGeometryPoint",
            EsriGeometryType::Multipoint => "esriGeometryMultipoint",
            EsriGeometryType::Polyline => "esriGeometryPolyline",
            EsriGeometryType::Polygon => "esriGeometryPolygon",
        }
    }
}

impl fmt::Display for EsriGeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EsriGeometryType {
    type Err = ArcGisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "esriGeometryPoint" => Ok(EsriGeometryType::Point),
            "esriGeometryMultipoint" => Ok(EsriGeometryType::Multipoint),
            "esriGeometryPolyline" => Ok(EsriGeometryType::Polyline),
            "esriGeometryPolygon" => Ok(EsriGeometryType::Polygon),
            other => Err(ArcGisError::UnsupportedGeometry(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct EsriPoint {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Deserialize)]
struct EsriMultipoint {
    points: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct EsriPolyline {
    paths: Vec<Vec<Vec<f64>>>,
}

#[derive(Deserialize)]
struct EsriPolygon {
    rings: Vec<Vec<Vec<f64>>>,
}

/// Convert one ESRI geometry payload of a known kind.
///
/// A `null` payload and an empty point (`x` or `y` null) both produce `None`.
pub fn translate(kind: EsriGeometryType, payload: &JsonValue) -> Result<Option<Geometry>> {
    if payload.is_null() {
        return Ok(None);
    }
    let value = match kind {
        EsriGeometryType::Point => {
            let point = EsriPoint::deserialize(payload)?;
            match (point.x, point.y) {
                (Some(x), Some(y)) => Value::Point(vec![x, y]),
                _ => return Ok(None),
            }
        }
        EsriGeometryType::Multipoint => {
            Value::MultiPoint(EsriMultipoint::deserialize(payload)?.points)
        }
        EsriGeometryType::Polyline => {
            Value::MultiLineString(EsriPolyline::deserialize(payload)?.paths)
        }
        EsriGeometryType::Polygon => Value::Polygon(EsriPolygon::deserialize(payload)?.rings),
    };
    Ok(Some(Geometry::new(value)))
}

/// Converts every geometry of one layer fetch.
///
/// Resolved once from the geometry kind of the first page, as a layer holds a single kind of
/// geometry. An unrecognized kind is only an error once a payload actually has to be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryTranslator {
    kind: std::result::Result<EsriGeometryType, String>,
}

impl GeometryTranslator {
    pub fn for_kind(kind: &str) -> Self {
        Self {
            kind: EsriGeometryType::from_str(kind).map_err(|_| kind.to_string()),
        }
    }

    pub fn kind(&self) -> Option<EsriGeometryType> {
        self.kind.as_ref().ok().copied()
    }

    pub fn translate(&self, payload: Option<&JsonValue>) -> Result<Option<Geometry>> {
        let Some(payload) = payload.filter(|p| !p.is_null()) else {
            return Ok(None);
        };
        match &self.kind {
            Ok(kind) => translate(*kind, payload),
            Err(name) => Err(ArcGisError::UnsupportedGeometry(name.clone())),
        }
    }
}

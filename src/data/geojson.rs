//! Minimal GeoJSON model for routing-backend responses.
//!
//! Isochrone responses are consumed positionally: each feature's index in
//! the collection ties it to a requested cutoff, and no property beyond the
//! geometry is required.

use crate::{IsochroneError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl GeoJsonGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeoJsonGeometry::Point { .. } => "Point",
            GeoJsonGeometry::LineString { .. } => "LineString",
            GeoJsonGeometry::Polygon { .. } => "Polygon",
            GeoJsonGeometry::MultiPoint { .. } => "MultiPoint",
            GeoJsonGeometry::MultiLineString { .. } => "MultiLineString",
            GeoJsonGeometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

/// Parses a response body as a feature collection.
///
/// A body that deserializes but is not a `FeatureCollection` is as
/// malformed as one that does not deserialize at all; callers must render
/// nothing in either case.
pub fn parse_feature_collection(body: &str) -> Result<Vec<GeoJsonFeature>> {
    let data: GeoJson = serde_json::from_str(body)?;
    match data {
        GeoJson::FeatureCollection { features } => Ok(features),
        GeoJson::Feature(_) => Err(IsochroneError::Parse(
            "expected a FeatureCollection, got a bare Feature".to_string(),
        )),
    }
}

//! Overlay shapes and the styling of rendered isochrone bands.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::data::geojson::GeoJsonGeometry;
use crate::surface::MapSurface;
use crate::{IsochroneError, Result};
use serde::{Deserialize, Serialize};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Stroke and fill styling for one overlay shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Outline color
    pub stroke_color: Color,
    /// Outline width in pixels
    pub stroke_width: f32,
    /// Outline dash pattern in pixels (empty for a solid outline)
    pub dash_pattern: Vec<f32>,
    /// Fill color
    pub fill_color: Color,
    /// Fill opacity (0.0 to 1.0)
    pub fill_opacity: f32,
}

impl OverlayStyle {
    /// Style for the isochrone band at `index`, the feature's position in
    /// the response before reversal. All bands share a blue outline over a
    /// faint gray fill; odd bands get a dashed outline so adjacent rings
    /// stay distinguishable where they overlap.
    pub fn band(index: usize) -> Self {
        Self {
            stroke_color: Color::rgb(0, 0, 255),
            stroke_width: 2.0,
            dash_pattern: if index % 2 == 1 {
                vec![5.0, 5.0]
            } else {
                Vec::new()
            },
            fill_color: Color::rgb(128, 128, 128),
            fill_opacity: 0.1,
        }
    }

    pub fn is_dashed(&self) -> bool {
        !self.dash_pattern.is_empty()
    }
}

/// Areal geometry ready for a map surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayShape {
    /// A polygon with optional holes
    Polygon {
        exterior: Vec<LatLng>,
        holes: Vec<Vec<LatLng>>,
    },
    /// A multi-polygon collection, (exterior, holes) per part
    MultiPolygon {
        polygons: Vec<(Vec<LatLng>, Vec<Vec<LatLng>>)>,
    },
}

impl OverlayShape {
    /// Converts a GeoJSON geometry into an overlay shape.
    ///
    /// Isochrone features are areal by contract; any other geometry type
    /// marks the whole response as malformed.
    pub fn from_geometry(geometry: &GeoJsonGeometry) -> Result<Self> {
        match geometry {
            GeoJsonGeometry::Polygon { coordinates } => {
                let (exterior, holes) = Self::split_rings(coordinates)?;
                Ok(OverlayShape::Polygon { exterior, holes })
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|polygon| Self::split_rings(polygon))
                    .collect::<Result<Vec<_>>>()?;
                Ok(OverlayShape::MultiPolygon { polygons })
            }
            other => Err(IsochroneError::Parse(format!(
                "expected areal geometry, got {}",
                other.type_name()
            ))),
        }
    }

    /// Get the bounding box of this shape
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            OverlayShape::Polygon { exterior, .. } => LatLngBounds::from_points(exterior),
            OverlayShape::MultiPolygon { polygons } => {
                let mut bounds: Option<LatLngBounds> = None;
                for (exterior, _) in polygons {
                    if let Some(part) = LatLngBounds::from_points(exterior) {
                        bounds = Some(match bounds {
                            Some(b) => b.union(&part),
                            None => part,
                        });
                    }
                }
                bounds
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn split_rings(rings: &[Vec<[f64; 2]>]) -> Result<(Vec<LatLng>, Vec<Vec<LatLng>>)> {
        let mut rings = rings.iter().map(|ring| Self::ring(ring));
        let exterior = rings
            .next()
            .ok_or_else(|| IsochroneError::Parse("polygon with no rings".to_string()))?;
        Ok((exterior, rings.collect()))
    }

    // GeoJSON positions are [lng, lat]
    fn ring(coordinates: &[[f64; 2]]) -> Vec<LatLng> {
        coordinates
            .iter()
            .map(|c| LatLng::new(c[1], c[0]))
            .collect()
    }
}

/// In-memory overlay set, the analog of a Leaflet `LayerGroup`.
///
/// Embedders that drive a real widget implement
/// [`MapSurface`](crate::surface::MapSurface) themselves; this one backs
/// headless use and tests.
#[derive(Debug, Default)]
pub struct OverlayGroup {
    overlays: Vec<(OverlayShape, OverlayStyle)>,
    marker: LatLng,
}

impl OverlayGroup {
    /// Create an empty group with the marker at `marker`
    pub fn new(marker: LatLng) -> Self {
        Self {
            overlays: Vec::new(),
            marker,
        }
    }

    /// Overlays in draw order, bottom-most first
    pub fn overlays(&self) -> &[(OverlayShape, OverlayStyle)] {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Bounding box of every overlay currently displayed
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut bounds: Option<LatLngBounds> = None;
        for (shape, _) in &self.overlays {
            if let Some(part) = shape.bounds() {
                bounds = Some(match bounds {
                    Some(b) => b.union(&part),
                    None => part,
                });
            }
        }
        bounds
    }
}

impl MapSurface for OverlayGroup {
    fn add_overlay(&mut self, shape: OverlayShape, style: OverlayStyle) {
        self.overlays.push((shape, style));
    }

    fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    fn set_marker_position(&mut self, position: LatLng) {
        self.marker = position;
    }

    fn marker_position(&self) -> LatLng {
        self.marker
    }
}

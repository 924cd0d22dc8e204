//! # Reachmap
//!
//! An async fetch-and-render pipeline for travel-time reachability
//! ("isochrone") overlays on interactive maps.
//!
//! The crate tracks a user-selected origin, re-queries an
//! OpenTripPlanner-compatible routing backend whenever the origin moves,
//! parses the returned GeoJSON feature collection and atomically replaces
//! the displayed overlay set, preserving the stacking order that keeps
//! overlapping translucent bands legible. The map widget itself is an
//! external collaborator reached through the [`MapSurface`] trait.

pub mod core;
pub mod data;
pub mod origin;
pub mod overlay;
pub mod pipeline;
pub mod surface;

// Re-export public API
pub use crate::core::{
    config::{CutoffOrder, IsochroneConfig, TravelMode, DEFAULT_ORIGIN},
    geo::{LatLng, LatLngBounds},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::origin::{OriginHandle, OriginTracker};

pub use crate::overlay::{Color, OverlayGroup, OverlayShape, OverlayStyle};

pub use crate::pipeline::{HttpIsochroneSource, IsochronePipeline, IsochroneSource};

pub use crate::surface::MapSurface;

pub use reqwest::Url;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, IsochroneError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum IsochroneError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("routing backend returned HTTP {status}")]
    Backend { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

/// Error type alias for convenience
pub type Error = IsochroneError;

//! The seam between the pipeline and whatever map widget hosts it.

use crate::core::geo::LatLng;
use crate::overlay::{OverlayShape, OverlayStyle};

/// Map surface contract consumed by the pipeline.
///
/// Implementations wrap a concrete map widget: a group of removable overlay
/// shapes plus a single draggable origin marker. The pipeline never depends
/// on widget internals, so a headless implementation such as
/// [`OverlayGroup`](crate::overlay::OverlayGroup) works the same as a real
/// one. The embedder's event loop feeds gestures back in through
/// [`OriginTracker`](crate::origin::OriginTracker).
pub trait MapSurface: Send {
    /// Adds one shape on top of everything already present
    fn add_overlay(&mut self, shape: OverlayShape, style: OverlayStyle);

    /// Removes every overlay; must be a no-op on an empty surface
    fn clear_overlays(&mut self);

    /// Moves the origin marker
    fn set_marker_position(&mut self, position: LatLng);

    /// Current resting position of the origin marker
    fn marker_position(&self) -> LatLng;
}

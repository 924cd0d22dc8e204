//! Tracks the user-selected origin and notifies the pipeline when it moves.

use crate::core::geo::LatLng;
use crate::surface::MapSurface;
use std::sync::{Arc, Mutex};

type Subscriber = Box<dyn FnMut(LatLng) + Send>;

/// Holds the single current origin coordinate.
///
/// The tracker owns the coordinate for the process lifetime; the pipeline
/// reads it through a shared [`OriginHandle`]. Wiring between gestures and
/// the pipeline is an explicit subscription, so tests can drive the tracker
/// without any map widget behind it.
pub struct OriginTracker {
    origin: Arc<Mutex<LatLng>>,
    subscriber: Option<Subscriber>,
}

impl OriginTracker {
    pub fn new(initial: LatLng) -> Self {
        Self {
            origin: Arc::new(Mutex::new(initial)),
            subscriber: None,
        }
    }

    /// Shared read handle for the pipeline
    pub fn handle(&self) -> OriginHandle {
        OriginHandle(Arc::clone(&self.origin))
    }

    /// Registers the single subscriber, replacing any previous one
    pub fn subscribe(&mut self, subscriber: impl FnMut(LatLng) + Send + 'static) {
        self.subscriber = Some(Box::new(subscriber));
    }

    /// Replaces the origin unconditionally and synchronously notifies the
    /// subscriber. Coordinates are not bounds-checked; the routing backend
    /// is the authority on what it can serve.
    pub fn set_origin(&mut self, coordinate: LatLng) {
        match self.origin.lock() {
            Ok(mut origin) => *origin = coordinate,
            Err(poisoned) => *poisoned.into_inner() = coordinate,
        }
        if let Some(subscriber) = &mut self.subscriber {
            subscriber(coordinate);
        }
    }

    /// Current origin coordinate
    pub fn origin(&self) -> LatLng {
        self.handle().get()
    }

    /// Map-click gesture: the marker follows the click, then the origin
    /// moves there
    pub fn map_clicked<S: MapSurface>(&mut self, surface: &mut S, at: LatLng) {
        surface.set_marker_position(at);
        self.set_origin(at);
    }

    /// Marker drag-release gesture: the origin moves to wherever the marker
    /// came to rest
    pub fn marker_drag_ended<S: MapSurface>(&mut self, surface: &S) {
        self.set_origin(surface.marker_position());
    }
}

/// Read-only view of the tracked origin
#[derive(Clone)]
pub struct OriginHandle(Arc<Mutex<LatLng>>);

impl OriginHandle {
    pub fn get(&self) -> LatLng {
        match self.0.lock() {
            Ok(origin) => *origin,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

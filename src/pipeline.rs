//! The fetch-and-render pipeline: clears, queries, parses and repopulates
//! the overlay set on every origin change.

use crate::core::config::IsochroneConfig;
use crate::data::geojson::{parse_feature_collection, GeoJsonFeature};
use crate::origin::OriginHandle;
use crate::overlay::{OverlayShape, OverlayStyle};
use crate::surface::MapSurface;
use crate::{IsochroneError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared async HTTP client with a crate user-agent. Building the client
/// once lets repeated refreshes reuse the connection pool.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("reachmap/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build reqwest client")
});

/// Where isochrone feature collections come from.
///
/// [`HttpIsochroneSource`] talks to a real routing backend; tests substitute
/// scripted sources to control timing and failure.
#[async_trait]
pub trait IsochroneSource: Send + Sync {
    async fn fetch(&self, url: Url) -> Result<Vec<GeoJsonFeature>>;
}

/// Fetches isochrones from an OpenTripPlanner-compatible backend over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpIsochroneSource;

#[async_trait]
impl IsochroneSource for HttpIsochroneSource {
    async fn fetch(&self, url: Url) -> Result<Vec<GeoJsonFeature>> {
        log::debug!("GET {url}");
        let response = HTTP_CLIENT.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IsochroneError::Backend {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_feature_collection(&body)
    }
}

/// Fetch-and-render pipeline for one origin marker.
///
/// `refresh()` is the single operation: it reads the current origin, clears
/// the surface, queries the backend and repopulates the surface. Overlapping
/// refreshes each run independently; a generation counter makes the
/// latest-issued one win, so a slow response for an old origin can never
/// overwrite overlays that belong to a newer one.
pub struct IsochronePipeline<S: MapSurface, C: IsochroneSource> {
    config: IsochroneConfig,
    origin: OriginHandle,
    source: C,
    surface: Arc<Mutex<S>>,
    generation: AtomicU64,
}

impl<S, C> IsochronePipeline<S, C>
where
    S: MapSurface,
    C: IsochroneSource,
{
    pub fn new(
        config: IsochroneConfig,
        origin: OriginHandle,
        source: C,
        surface: Arc<Mutex<S>>,
    ) -> Self {
        Self {
            config,
            origin,
            source,
            surface,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &IsochroneConfig {
        &self.config
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Shared handle to the surface this pipeline draws on
    pub fn surface(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.surface)
    }

    /// Generation of the most recently issued refresh
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Runs one full update cycle for the current origin.
    ///
    /// The surface is cleared before the request goes out, so stale bands
    /// disappear the moment a gesture lands. On failure the surface stays in
    /// that explicit empty state and the error is returned to the caller;
    /// nothing is ever partially drawn.
    pub async fn refresh(&self) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock_surface().clear_overlays();

        let origin = self.origin.get();
        let url = self.config.request_url(origin)?;
        log::debug!("refresh (generation {generation}) from {},{}", origin.lat, origin.lng);

        let features = self.source.fetch(url).await?;

        // Convert every feature before touching the surface so one bad
        // geometry cannot leave a partially drawn set behind.
        let shapes = features
            .iter()
            .map(|feature| {
                let geometry = feature.geometry.as_ref().ok_or_else(|| {
                    IsochroneError::Parse("feature without geometry".to_string())
                })?;
                OverlayShape::from_geometry(geometry)
            })
            .collect::<Result<Vec<_>>>()?;
        let band_count = shapes.len();

        let mut surface = self.lock_surface();
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer refresh was issued while this one was in flight.
            log::debug!("discarding stale isochrone response (generation {generation})");
            return Ok(());
        }

        // Last feature first: with translucent fills the stacking order is
        // visible, and the first-listed feature must end up on top.
        for (index, shape) in shapes.into_iter().enumerate().rev() {
            log::debug!(
                "band {index}: cutoff {:?}s",
                self.config.cutoff_for_feature(index)
            );
            surface.add_overlay(shape, OverlayStyle::band(index));
        }
        log::info!("rendered {band_count} isochrone bands (generation {generation})");

        Ok(())
    }

    fn lock_surface(&self) -> MutexGuard<'_, S> {
        match self.surface.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<S, C> IsochronePipeline<S, C>
where
    S: MapSurface + 'static,
    C: IsochroneSource + 'static,
{
    /// Spawns `refresh()` on the async runtime, logging any failure.
    ///
    /// This is the form the gesture wiring uses: the tracker's subscriber runs
    /// synchronously and must not block on the network.
    pub fn refresh_in_background(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = pipeline.refresh().await {
                log::error!("isochrone refresh failed: {error}");
            }
        })
    }
}

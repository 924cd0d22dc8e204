//! Immutable request configuration for the isochrone pipeline.
//!
//! The parameters form one explicit bundle handed to the pipeline at
//! construction time rather than living as process-wide globals, so two
//! pipelines against different routers can coexist and tests can tweak a
//! single field off [`IsochroneConfig::default`].

use crate::core::geo::LatLng;
use crate::{IsochroneError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Startup origin of the reference deployment (Nantes).
pub const DEFAULT_ORIGIN: LatLng = LatLng {
    lat: 47.217,
    lng: -1.557,
};

/// Travel modes understood by the routing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelMode {
    Walk,
    Bicycle,
    Car,
    Transit,
    Bus,
    Rail,
    Tram,
    Subway,
    Ferry,
}

impl TravelMode {
    /// The token the backend expects in the `mode` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walk => "WALK",
            TravelMode::Bicycle => "BICYCLE",
            TravelMode::Car => "CAR",
            TravelMode::Transit => "TRANSIT",
            TravelMode::Bus => "BUS",
            TravelMode::Rail => "RAIL",
            TravelMode::Tram => "TRAM",
            TravelMode::Subway => "SUBWAY",
            TravelMode::Ferry => "FERRY",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How response feature positions map back to the requested cutoffs.
///
/// The backend contract does not spell this out; the reference deployment
/// observably lists the longest cutoff first. Kept configurable so the
/// assumption can be verified against a concrete routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutoffOrder {
    /// Feature 0 carries the largest cutoff
    #[default]
    LongestFirst,
    /// Feature 0 carries the smallest cutoff
    ShortestFirst,
}

/// Everything needed to build one isochrone request, immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochroneConfig {
    /// Base URL of the routing service, e.g. `http://localhost:8080/otp`
    pub endpoint: String,
    /// Router instance selected by path segment
    pub router_id: String,
    /// Travel date, `YYYY/MM/DD`
    pub date: String,
    /// Travel time, `HH:MM:SS`
    pub time: String,
    /// Travel mode set, comma-joined on the wire
    pub modes: Vec<TravelMode>,
    /// Travel-time thresholds in seconds, one isochrone band each
    pub cutoffs_sec: Vec<u32>,
    /// Maximum walking distance in meters
    pub max_walk_distance: u32,
    /// Polygon simplification precision in meters
    pub precision_meters: u32,
    /// Off-network snapping distance in meters
    pub off_road_distance_meters: u32,
    /// Assumed response ordering, see [`CutoffOrder`]
    pub cutoff_order: CutoffOrder,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/otp".to_string(),
            router_id: "default".to_string(),
            date: "2014/06/01".to_string(),
            time: "12:00:00".to_string(),
            modes: vec![TravelMode::Walk, TravelMode::Transit],
            cutoffs_sec: vec![900, 1800, 2700],
            max_walk_distance: 1000,
            precision_meters: 50,
            off_road_distance_meters: 80,
            cutoff_order: CutoffOrder::default(),
        }
    }
}

impl IsochroneConfig {
    /// Comma-joined mode tokens as sent on the wire, e.g. `WALK,TRANSIT`
    pub fn mode_string(&self) -> String {
        self.modes
            .iter()
            .map(TravelMode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Cutoff (seconds) believed to correspond to the response feature at
    /// `index`, under the configured [`CutoffOrder`]. `None` when the
    /// backend sent more features than cutoffs were requested.
    pub fn cutoff_for_feature(&self, index: usize) -> Option<u32> {
        let mut cutoffs = self.cutoffs_sec.clone();
        cutoffs.sort_unstable();
        match self.cutoff_order {
            CutoffOrder::LongestFirst => cutoffs
                .len()
                .checked_sub(1 + index)
                .map(|position| cutoffs[position]),
            CutoffOrder::ShortestFirst => cutoffs.get(index).copied(),
        }
    }

    /// Builds the GET request URL for the given origin.
    ///
    /// The query is assembled by hand rather than through the form-urlencoded
    /// serializer: the backend reads `fromPlace` as a literal `lat,lng` pair
    /// and `date`/`time` with their separators intact, and `cutoffSec` must
    /// repeat once per cutoff.
    pub fn request_url(&self, origin: LatLng) -> Result<Url> {
        let path = format!(
            "{}/routers/{}/isochrone",
            self.endpoint.trim_end_matches('/'),
            self.router_id
        );
        let mut url =
            Url::parse(&path).map_err(|e| IsochroneError::InvalidUrl(e.to_string()))?;

        let mut query = format!(
            "fromPlace={},{}&date={}&time={}&mode={}&maxWalkDistance={}&precisionMeters={}&offRoadDistanceMeters={}",
            origin.lat,
            origin.lng,
            self.date,
            self.time,
            self.mode_string(),
            self.max_walk_distance,
            self.precision_meters,
            self.off_road_distance_meters,
        );
        for cutoff in &self.cutoffs_sec {
            let _ = write!(query, "&cutoffSec={cutoff}");
        }
        url.set_query(Some(&query));

        Ok(url)
    }
}

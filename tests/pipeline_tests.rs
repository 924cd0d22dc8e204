//! End-to-end pipeline behavior against a scripted routing backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reachmap::data::geojson::{parse_feature_collection, GeoJsonFeature};
use reachmap::{
    IsochroneConfig, IsochroneError, IsochronePipeline, IsochroneSource, LatLng, MapSurface,
    OriginTracker, OverlayGroup, OverlayShape, Result, Url, DEFAULT_ORIGIN,
};

/// One scripted backend interaction
enum Script {
    /// Respond immediately with this body
    Ready(String),
    /// Hold the response until the gate fires, then respond with its body
    Gated(tokio::sync::oneshot::Receiver<String>),
    /// Fail with this HTTP status
    Fail(u16),
}

/// Isochrone source that replays a fixed script and records every request
struct ScriptedSource {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<Url>>,
}

impl ScriptedSource {
    fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl IsochroneSource for ScriptedSource {
    async fn fetch(&self, url: Url) -> Result<Vec<GeoJsonFeature>> {
        self.requests.lock().unwrap().push(url);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("backend queried more often than scripted");
        match script {
            Script::Ready(body) => parse_feature_collection(&body),
            Script::Gated(gate) => {
                let body = gate.await.expect("gate sender dropped");
                parse_feature_collection(&body)
            }
            Script::Fail(status) => Err(IsochroneError::Backend { status }),
        }
    }
}

/// FeatureCollection of `count` triangles, shifted by `tag` so bodies from
/// different requests stay distinguishable
fn body(tag: f64, count: usize) -> String {
    let features = (0..count)
        .map(|index| {
            let west = -1.60 + tag + index as f64 * 0.01;
            format!(
                r#"{{"type": "Feature", "properties": {{}}, "geometry": {{"type": "Polygon",
                    "coordinates": [[[{west}, 47.18], [{east}, 47.18], [{mid}, 47.25], [{west}, 47.18]]]}}}}"#,
                west = west,
                east = west + 0.10,
                mid = west + 0.05,
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features)
}

/// Shapes of a body in response order (before the pipeline's reversal)
fn shapes_of(body: &str) -> Vec<OverlayShape> {
    parse_feature_collection(body)
        .unwrap()
        .iter()
        .map(|feature| OverlayShape::from_geometry(feature.geometry.as_ref().unwrap()).unwrap())
        .collect()
}

fn rendered_shapes(surface: &OverlayGroup) -> Vec<OverlayShape> {
    surface
        .overlays()
        .iter()
        .map(|(shape, _)| shape.clone())
        .collect()
}

fn pipeline_with(
    scripts: Vec<Script>,
) -> (
    Arc<IsochronePipeline<OverlayGroup, ScriptedSource>>,
    OriginTracker,
    Arc<Mutex<OverlayGroup>>,
) {
    let tracker = OriginTracker::new(DEFAULT_ORIGIN);
    let surface = Arc::new(Mutex::new(OverlayGroup::new(DEFAULT_ORIGIN)));
    let pipeline = Arc::new(IsochronePipeline::new(
        IsochroneConfig::default(),
        tracker.handle(),
        ScriptedSource::new(scripts),
        Arc::clone(&surface),
    ));
    (pipeline, tracker, surface)
}

#[tokio::test]
async fn sequential_refreshes_leave_last_response() {
    let bodies = [body(0.0, 3), body(1.0, 2), body(2.0, 4)];
    let scripts = bodies.iter().cloned().map(Script::Ready).collect();
    let (pipeline, mut tracker, surface) = pipeline_with(scripts);

    for (index, origin) in [
        DEFAULT_ORIGIN,
        LatLng::new(47.30, -1.40),
        LatLng::new(44.840, -0.574),
    ]
    .into_iter()
    .enumerate()
    {
        tracker.set_origin(origin);
        pipeline.refresh().await.unwrap();
        assert_eq!(pipeline.generation(), index as u64 + 1);
    }

    let surface = surface.lock().unwrap();
    let mut expected = shapes_of(&bodies[2]);
    expected.reverse();
    assert_eq!(rendered_shapes(&surface), expected);
}

#[tokio::test]
async fn render_order_and_dash_alternation() {
    let three_bands = body(0.0, 3);
    let (pipeline, _tracker, surface) = pipeline_with(vec![Script::Ready(three_bands.clone())]);

    pipeline.refresh().await.unwrap();

    let surface = surface.lock().unwrap();
    let features = shapes_of(&three_bands);
    let overlays = surface.overlays();
    assert_eq!(overlays.len(), 3);

    // F2 is drawn first (bottom), F0 last (top).
    assert_eq!(overlays[0].0, features[2]);
    assert_eq!(overlays[1].0, features[1]);
    assert_eq!(overlays[2].0, features[0]);

    // Dash alternates on the original feature index: F1 dashed, F0/F2 solid.
    assert!(!overlays[0].1.is_dashed());
    assert!(overlays[1].1.is_dashed());
    assert!(!overlays[2].1.is_dashed());
}

#[tokio::test]
async fn stale_generation_is_discarded() {
    let old_body = body(0.0, 3);
    let new_body = body(5.0, 2);
    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel();
    let (pipeline, _tracker, surface) = pipeline_with(vec![
        Script::Gated(gate_rx),
        Script::Ready(new_body.clone()),
    ]);

    // Generation 1 goes out and parks on the gate.
    let stale = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Generation 2 completes and renders.
    pipeline.refresh().await.unwrap();

    // Generation 1 resolves late; its response must never reach the surface.
    gate_tx.send(old_body).unwrap();
    stale.await.unwrap().unwrap();

    let surface = surface.lock().unwrap();
    let mut expected = shapes_of(&new_body);
    expected.reverse();
    assert_eq!(rendered_shapes(&surface), expected);
}

#[tokio::test]
async fn request_carries_expected_query() {
    let (pipeline, _tracker, _surface) = pipeline_with(vec![Script::Ready(body(0.0, 3))]);

    pipeline.refresh().await.unwrap();

    let requests = pipeline.source().requests();
    assert_eq!(requests.len(), 1);
    let url = &requests[0];
    assert_eq!(url.path(), "/otp/routers/default/isochrone");

    let query = url.query().unwrap();
    for needle in [
        "fromPlace=47.217,-1.557",
        "mode=WALK,TRANSIT",
        "cutoffSec=900",
        "cutoffSec=1800",
        "cutoffSec=2700",
    ] {
        assert_eq!(query.matches(needle).count(), 1, "query {query} vs {needle}");
    }
}

#[tokio::test]
async fn failed_fetch_leaves_explicit_empty_state() {
    let (pipeline, _tracker, surface) = pipeline_with(vec![
        Script::Ready(body(0.0, 3)),
        Script::Fail(503),
    ]);

    pipeline.refresh().await.unwrap();
    assert_eq!(surface.lock().unwrap().len(), 3);

    let err = pipeline.refresh().await.unwrap_err();
    assert!(matches!(err, IsochroneError::Backend { status: 503 }));

    // Previous bands were cleared at refresh start; nothing partial remains.
    assert!(surface.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_feature_renders_nothing() {
    let mixed = format!(
        r#"{{"type": "FeatureCollection", "features": [
            {body_feature},
            {{"type": "Feature", "properties": {{}}, "geometry": {{"type": "Point", "coordinates": [-1.557, 47.217]}}}}
        ]}}"#,
        body_feature = r#"{"type": "Feature", "properties": {}, "geometry": {"type": "Polygon",
            "coordinates": [[[-1.60, 47.18], [-1.50, 47.18], [-1.55, 47.25], [-1.60, 47.18]]]}}"#,
    );
    let (pipeline, _tracker, surface) = pipeline_with(vec![Script::Ready(mixed)]);

    let err = pipeline.refresh().await.unwrap_err();
    assert!(matches!(err, IsochroneError::Parse(_)));
    assert!(surface.lock().unwrap().is_empty());
}

#[tokio::test]
async fn gesture_wiring_drives_background_refresh() {
    let (pipeline, mut tracker, surface) = pipeline_with(vec![Script::Ready(body(0.0, 3))]);

    {
        let pipeline = Arc::clone(&pipeline);
        tracker.subscribe(move |_| {
            pipeline.refresh_in_background();
        });
    }

    {
        let mut surface = surface.lock().unwrap();
        tracker.map_clicked(&mut *surface, LatLng::new(47.30, -1.40));
        assert_eq!(surface.marker_position(), LatLng::new(47.30, -1.40));
    }

    // The spawned refresh needs a moment to run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(surface.lock().unwrap().len(), 3);

    let requests = pipeline.source().requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .query()
        .unwrap()
        .contains("fromPlace=47.3,-1.4"));
}

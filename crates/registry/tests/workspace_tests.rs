//! Workspace behavior tests against a recording bridge.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use registry::{
    DebounceKey, Debouncer, LayerWorkspace, MapBridge, StatsProvider, StatsRequest, StatsUpdate,
    WorkspaceConfig,
};
use symbology::{PaintMode, StyleArtifact, Symbology};
use viewer_common::{
    BoundingBox, FieldKind, FieldStats, LayerCode, LayerDescriptor, LayerField, LayerKind,
    ViewerError,
};

#[derive(Debug, Clone, PartialEq)]
enum BridgeEvent {
    Attach(LayerCode, bool),
    Update(LayerCode, StyleArtifact),
    Visible(LayerCode, bool),
    Z(LayerCode, i32),
    Detach(LayerCode),
    Icon(LayerCode),
}

#[derive(Default)]
struct RecordingBridge {
    events: Arc<Mutex<Vec<BridgeEvent>>>,
}

impl RecordingBridge {
    fn new() -> (Self, Arc<Mutex<Vec<BridgeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
            },
            events,
        )
    }
}

impl MapBridge for RecordingBridge {
    fn attach_layer(&mut self, code: &LayerCode, _: &str, style: Option<&StyleArtifact>) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Attach(code.clone(), style.is_some()));
    }
    fn update_style(&mut self, code: &LayerCode, style: &StyleArtifact) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Update(code.clone(), style.clone()));
    }
    fn set_visible(&mut self, code: &LayerCode, visible: bool) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Visible(code.clone(), visible));
    }
    fn set_z_index(&mut self, code: &LayerCode, z: i32) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Z(code.clone(), z));
    }
    fn detach_layer(&mut self, code: &LayerCode) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Detach(code.clone()));
    }
    fn set_row_icon(&mut self, code: &LayerCode, _: &str) {
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Icon(code.clone()));
    }
}

struct StaticStats;

#[async_trait]
impl StatsProvider for StaticStats {
    async fn field_statistics(
        &self,
        _: &StatsRequest,
    ) -> Result<(f64, f64), Box<dyn std::error::Error + Send + Sync>> {
        Ok((0.0, 1000.0))
    }
}

fn polygon_descriptor(code: &str) -> LayerDescriptor {
    LayerDescriptor {
        code: LayerCode::new(code),
        kind: LayerKind::Polygon,
        name: format!("Layer {code}"),
        source_ref: format!("hs-geoserver:{code}"),
        resource_id: "res-1".to_string(),
        fields: vec![
            LayerField::new("name", FieldKind::Categorical),
            LayerField::new("area", FieldKind::Numerical),
        ],
        extent: BoundingBox::new(-112.0, 41.0, -111.0, 42.0),
    }
}

fn workspace() -> (
    LayerWorkspace<RecordingBridge>,
    Arc<Mutex<Vec<BridgeEvent>>>,
    tokio::sync::mpsc::UnboundedReceiver<StatsUpdate>,
) {
    let (bridge, events) = RecordingBridge::new();
    let (ws, rx) = LayerWorkspace::new(WorkspaceConfig::default(), bridge, Arc::new(StaticStats));
    (ws, events, rx)
}

fn last_sld_for(events: &Arc<Mutex<Vec<BridgeEvent>>>, code: &LayerCode) -> Option<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .rev()
        .find_map(|event| match event {
            BridgeEvent::Update(c, StyleArtifact::Sld(doc)) if c == code => Some(doc.clone()),
            _ => None,
        })
}

#[tokio::test]
async fn test_capacity_is_enforced_before_mutation() {
    let (mut ws, _events, _rx) = workspace();
    for i in 0..8 {
        ws.add(polygon_descriptor(&format!("HS:layer-{i}"))).unwrap();
    }
    let err = ws.add(polygon_descriptor("HS:layer-8")).unwrap_err();
    assert!(matches!(err, ViewerError::WorkspaceFull { max: 8 }));
    assert_eq!(ws.len(), 8);
    assert!(ws.record(&LayerCode::new("HS:layer-8")).is_none());
}

#[tokio::test]
async fn test_duplicate_code_is_rejected() {
    let (mut ws, _events, _rx) = workspace();
    ws.add(polygon_descriptor("HS:one")).unwrap();
    let err = ws.add(polygon_descriptor("HS:one")).unwrap_err();
    assert!(matches!(err, ViewerError::DuplicateLayer(_)));
    assert_eq!(ws.len(), 1);
}

#[tokio::test]
async fn test_failed_add_does_not_advance_swatch_rotation() {
    let (mut ws, _events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    ws.add(polygon_descriptor("HS:a")).unwrap_err();
    let b = ws.add(polygon_descriptor("HS:b")).unwrap();

    let fill = |code: &LayerCode| match &ws.record(code).unwrap().symbology {
        Symbology::Polygon(p) => p.fill_color,
        other => panic!("unexpected symbology: {:?}", other),
    };
    assert_eq!(fill(&a), symbology::DEFAULT_SWATCHES[0]);
    assert_eq!(fill(&b), symbology::DEFAULT_SWATCHES[1]);
}

#[tokio::test]
async fn test_new_layer_lands_on_top_with_descending_z() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let b = ws.add(polygon_descriptor("HS:b")).unwrap();

    assert_eq!(ws.order(), &[b.clone(), a.clone()]);

    // Last z pass after the second add: b on top at base, a below.
    let zs: Vec<BridgeEvent> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, BridgeEvent::Z(_, _)))
        .cloned()
        .collect();
    assert_eq!(
        &zs[zs.len() - 2..],
        &[BridgeEvent::Z(b, 100), BridgeEvent::Z(a, 99)]
    );
}

#[tokio::test]
async fn test_reorder_is_deterministic_and_stable() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let b = ws.add(polygon_descriptor("HS:b")).unwrap();
    let c = ws.add(polygon_descriptor("HS:c")).unwrap();

    let last_three = |events: &Arc<Mutex<Vec<BridgeEvent>>>| -> Vec<BridgeEvent> {
        let events = events.lock().unwrap();
        events[events.len() - 3..].to_vec()
    };

    let target = vec![a.clone(), c.clone(), b.clone()];
    ws.reorder(&target).unwrap();
    let first_pass = last_three(&events);

    ws.reorder(&target).unwrap();
    let second_pass = last_three(&events);

    assert_eq!(ws.order(), target.as_slice());
    assert_eq!(first_pass, second_pass);
    assert_eq!(
        second_pass,
        vec![
            BridgeEvent::Z(a, 100),
            BridgeEvent::Z(c, 99),
            BridgeEvent::Z(b, 98),
        ]
    );
}

/// Drag reordering goes through the debouncer: each drag event
/// re-triggers the reorder key with the latest target order, and only
/// the final order reaches the workspace.
#[tokio::test(start_paused = true)]
async fn test_debounced_reorder_applies_only_final_order() {
    let (ws, events, _rx) = workspace();
    let ws = Arc::new(Mutex::new(ws));
    let (a, b, c) = {
        let mut ws = ws.lock().unwrap();
        (
            ws.add(polygon_descriptor("HS:a")).unwrap(),
            ws.add(polygon_descriptor("HS:b")).unwrap(),
            ws.add(polygon_descriptor("HS:c")).unwrap(),
        )
    };
    let z_events = |events: &Arc<Mutex<Vec<BridgeEvent>>>| {
        events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, BridgeEvent::Z(_, _)))
            .count()
    };
    let before = z_events(&events);

    let mut debouncer = Debouncer::new();
    let drags = [
        vec![b.clone(), c.clone(), a.clone()],
        vec![c.clone(), b.clone(), a.clone()],
        vec![a.clone(), b.clone(), c.clone()],
    ];
    for order in drags {
        let ws = Arc::clone(&ws);
        debouncer.trigger(DebounceKey::Reorder, move || {
            ws.lock().unwrap().reorder(&order).unwrap();
        });
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    let ws = ws.lock().unwrap();
    assert_eq!(ws.order(), &[a, b, c]);
    // One reorder ran: a single z pass over the three layers.
    assert_eq!(z_events(&events) - before, 3);
}

#[tokio::test]
async fn test_reorder_rejects_non_permutations() {
    let (mut ws, _events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let _b = ws.add(polygon_descriptor("HS:b")).unwrap();

    // Too short.
    assert!(matches!(
        ws.reorder(&[a.clone()]),
        Err(ViewerError::InvalidOrder)
    ));
    // Duplicate entry.
    assert!(matches!(
        ws.reorder(&[a.clone(), a.clone()]),
        Err(ViewerError::InvalidOrder)
    ));
    // Unknown code.
    assert!(matches!(
        ws.reorder(&[a, LayerCode::new("HS:ghost")]),
        Err(ViewerError::InvalidOrder)
    ));
}

#[tokio::test]
async fn test_selection_is_scoped_to_active_layer() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let b = ws.add(polygon_descriptor("HS:b")).unwrap();

    ws.set_active(Some(a.clone())).unwrap();
    ws.select_feature(vec![("name".to_string(), "Logan River".to_string())])
        .unwrap();

    let highlighted = last_sld_for(&events, &a).unwrap();
    assert!(highlighted.contains("<ogc:Filter>"));
    assert!(highlighted.contains("Logan River"));

    // Switching the active layer clears the selection and restyles the
    // layer that lost its highlight.
    ws.set_active(Some(b)).unwrap();
    assert!(ws.selection().is_none());
    let restyled = last_sld_for(&events, &a).unwrap();
    assert!(!restyled.contains("<ogc:Filter>"));
}

#[tokio::test]
async fn test_select_feature_requires_active_layer() {
    let (mut ws, _events, _rx) = workspace();
    ws.add(polygon_descriptor("HS:a")).unwrap();
    assert!(ws
        .select_feature(vec![("name".to_string(), "x".to_string())])
        .is_err());
}

#[tokio::test]
async fn test_remove_clears_active_and_selection() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    ws.set_active(Some(a.clone())).unwrap();
    ws.select_feature(vec![("name".to_string(), "x".to_string())])
        .unwrap();

    ws.remove(&a).unwrap();
    assert!(ws.active().is_none());
    assert!(ws.selection().is_none());
    assert!(ws.is_empty());
    assert!(events
        .lock()
        .unwrap()
        .contains(&BridgeEvent::Detach(a.clone())));
    assert!(matches!(
        ws.remove(&a),
        Err(ViewerError::LayerNotFound(_))
    ));
}

#[tokio::test]
async fn test_set_symbology_rejects_kind_mismatch() {
    let (mut ws, _events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let point = Symbology::default_for(LayerKind::Point, &[], symbology::DEFAULT_SWATCHES[0]);
    assert!(matches!(
        ws.set_symbology(&a, point),
        Err(ViewerError::SymbologyMismatch { .. })
    ));
}

/// Full gradient lifecycle: simple fill, switch to gradient (stats
/// absent, empty rules pushed, fetch issued), statistics resolve, and
/// the final style interpolates over the scaled colormap.
#[tokio::test]
async fn test_gradient_lifecycle_resolves_through_stats_channel() {
    let (mut ws, events, mut rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();

    let mut polygon = match &ws.record(&a).unwrap().symbology {
        Symbology::Polygon(p) => p.clone(),
        other => panic!("unexpected symbology: {:?}", other),
    };
    polygon.fill_mode = PaintMode::Gradient;
    polygon.fill_gradient = "viridis".to_string();
    ws.set_symbology(&a, Symbology::Polygon(polygon)).unwrap();

    // Stats were absent, so the pushed style has no rules yet and the
    // fetch is marked in flight.
    let pending = last_sld_for(&events, &a).unwrap();
    assert!(pending.contains("<FeatureTypeStyle></FeatureTypeStyle>"));
    assert!(ws.field_stats(&a, "area").is_loading());

    let update = rx.recv().await.expect("stats update");
    assert_eq!(update.field, "area");
    ws.apply_stats_update(update).unwrap();

    assert_eq!(
        ws.field_stats(&a, "area"),
        FieldStats::Ready {
            min: 0.0,
            max: 1000.0
        }
    );
    let resolved = last_sld_for(&events, &a).unwrap();
    assert!(resolved.contains("<ogc:Function name=\"Interpolate\">"));
    assert!(resolved.contains("<ogc:Literal>125</ogc:Literal>"));
}

#[tokio::test]
async fn test_stale_stats_update_is_discarded() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let before = events.lock().unwrap().len();

    // The layer's symbology is still the simple default, so a stats
    // result for "area" no longer matches anything.
    ws.apply_stats_update(StatsUpdate {
        code: a.clone(),
        field: "area".to_string(),
        stats: Ok((0.0, 10.0)),
    })
    .unwrap();

    assert_eq!(ws.field_stats(&a, "area"), FieldStats::Absent);
    assert_eq!(events.lock().unwrap().len(), before);
}

#[tokio::test]
async fn test_rename_is_display_only() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    let before = events.lock().unwrap().len();

    ws.rename(&a, "Watersheds (Logan)").unwrap();
    assert_eq!(ws.record(&a).unwrap().display_name, "Watersheds (Logan)");
    assert_eq!(events.lock().unwrap().len(), before);
}

#[tokio::test]
async fn test_visibility_passes_through() {
    let (mut ws, events, _rx) = workspace();
    let a = ws.add(polygon_descriptor("HS:a")).unwrap();
    ws.set_visible(&a, false).unwrap();
    assert!(!ws.record(&a).unwrap().visible);
    assert!(events
        .lock()
        .unwrap()
        .contains(&BridgeEvent::Visible(a, false)));
}

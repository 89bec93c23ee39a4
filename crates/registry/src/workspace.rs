//! The layer workspace: keyed records, display order, active layer,
//! selection, and the glue that keeps the map in sync.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use symbology::{compile_style, row_icon, StyleArtifact, Symbology, DEFAULT_SWATCHES};
use tokio::sync::mpsc;
use tracing::{debug, info};
use viewer_common::{
    BoundingBox, FieldStats, LayerCode, LayerDescriptor, LayerField, LayerKind, ViewerError,
    ViewerResult,
};

use crate::bridge::MapBridge;
use crate::config::WorkspaceConfig;
use crate::selection::FeatureSelection;
use crate::stats::{FieldStatsCache, StatsProvider, StatsRequest, StatsUpdate};

/// One registered layer. Z-order is derived from position in the
/// workspace's order list and never stored here.
#[derive(Debug, Clone)]
pub struct LayerRecord {
    pub code: LayerCode,
    pub kind: LayerKind,
    pub display_name: String,
    pub source_ref: String,
    pub resource_id: String,
    pub fields: Vec<LayerField>,
    pub extent: BoundingBox,
    pub visible: bool,
    pub symbology: Symbology,
    /// Last artifact pushed to the bridge, for change diffing.
    last_artifact: Option<StyleArtifact>,
}

/// Session-scoped registry of map layers.
///
/// Callers serialize access; there is no internal locking. Statistics
/// fetches are the only async path and re-enter through
/// [`apply_stats_update`](Self::apply_stats_update).
pub struct LayerWorkspace<B: MapBridge> {
    config: WorkspaceConfig,
    bridge: B,
    records: HashMap<LayerCode, LayerRecord>,
    /// Display order, index 0 on top.
    order: Vec<LayerCode>,
    active: Option<LayerCode>,
    selection: Option<FeatureSelection>,
    stats: FieldStatsCache,
    swatch_cursor: usize,
}

impl<B: MapBridge> LayerWorkspace<B> {
    /// Create a workspace and the channel its statistics results
    /// arrive on. The caller drains the receiver into
    /// [`apply_stats_update`](Self::apply_stats_update).
    pub fn new(
        config: WorkspaceConfig,
        bridge: B,
        provider: Arc<dyn StatsProvider>,
    ) -> (Self, mpsc::UnboundedReceiver<StatsUpdate>) {
        let (stats, rx) = FieldStatsCache::new(provider);
        (
            Self {
                config,
                bridge,
                records: HashMap::new(),
                order: Vec::new(),
                active: None,
                selection: None,
                stats,
                swatch_cursor: 0,
            },
            rx,
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current display order, top first.
    pub fn order(&self) -> &[LayerCode] {
        &self.order
    }

    pub fn record(&self, code: &LayerCode) -> Option<&LayerRecord> {
        self.records.get(code)
    }

    pub fn active(&self) -> Option<&LayerCode> {
        self.active.as_ref()
    }

    pub fn selection(&self) -> Option<&FeatureSelection> {
        self.selection.as_ref()
    }

    /// Statistics state for one field, as the compiler will see it.
    pub fn field_stats(&self, code: &LayerCode, field: &str) -> FieldStats {
        self.stats.get(code, field)
    }

    /// Register a layer: capacity and uniqueness are checked before
    /// any mutation. The new layer lands on top of the order with a
    /// default symbology drawn from the rotating swatch palette.
    pub fn add(&mut self, descriptor: LayerDescriptor) -> ViewerResult<LayerCode> {
        if self.records.len() >= self.config.max_layers {
            return Err(ViewerError::WorkspaceFull {
                max: self.config.max_layers,
            });
        }
        if self.records.contains_key(&descriptor.code) {
            return Err(ViewerError::DuplicateLayer(descriptor.code.to_string()));
        }

        let swatch = DEFAULT_SWATCHES[self.swatch_cursor % DEFAULT_SWATCHES.len()];
        let code = descriptor.code.clone();
        let symbology = Symbology::default_for(descriptor.kind, &descriptor.fields, swatch);
        let mut record = LayerRecord {
            code: code.clone(),
            kind: descriptor.kind,
            display_name: descriptor.name,
            source_ref: descriptor.source_ref,
            resource_id: descriptor.resource_id,
            fields: descriptor.fields,
            extent: descriptor.extent,
            visible: true,
            symbology,
            last_artifact: None,
        };

        // Compile and render the icon before touching workspace state,
        // including the swatch cursor, so a bad descriptor leaves
        // everything untouched.
        let mut pending = None;
        let mut icon = None;
        if record.kind.is_stylable() {
            let fields = self.resolve_fields(&record);
            let selection_pairs = self.selection_pairs_for(&record.code);
            let output = compile_style(
                &record.code,
                record.kind,
                &record.symbology,
                &fields,
                selection_pairs.as_deref(),
            )?;
            pending = output.pending_field;
            record.last_artifact = Some(output.artifact);
            icon = Some(row_icon(&code, &record.symbology)?);
        }
        self.swatch_cursor += 1;

        self.bridge
            .attach_layer(&code, &record.source_ref, record.last_artifact.as_ref());
        if let Some(icon) = &icon {
            self.bridge.set_row_icon(&code, icon);
        }

        self.records.insert(code.clone(), record);
        self.order.insert(0, code.clone());
        self.push_z_indices();

        if let Some(field) = pending {
            self.request_stats(&code, field);
        }

        info!(layer = %code, total = self.records.len(), "layer added");
        Ok(code)
    }

    /// Remove a layer, releasing its map handle, cached statistics,
    /// and any active/selection reference to it.
    pub fn remove(&mut self, code: &LayerCode) -> ViewerResult<()> {
        if self.records.remove(code).is_none() {
            return Err(ViewerError::LayerNotFound(code.to_string()));
        }
        self.order.retain(|c| c != code);
        self.stats.forget_layer(code);
        self.bridge.detach_layer(code);

        if self.active.as_ref() == Some(code) {
            self.active = None;
        }
        if self.selection.as_ref().map(|s| &s.layer) == Some(code) {
            self.selection = None;
        }
        self.push_z_indices();

        info!(layer = %code, total = self.records.len(), "layer removed");
        Ok(())
    }

    /// Replace the display order. `new_order` must be a permutation of
    /// the current codes. Idempotent under repetition.
    pub fn reorder(&mut self, new_order: &[LayerCode]) -> ViewerResult<()> {
        if new_order.len() != self.order.len() {
            return Err(ViewerError::InvalidOrder);
        }
        let mut seen = HashSet::new();
        for code in new_order {
            if !self.records.contains_key(code) || !seen.insert(code) {
                return Err(ViewerError::InvalidOrder);
            }
        }

        self.order = new_order.to_vec();
        self.push_z_indices();
        Ok(())
    }

    pub fn set_visible(&mut self, code: &LayerCode, visible: bool) -> ViewerResult<()> {
        let record = self
            .records
            .get_mut(code)
            .ok_or_else(|| ViewerError::LayerNotFound(code.to_string()))?;
        record.visible = visible;
        self.bridge.set_visible(code, visible);
        Ok(())
    }

    /// Change the display name. Display-only: no recompile, no map push.
    pub fn rename(&mut self, code: &LayerCode, name: impl Into<String>) -> ViewerResult<()> {
        let record = self
            .records
            .get_mut(code)
            .ok_or_else(|| ViewerError::LayerNotFound(code.to_string()))?;
        record.display_name = name.into();
        Ok(())
    }

    /// Switch the active layer. The selection is scoped to the active
    /// layer, so switching clears it and restyles the layer that loses
    /// its highlight.
    pub fn set_active(&mut self, code: Option<LayerCode>) -> ViewerResult<()> {
        if let Some(code) = &code {
            if !self.records.contains_key(code) {
                return Err(ViewerError::LayerNotFound(code.to_string()));
            }
        }
        if self.active == code {
            return Ok(());
        }
        if let Some(old) = self.selection.take() {
            self.recompile(&old.layer)?;
        }
        self.active = code;
        Ok(())
    }

    /// Select a feature on the active layer by its attribute pairs.
    /// Any previous selection (on any layer) is replaced and the layer
    /// that lost it is restyled.
    pub fn select_feature(&mut self, attributes: Vec<(String, String)>) -> ViewerResult<()> {
        let active = self
            .active
            .clone()
            .ok_or_else(|| ViewerError::LayerNotFound("<no active layer>".to_string()))?;

        if let Some(old) = self.selection.take() {
            if old.layer != active {
                self.recompile(&old.layer)?;
            }
        }
        self.selection = Some(FeatureSelection::new(active.clone(), attributes));
        self.recompile(&active)
    }

    /// Drop the selection and restyle the layer that held it.
    pub fn clear_selection(&mut self) -> ViewerResult<()> {
        if let Some(old) = self.selection.take() {
            self.recompile(&old.layer)?;
        }
        Ok(())
    }

    /// Replace a layer's symbology. Kind-checked; the recompile, map
    /// push, and icon refresh happen before this returns.
    pub fn set_symbology(&mut self, code: &LayerCode, symbology: Symbology) -> ViewerResult<()> {
        let record = self
            .records
            .get_mut(code)
            .ok_or_else(|| ViewerError::LayerNotFound(code.to_string()))?;
        if !symbology.matches_kind(record.kind) {
            return Err(ViewerError::SymbologyMismatch {
                kind: record.kind.to_string(),
                expected: Symbology::expected_for(record.kind).to_string(),
            });
        }
        record.symbology = symbology;
        self.recompile(code)
    }

    /// Apply one statistics fetch result from the channel.
    ///
    /// Stale results are discarded: the layer must still exist and its
    /// symbology must still reference the field. A failed or stale
    /// entry reverts to `Absent` so a later binding can refetch.
    pub fn apply_stats_update(&mut self, update: StatsUpdate) -> ViewerResult<()> {
        let (min, max) = match update.stats {
            Ok(stats) => stats,
            Err(_) => {
                self.stats.mark_absent(&update.code, &update.field);
                return Ok(());
            }
        };

        let current = self
            .records
            .get(&update.code)
            .map(|record| record_references_field(record, &update.field))
            .unwrap_or(false);
        if !current {
            debug!(
                layer = %update.code,
                field = %update.field,
                "discarding stale statistics response"
            );
            self.stats.mark_absent(&update.code, &update.field);
            return Ok(());
        }

        self.stats.mark_ready(&update.code, &update.field, min, max);
        self.recompile(&update.code)
    }

    /// Recompile one layer and push the artifact to the bridge when it
    /// changed. Also refreshes the row icon and issues any statistics
    /// request the compile reported as pending.
    fn recompile(&mut self, code: &LayerCode) -> ViewerResult<()> {
        let record = self
            .records
            .get(code)
            .ok_or_else(|| ViewerError::LayerNotFound(code.to_string()))?;
        if !record.kind.is_stylable() {
            return Ok(());
        }

        let fields = self.resolve_fields(record);
        let selection_pairs = self.selection_pairs_for(code);
        let output = compile_style(
            code,
            record.kind,
            &record.symbology,
            &fields,
            selection_pairs.as_deref(),
        )?;
        let changed = record.last_artifact.as_ref() != Some(&output.artifact);
        let icon = row_icon(code, &record.symbology)?;
        let pending = output.pending_field;

        if changed {
            self.bridge.update_style(code, &output.artifact);
            self.bridge.set_row_icon(code, &icon);
            if let Some(record) = self.records.get_mut(code) {
                record.last_artifact = Some(output.artifact);
            }
        }
        if let Some(field) = pending {
            self.request_stats(code, field);
        }
        Ok(())
    }

    /// Field list with statistics resolved from the cache, as the
    /// compiler consumes it.
    fn resolve_fields(&self, record: &LayerRecord) -> Vec<LayerField> {
        record
            .fields
            .iter()
            .map(|field| LayerField {
                name: field.name.clone(),
                kind: field.kind,
                stats: self.stats.get(&record.code, &field.name),
            })
            .collect()
    }

    /// Filter pairs for a layer: present only when the selection sits
    /// on it and carries non-empty attributes.
    fn selection_pairs_for(&self, code: &LayerCode) -> Option<Vec<(String, String)>> {
        self.selection
            .as_ref()
            .filter(|s| &s.layer == code && !s.is_empty())
            .map(|s| s.attributes().to_vec())
    }

    fn request_stats(&mut self, code: &LayerCode, field: String) {
        let Some(record) = self.records.get(code) else {
            return;
        };
        let Some(layer_field) = record.fields.iter().find(|f| f.name == field) else {
            return;
        };
        self.stats.request(StatsRequest {
            layer_kind: record.kind,
            code: code.clone(),
            resource_id: record.resource_id.clone(),
            field_name: field,
            field_kind: layer_field.kind,
        });
    }

    fn push_z_indices(&mut self) {
        let base = self.config.base_z_index;
        for (position, code) in self.order.iter().enumerate() {
            self.bridge.set_z_index(code, base - position as i32);
        }
    }
}

/// Whether a statistics result for `field` is still relevant to the
/// record's current symbology.
fn record_references_field(record: &LayerRecord, field: &str) -> bool {
    match &record.symbology {
        Symbology::Raster(raster) => {
            raster.fill_mode == symbology::PaintMode::Gradient
                && record.fields.first().map(|f| f.name == field).unwrap_or(false)
        }
        other => other.gradient_field() == Some(field),
    }
}

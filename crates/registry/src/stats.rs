//! Field statistics cache with request deduplication.
//!
//! Statistics are fetched lazily the first time a gradient style needs
//! them. The cache holds the tri-state per `(layer, field)` key and
//! guarantees at most one in-flight fetch per key; results come back
//! over an mpsc channel so the workspace can apply them with its
//! staleness check on its own thread.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use viewer_common::{FieldKind, FieldStats, LayerCode, LayerKind};

/// Everything the statistics service needs to compute min/max for one
/// field.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRequest {
    pub layer_kind: LayerKind,
    pub code: LayerCode,
    pub resource_id: String,
    pub field_name: String,
    pub field_kind: FieldKind,
}

/// Source of field statistics, implemented by the HydroShare
/// statistics client and by test doubles.
#[async_trait]
pub trait StatsProvider: Send + Sync + 'static {
    async fn field_statistics(
        &self,
        request: &StatsRequest,
    ) -> Result<(f64, f64), Box<dyn std::error::Error + Send + Sync>>;
}

/// One fetch outcome, delivered over the cache's channel. Errors carry
/// the provider's message for logging only.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    pub code: LayerCode,
    pub field: String,
    pub stats: Result<(f64, f64), String>,
}

/// Tri-state statistics store keyed by `(layer code, field name)`.
pub struct FieldStatsCache {
    entries: HashMap<(LayerCode, String), FieldStats>,
    provider: Arc<dyn StatsProvider>,
    tx: mpsc::UnboundedSender<StatsUpdate>,
}

impl FieldStatsCache {
    /// Create the cache and the receiver its fetch results arrive on.
    pub fn new(
        provider: Arc<dyn StatsProvider>,
    ) -> (Self, mpsc::UnboundedReceiver<StatsUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                entries: HashMap::new(),
                provider,
                tx,
            },
            rx,
        )
    }

    /// Current state for a key; unknown keys are `Absent`.
    pub fn get(&self, code: &LayerCode, field: &str) -> FieldStats {
        self.entries
            .get(&(code.clone(), field.to_string()))
            .copied()
            .unwrap_or(FieldStats::Absent)
    }

    /// Start a fetch unless one is in flight or already resolved.
    /// Duplicate requests while `Loading` are no-ops.
    pub fn request(&mut self, request: StatsRequest) {
        let key = (request.code.clone(), request.field_name.clone());
        match self.entries.get(&key) {
            Some(FieldStats::Loading) | Some(FieldStats::Ready { .. }) => {
                debug!(
                    layer = %request.code,
                    field = %request.field_name,
                    "statistics request deduplicated"
                );
                return;
            }
            _ => {}
        }
        self.entries.insert(key, FieldStats::Loading);

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let stats = provider
                .field_statistics(&request)
                .await
                .map_err(|e| e.to_string());
            if let Err(ref message) = stats {
                warn!(
                    layer = %request.code,
                    field = %request.field_name,
                    error = %message,
                    "statistics fetch failed"
                );
            }
            // Receiver gone means the workspace was dropped.
            let _ = tx.send(StatsUpdate {
                code: request.code,
                field: request.field_name,
                stats,
            });
        });
    }

    /// Record a resolved fetch.
    pub fn mark_ready(&mut self, code: &LayerCode, field: &str, min: f64, max: f64) {
        self.entries
            .insert((code.clone(), field.to_string()), FieldStats::Ready { min, max });
    }

    /// Revert a key to `Absent` so the next compile can retry. Used for
    /// failed fetches and for stale responses whose binding moved on.
    pub fn mark_absent(&mut self, code: &LayerCode, field: &str) {
        self.entries
            .insert((code.clone(), field.to_string()), FieldStats::Absent);
    }

    /// Drop all entries for a removed layer.
    pub fn forget_layer(&mut self, code: &LayerCode) {
        self.entries.retain(|(layer, _), _| layer != code);
    }
}

impl std::fmt::Debug for FieldStatsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStatsCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

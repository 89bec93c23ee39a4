//! Map layer registry and workspace state.
//!
//! `LayerWorkspace` owns the layer collection, display order, active
//! layer, feature selection, and field statistics cache. Every
//! mutation performs its dependent recomputation (style compile, map
//! push, row icon) synchronously before returning, so the map and the
//! workspace list never disagree. Statistics fetches are the one async
//! path: they run on tokio tasks and report back over an mpsc channel
//! that the caller drains into `apply_stats_update`.

pub mod bridge;
pub mod config;
pub mod debounce;
pub mod selection;
pub mod stats;
pub mod workspace;

pub use bridge::{MapBridge, NoopBridge};
pub use config::WorkspaceConfig;
pub use debounce::{DebounceDelays, DebounceKey, Debouncer};
pub use selection::FeatureSelection;
pub use stats::{FieldStatsCache, StatsProvider, StatsRequest, StatsUpdate};
pub use workspace::{LayerRecord, LayerWorkspace};

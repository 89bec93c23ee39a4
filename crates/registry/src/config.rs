//! Workspace configuration, loaded from the environment with defaults.

use crate::debounce::DebounceDelays;

#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Maximum number of registered layers.
    pub max_layers: usize,
    /// Z-index of the top layer; lower rows get `base_z_index - position`.
    pub base_z_index: i32,
    pub debounce: DebounceDelays,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_layers: 8,
            base_z_index: 100,
            debounce: DebounceDelays::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Read overrides from `VIEWER_MAX_LAYERS` / `VIEWER_BASE_Z_INDEX`,
    /// keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_layers: env_parse("VIEWER_MAX_LAYERS", defaults.max_layers),
            base_z_index: env_parse("VIEWER_BASE_Z_INDEX", defaults.base_z_index),
            debounce: defaults.debounce,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

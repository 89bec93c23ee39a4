//! Layer attribute fields and their statistics state.

use serde::{Deserialize, Serialize};

/// Attribute field classification, used to decide which fields can
/// drive gradient styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numerical,
    Categorical,
}

/// Tri-state min/max statistics for a field.
///
/// Transitions only `Absent -> Loading -> Ready`. A failed fetch
/// reverts `Loading -> Absent` so the next compile can retry; a
/// `Ready` entry never reverts for the lifetime of its layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FieldStats {
    Absent,
    Loading,
    Ready { min: f64, max: f64 },
}

impl FieldStats {
    pub fn is_ready(&self) -> bool {
        matches!(self, FieldStats::Ready { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldStats::Loading)
    }
}

/// One attribute field of a layer, with its statistics state resolved
/// at compile time from the statistics cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default = "absent")]
    pub stats: FieldStats,
}

fn absent() -> FieldStats {
    FieldStats::Absent
}

impl LayerField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            stats: FieldStats::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_predicates() {
        assert!(!FieldStats::Absent.is_ready());
        assert!(FieldStats::Loading.is_loading());
        assert!(FieldStats::Ready { min: 0.0, max: 1.0 }.is_ready());
    }
}

//! Layer identity and descriptor types.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::field::LayerField;

/// Session-scoped, opaque unique identifier for a map layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerCode(pub String);

impl LayerCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a compound code like "HS-abc123:watersheds" into its
    /// workspace and layer parts.
    pub fn split(&self) -> (Option<&str>, &str) {
        match self.0.split_once(':') {
            Some((workspace, layer)) => (Some(workspace), layer),
            None => (None, self.0.as_str()),
        }
    }
}

impl std::fmt::Display for LayerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of layer kinds. All per-kind behavior dispatches through
/// exhaustive matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Point,
    Line,
    Polygon,
    Raster,
    Timeseries,
    Basemap,
}

impl LayerKind {
    /// Kinds whose styles compile to an SLD or vector artifact.
    pub fn is_stylable(&self) -> bool {
        !matches!(self, LayerKind::Basemap)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Point => "point",
            LayerKind::Line => "line",
            LayerKind::Polygon => "polygon",
            LayerKind::Raster => "raster",
            LayerKind::Timeseries => "timeseries",
            LayerKind::Basemap => "basemap",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the discovery list knows about an aggregation before it
/// becomes a registered map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Unique identifier within the session.
    pub code: LayerCode,
    pub kind: LayerKind,
    /// Initial display name.
    pub name: String,
    /// Remote layer identifier used in WMS requests; not owned here.
    pub source_ref: String,
    /// Owning HydroShare resource.
    pub resource_id: String,
    /// Ordered attribute fields.
    pub fields: Vec<LayerField>,
    /// Geographic extent, immutable once set.
    pub extent: BoundingBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_code_split() {
        let code = LayerCode::new("HS-abc123:watersheds");
        assert_eq!(code.split(), (Some("HS-abc123"), "watersheds"));

        let plain = LayerCode::new("watersheds");
        assert_eq!(plain.split(), (None, "watersheds"));
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&LayerKind::Timeseries).unwrap();
        assert_eq!(json, "\"timeseries\"");
        let kind: LayerKind = serde_json::from_str("\"polygon\"").unwrap();
        assert_eq!(kind, LayerKind::Polygon);
    }
}

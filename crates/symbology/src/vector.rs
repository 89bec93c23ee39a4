//! Client-side point style for timeseries layers.
//!
//! Timeseries layers are rendered from fetched observations rather
//! than through WMS, so their style is a plain record the map bridge
//! applies directly instead of an SLD document.

use serde::{Deserialize, Serialize};

use crate::model::{MarkerShape, PointSymbology};

/// Resolved point style for a client-rendered vector source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPointStyle {
    pub shape: MarkerShape,
    /// Fill color as "#RRGGBB".
    pub fill_color: String,
    pub fill_opacity: f64,
    /// Marker radius in pixels (half the symbology's marker size).
    pub radius: f64,
    pub stroke_color: String,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
}

impl VectorPointStyle {
    pub fn from_point(sym: &PointSymbology) -> Self {
        Self {
            shape: sym.fill_shape,
            fill_color: sym.fill_color.to_hex(),
            fill_opacity: sym.fill_opacity,
            radius: sym.fill_size / 2.0,
            stroke_color: sym.stroke_color.to_hex(),
            stroke_opacity: sym.stroke_opacity,
            stroke_width: sym.stroke_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_SWATCHES, Symbology};
    use viewer_common::LayerKind;

    #[test]
    fn test_radius_is_half_marker_size() {
        let sym = Symbology::default_for(LayerKind::Timeseries, &[], DEFAULT_SWATCHES[3]);
        let point = match sym {
            Symbology::Point(p) => p,
            other => panic!("unexpected symbology: {:?}", other),
        };
        let style = VectorPointStyle::from_point(&point);
        assert_eq!(style.radius, point.fill_size / 2.0);
        assert_eq!(style.fill_color, DEFAULT_SWATCHES[3].to_hex());
    }
}

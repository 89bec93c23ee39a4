//! Per-layer-kind symbology records and their defaults.

use serde::{Deserialize, Serialize};
use viewer_common::{Color, FieldKind, LayerField, LayerKind};

/// How a paint channel (fill or stroke) derives its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    /// A single literal color.
    Simple,
    /// Color interpolated from a numeric field through a colormap.
    Gradient,
}

/// Well-known point marker shapes (SLD `WellKnownName` values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
}

impl MarkerShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerShape::Circle => "circle",
            MarkerShape::Square => "square",
            MarkerShape::Triangle => "triangle",
        }
    }
}

/// Feature label configuration shared by all vector kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Attribute field to label with, or `None` for no labels.
    pub field: Option<String>,
    pub color: Color,
    pub opacity: f64,
    pub size: f64,
    pub font: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            field: None,
            color: Color::new(0, 0, 0),
            opacity: 1.0,
            size: 12.0,
            font: "SansSerif".to_string(),
        }
    }
}

/// Symbology for point and timeseries layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSymbology {
    pub fill_mode: PaintMode,
    pub fill_shape: MarkerShape,
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub fill_size: f64,
    /// Field driving gradient fill; required when `fill_mode` is gradient.
    pub fill_field: Option<String>,
    /// Colormap name for gradient fill.
    pub fill_gradient: String,
    pub stroke_color: Color,
    pub stroke_opacity: f64,
    pub stroke_size: f64,
    pub label: LabelStyle,
}

/// Symbology for line layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSymbology {
    pub stroke_mode: PaintMode,
    pub stroke_color: Color,
    pub stroke_opacity: f64,
    pub stroke_size: f64,
    pub stroke_field: Option<String>,
    pub stroke_gradient: String,
    pub label: LabelStyle,
}

/// Symbology for polygon layers: point's fill plus line's stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSymbology {
    pub fill_mode: PaintMode,
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub fill_field: Option<String>,
    pub fill_gradient: String,
    pub stroke_color: Color,
    pub stroke_opacity: f64,
    pub stroke_size: f64,
    pub label: LabelStyle,
}

/// Symbology for raster layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSymbology {
    pub fill_mode: PaintMode,
    pub fill_gradient: String,
    pub fill_opacity: f64,
}

/// Closed symbology variant, keyed by layer kind. Timeseries layers
/// share the point record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Symbology {
    Point(PointSymbology),
    Line(LineSymbology),
    Polygon(PolygonSymbology),
    Raster(RasterSymbology),
    Basemap { style: String },
}

/// Default swatch palette rotated through at layer-add time so newly
/// added layers are visually distinct without user input.
pub const DEFAULT_SWATCHES: [Color; 32] = [
    Color::new(0xF4, 0xCC, 0xCC),
    Color::new(0xFC, 0xE5, 0xCD),
    Color::new(0xFF, 0xF2, 0xCC),
    Color::new(0xD9, 0xEA, 0xD3),
    Color::new(0xD0, 0xE0, 0xE3),
    Color::new(0xCF, 0xE2, 0xF3),
    Color::new(0xD9, 0xD2, 0xE9),
    Color::new(0xEA, 0xD1, 0xDC),
    Color::new(0xEA, 0x99, 0x99),
    Color::new(0xF9, 0xCB, 0x9C),
    Color::new(0xFF, 0xE5, 0x99),
    Color::new(0xB6, 0xD7, 0xA8),
    Color::new(0xA2, 0xC4, 0xC9),
    Color::new(0x9F, 0xC5, 0xE8),
    Color::new(0xB4, 0xA7, 0xD6),
    Color::new(0xD5, 0xA6, 0xBD),
    Color::new(0xE0, 0x66, 0x66),
    Color::new(0xF6, 0xB2, 0x6B),
    Color::new(0xFF, 0xD9, 0x66),
    Color::new(0x93, 0xC4, 0x7D),
    Color::new(0x76, 0xA5, 0xAF),
    Color::new(0x6F, 0xA8, 0xDC),
    Color::new(0x8E, 0x7C, 0xC3),
    Color::new(0xC2, 0x7B, 0xA0),
    Color::new(0xCC, 0x00, 0x00),
    Color::new(0xE6, 0x91, 0x38),
    Color::new(0xF1, 0xC2, 0x32),
    Color::new(0x6A, 0xA8, 0x4F),
    Color::new(0x45, 0x81, 0x8E),
    Color::new(0x3D, 0x85, 0xC6),
    Color::new(0x67, 0x4E, 0xA7),
    Color::new(0xA6, 0x4D, 0x79),
];

const BLACK: Color = Color::new(0, 0, 0);

impl Symbology {
    /// Default symbology for a newly added layer. `swatch` comes from
    /// the registry's rotating palette cursor; gradient fields default
    /// to the first numerical field of the layer.
    pub fn default_for(kind: LayerKind, fields: &[LayerField], swatch: Color) -> Symbology {
        let first_numerical = fields
            .iter()
            .find(|f| f.kind == FieldKind::Numerical)
            .map(|f| f.name.clone());

        match kind {
            LayerKind::Point | LayerKind::Timeseries => Symbology::Point(PointSymbology {
                fill_mode: PaintMode::Simple,
                fill_shape: MarkerShape::Circle,
                fill_color: swatch,
                fill_opacity: 1.0,
                fill_size: 10.0,
                fill_field: first_numerical,
                fill_gradient: "gray".to_string(),
                stroke_color: BLACK,
                stroke_opacity: 1.0,
                stroke_size: 1.0,
                label: LabelStyle::default(),
            }),
            LayerKind::Line => Symbology::Line(LineSymbology {
                stroke_mode: PaintMode::Simple,
                stroke_color: swatch,
                stroke_opacity: 1.0,
                stroke_size: 1.0,
                stroke_field: first_numerical,
                stroke_gradient: "gray".to_string(),
                label: LabelStyle::default(),
            }),
            LayerKind::Polygon => Symbology::Polygon(PolygonSymbology {
                fill_mode: PaintMode::Simple,
                fill_color: swatch,
                fill_opacity: 1.0,
                fill_field: first_numerical,
                fill_gradient: "gray".to_string(),
                stroke_color: BLACK,
                stroke_opacity: 1.0,
                stroke_size: 1.0,
                label: LabelStyle::default(),
            }),
            LayerKind::Raster => Symbology::Raster(RasterSymbology {
                fill_mode: PaintMode::Gradient,
                fill_gradient: "gray".to_string(),
                fill_opacity: 1.0,
            }),
            LayerKind::Basemap => Symbology::Basemap {
                style: "voyager".to_string(),
            },
        }
    }

    /// Whether this symbology record is valid for the given layer kind.
    pub fn matches_kind(&self, kind: LayerKind) -> bool {
        matches!(
            (self, kind),
            (Symbology::Point(_), LayerKind::Point)
                | (Symbology::Point(_), LayerKind::Timeseries)
                | (Symbology::Line(_), LayerKind::Line)
                | (Symbology::Polygon(_), LayerKind::Polygon)
                | (Symbology::Raster(_), LayerKind::Raster)
                | (Symbology::Basemap { .. }, LayerKind::Basemap)
        )
    }

    /// Name of the record variant a layer kind expects.
    pub fn expected_for(kind: LayerKind) -> &'static str {
        match kind {
            LayerKind::Point | LayerKind::Timeseries => "point",
            LayerKind::Line => "line",
            LayerKind::Polygon => "polygon",
            LayerKind::Raster => "raster",
            LayerKind::Basemap => "basemap",
        }
    }

    /// The field a gradient channel is currently bound to, if any.
    pub fn gradient_field(&self) -> Option<&str> {
        match self {
            Symbology::Point(s) if s.fill_mode == PaintMode::Gradient => s.fill_field.as_deref(),
            Symbology::Line(s) if s.stroke_mode == PaintMode::Gradient => s.stroke_field.as_deref(),
            Symbology::Polygon(s) if s.fill_mode == PaintMode::Gradient => s.fill_field.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_common::FieldKind;

    fn fields() -> Vec<LayerField> {
        vec![
            LayerField::new("name", FieldKind::Categorical),
            LayerField::new("area", FieldKind::Numerical),
        ]
    }

    #[test]
    fn test_defaults_bind_first_numerical_field() {
        let swatch = DEFAULT_SWATCHES[0];
        let sym = Symbology::default_for(LayerKind::Polygon, &fields(), swatch);
        match sym {
            Symbology::Polygon(p) => {
                assert_eq!(p.fill_mode, PaintMode::Simple);
                assert_eq!(p.fill_field.as_deref(), Some("area"));
                assert_eq!(p.fill_color, swatch);
                assert_eq!(p.label.field, None);
            }
            other => panic!("unexpected symbology: {:?}", other),
        }
    }

    #[test]
    fn test_raster_defaults_to_gray_gradient() {
        let sym = Symbology::default_for(LayerKind::Raster, &[], DEFAULT_SWATCHES[0]);
        match sym {
            Symbology::Raster(r) => {
                assert_eq!(r.fill_mode, PaintMode::Gradient);
                assert_eq!(r.fill_gradient, "gray");
            }
            other => panic!("unexpected symbology: {:?}", other),
        }
    }

    #[test]
    fn test_kind_matching_is_exact() {
        let point = Symbology::default_for(LayerKind::Point, &[], DEFAULT_SWATCHES[0]);
        assert!(point.matches_kind(LayerKind::Point));
        assert!(point.matches_kind(LayerKind::Timeseries));
        assert!(!point.matches_kind(LayerKind::Polygon));
    }
}

//! Compilation of layer symbology into OGC SLD documents.
//!
//! The document shape follows what GeoServer accepts as an `SLD_BODY`
//! parameter: an SLD 1.0.0 envelope with one `NamedLayer` whose name is
//! the remote layer code, a main `FeatureTypeStyle` holding the styled
//! rule, an optional highlight `FeatureTypeStyle` when a feature is
//! selected, and an optional label `FeatureTypeStyle`.

use viewer_common::{ColorMap, FieldStats, LayerCode, LayerField, LayerKind, ViewerError};

use crate::escape::escape_xml;
use crate::model::{LabelStyle, PaintMode, PointSymbology, Symbology};
use crate::vector::VectorPointStyle;

/// Stroke color used for the selected-feature highlight rule.
const HIGHLIGHT_COLOR: &str = "#42E9F5";

/// Compiled style ready to be pushed to a rendering handle.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleArtifact {
    /// SLD document for WMS-backed layers.
    Sld(String),
    /// Client-side point style for timeseries layers.
    VectorPoint(VectorPointStyle),
}

/// Result of one compile call.
///
/// `pending_field` names a gradient field whose statistics are absent;
/// the caller is expected to issue the fetch and re-invoke compilation
/// once the statistics cache resolves. Compilation itself performs no
/// side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub artifact: StyleArtifact,
    pub pending_field: Option<String>,
}

impl CompileOutput {
    fn ready(artifact: StyleArtifact) -> Self {
        Self {
            artifact,
            pending_field: None,
        }
    }
}

/// Compile symbology into a style artifact.
///
/// Pure and deterministic: identical inputs produce byte-identical
/// output. The selection filter, when present, is a conjunction of
/// attribute equality tests for the selected feature; values are XML
/// escaped before embedding.
pub fn compile_style(
    code: &LayerCode,
    kind: LayerKind,
    symbology: &Symbology,
    fields: &[LayerField],
    selection: Option<&[(String, String)]>,
) -> Result<CompileOutput, ViewerError> {
    if !symbology.matches_kind(kind) {
        return Err(ViewerError::SymbologyMismatch {
            kind: kind.to_string(),
            expected: Symbology::expected_for(kind).to_string(),
        });
    }

    let output = match (kind, symbology) {
        (LayerKind::Timeseries, Symbology::Point(point)) => Ok(CompileOutput::ready(
            StyleArtifact::VectorPoint(VectorPointStyle::from_point(point)),
        )),
        (LayerKind::Point, Symbology::Point(point)) => compile_point(code, point, fields, selection),
        (LayerKind::Line, Symbology::Line(line)) => compile_line(code, line, fields, selection),
        (LayerKind::Polygon, Symbology::Polygon(polygon)) => {
            compile_polygon(code, polygon, fields, selection)
        }
        (LayerKind::Raster, Symbology::Raster(raster)) => compile_raster(code, raster, fields),
        (LayerKind::Basemap, _) => Err(ViewerError::UnsupportedLayerKind(kind.to_string())),
        // matches_kind already rejected every other pairing
        _ => Err(ViewerError::SymbologyMismatch {
            kind: kind.to_string(),
            expected: Symbology::expected_for(kind).to_string(),
        }),
    }?;

    if let Some(field) = &output.pending_field {
        tracing::debug!(layer = %code, field = %field, "style waiting on field statistics");
    }
    Ok(output)
}

// ---------------------------------------------------------------------------
// Per-kind rule builders
// ---------------------------------------------------------------------------

fn compile_point(
    code: &LayerCode,
    sym: &PointSymbology,
    fields: &[LayerField],
    selection: Option<&[(String, String)]>,
) -> Result<CompileOutput, ViewerError> {
    let (fill, pending) = match sym.fill_mode {
        PaintMode::Simple => (
            format!(
                "<CssParameter name=\"fill\">{}</CssParameter>\
                 <CssParameter name=\"fill-opacity\">{}</CssParameter>",
                sym.fill_color.to_hex(),
                fmt_num(sym.fill_opacity)
            ),
            None,
        ),
        PaintMode::Gradient => {
            match gradient_css("fill", sym.fill_field.as_deref(), &sym.fill_gradient, fields)? {
                GradientCss::Ready(css) => {
                    let opacity = format!(
                        "<CssParameter name=\"fill-opacity\">{}</CssParameter>",
                        fmt_num(sym.fill_opacity)
                    );
                    (format!("{}{}", css, opacity), None)
                }
                GradientCss::Pending(field) => {
                    return Ok(CompileOutput {
                        artifact: StyleArtifact::Sld(document(
                            code,
                            "",
                            &point_filter_rule(sym, selection),
                            &label_rule(&sym.label),
                        )),
                        pending_field: field,
                    });
                }
            }
        }
    };

    let rule = format!(
        "<Rule><PointSymbolizer><Graphic><Mark>\
         <WellKnownName>{shape}</WellKnownName>\
         <Fill>{fill}</Fill>\
         <Stroke>{stroke}</Stroke>\
         </Mark><Size>{size}</Size></Graphic></PointSymbolizer></Rule>",
        shape = sym.fill_shape.as_str(),
        fill = fill,
        stroke = stroke_css(&sym.stroke_color.to_hex(), sym.stroke_opacity, sym.stroke_size),
        size = fmt_num(sym.fill_size),
    );

    Ok(CompileOutput {
        artifact: StyleArtifact::Sld(document(
            code,
            &rule,
            &point_filter_rule(sym, selection),
            &label_rule(&sym.label),
        )),
        pending_field: pending,
    })
}

fn compile_line(
    code: &LayerCode,
    sym: &crate::model::LineSymbology,
    fields: &[LayerField],
    selection: Option<&[(String, String)]>,
) -> Result<CompileOutput, ViewerError> {
    let filter = filter_rule(
        selection,
        &format!(
            "<LineSymbolizer><Stroke>{}</Stroke></LineSymbolizer>",
            highlight_stroke_css(sym.stroke_size)
        ),
    );

    let (stroke_color_css, pending) = match sym.stroke_mode {
        PaintMode::Simple => (
            format!(
                "<CssParameter name=\"stroke\">{}</CssParameter>",
                sym.stroke_color.to_hex()
            ),
            None,
        ),
        PaintMode::Gradient => {
            match gradient_css(
                "stroke",
                sym.stroke_field.as_deref(),
                &sym.stroke_gradient,
                fields,
            )? {
                GradientCss::Ready(css) => (css, None),
                GradientCss::Pending(field) => {
                    return Ok(CompileOutput {
                        artifact: StyleArtifact::Sld(document(
                            code,
                            "",
                            &filter,
                            &label_rule(&sym.label),
                        )),
                        pending_field: field,
                    });
                }
            }
        }
    };

    let rule = format!(
        "<Rule><LineSymbolizer><Stroke>{color}\
         <CssParameter name=\"stroke-opacity\">{opacity}</CssParameter>\
         <CssParameter name=\"stroke-width\">{width}</CssParameter>\
         </Stroke></LineSymbolizer></Rule>",
        color = stroke_color_css,
        opacity = fmt_num(sym.stroke_opacity),
        width = fmt_num(sym.stroke_size),
    );

    Ok(CompileOutput {
        artifact: StyleArtifact::Sld(document(code, &rule, &filter, &label_rule(&sym.label))),
        pending_field: pending,
    })
}

fn compile_polygon(
    code: &LayerCode,
    sym: &crate::model::PolygonSymbology,
    fields: &[LayerField],
    selection: Option<&[(String, String)]>,
) -> Result<CompileOutput, ViewerError> {
    let filter = filter_rule(
        selection,
        &format!(
            "<PolygonSymbolizer><Stroke>{}</Stroke></PolygonSymbolizer>",
            highlight_stroke_css(sym.stroke_size)
        ),
    );

    let (fill, pending) = match sym.fill_mode {
        PaintMode::Simple => (
            format!(
                "<CssParameter name=\"fill\">{}</CssParameter>\
                 <CssParameter name=\"fill-opacity\">{}</CssParameter>",
                sym.fill_color.to_hex(),
                fmt_num(sym.fill_opacity)
            ),
            None,
        ),
        PaintMode::Gradient => {
            match gradient_css("fill", sym.fill_field.as_deref(), &sym.fill_gradient, fields)? {
                GradientCss::Ready(css) => {
                    let opacity = format!(
                        "<CssParameter name=\"fill-opacity\">{}</CssParameter>",
                        fmt_num(sym.fill_opacity)
                    );
                    (format!("{}{}", css, opacity), None)
                }
                GradientCss::Pending(field) => {
                    return Ok(CompileOutput {
                        artifact: StyleArtifact::Sld(document(
                            code,
                            "",
                            &filter,
                            &label_rule(&sym.label),
                        )),
                        pending_field: field,
                    });
                }
            }
        }
    };

    let rule = format!(
        "<Rule><PolygonSymbolizer>\
         <Fill>{fill}</Fill>\
         <Stroke>{stroke}</Stroke>\
         </PolygonSymbolizer></Rule>",
        fill = fill,
        stroke = stroke_css(&sym.stroke_color.to_hex(), sym.stroke_opacity, sym.stroke_size),
    );

    Ok(CompileOutput {
        artifact: StyleArtifact::Sld(document(code, &rule, &filter, &label_rule(&sym.label))),
        pending_field: pending,
    })
}

fn compile_raster(
    code: &LayerCode,
    sym: &crate::model::RasterSymbology,
    fields: &[LayerField],
) -> Result<CompileOutput, ViewerError> {
    // Rasters carry a single synthetic coverage field holding the
    // band statistics.
    let coverage = fields.first().ok_or_else(|| ViewerError::FieldNotFound {
        layer: code.to_string(),
        field: "coverage".to_string(),
    })?;

    let rule = match sym.fill_mode {
        // No colormap: let the server render the band with its default
        // palette, applying only the requested opacity.
        PaintMode::Simple => format!(
            "<Rule><RasterSymbolizer><Opacity>{}</Opacity></RasterSymbolizer></Rule>",
            fmt_num(sym.fill_opacity)
        ),
        PaintMode::Gradient => match coverage.stats {
            FieldStats::Ready { min, max } => {
                let cmap = ColorMap::named(&sym.fill_gradient)?;
                let entries: String = cmap
                    .scaled_stops(min, max)
                    .iter()
                    .map(|(quantity, color)| {
                        format!(
                            "<ColorMapEntry color=\"{}\" quantity=\"{}\" />",
                            color.to_hex(),
                            fmt_num(*quantity)
                        )
                    })
                    .collect();
                format!(
                    "<Rule><RasterSymbolizer><Opacity>{}</Opacity>\
                     <ColorMap>{}</ColorMap></RasterSymbolizer></Rule>",
                    fmt_num(sym.fill_opacity),
                    entries
                )
            }
            FieldStats::Absent => {
                return Ok(CompileOutput {
                    artifact: StyleArtifact::Sld(document(code, "", "", "")),
                    pending_field: Some(coverage.name.clone()),
                });
            }
            FieldStats::Loading => {
                return Ok(CompileOutput {
                    artifact: StyleArtifact::Sld(document(code, "", "", "")),
                    pending_field: None,
                });
            }
        },
    };

    Ok(CompileOutput::ready(StyleArtifact::Sld(document(
        code, &rule, "", "",
    ))))
}

// ---------------------------------------------------------------------------
// Shared fragments
// ---------------------------------------------------------------------------

enum GradientCss {
    Ready(String),
    /// Statistics not ready; `Some(field)` when the fetch still has to
    /// be requested, `None` while one is already in flight.
    Pending(Option<String>),
}

/// Build the `Interpolate` function CssParameter for a gradient paint
/// channel, or report the field whose statistics block compilation.
fn gradient_css(
    channel: &str,
    field: Option<&str>,
    gradient: &str,
    fields: &[LayerField],
) -> Result<GradientCss, ViewerError> {
    let field_name = field.ok_or_else(|| ViewerError::FieldNotFound {
        layer: "<gradient>".to_string(),
        field: "none".to_string(),
    })?;
    let field = fields
        .iter()
        .find(|f| f.name == field_name)
        .ok_or_else(|| ViewerError::FieldNotFound {
            layer: "<gradient>".to_string(),
            field: field_name.to_string(),
        })?;

    match field.stats {
        FieldStats::Ready { min, max } => {
            let cmap = ColorMap::named(gradient)?;
            let literals: String = cmap
                .scaled_stops(min, max)
                .iter()
                .map(|(position, color)| {
                    format!(
                        "<ogc:Literal>{}</ogc:Literal><ogc:Literal>{}</ogc:Literal>",
                        fmt_num(*position),
                        color.to_hex()
                    )
                })
                .collect();
            Ok(GradientCss::Ready(format!(
                "<CssParameter name=\"{channel}\">\
                 <ogc:Function name=\"Interpolate\">\
                 <ogc:PropertyName>{field}</ogc:PropertyName>\
                 {literals}\
                 <ogc:Literal>color</ogc:Literal>\
                 </ogc:Function></CssParameter>",
                channel = channel,
                field = escape_xml(&field.name),
                literals = literals,
            )))
        }
        FieldStats::Absent => Ok(GradientCss::Pending(Some(field.name.clone()))),
        FieldStats::Loading => Ok(GradientCss::Pending(None)),
    }
}

fn stroke_css(color: &str, opacity: f64, width: f64) -> String {
    format!(
        "<CssParameter name=\"stroke\">{}</CssParameter>\
         <CssParameter name=\"stroke-opacity\">{}</CssParameter>\
         <CssParameter name=\"stroke-width\">{}</CssParameter>",
        color,
        fmt_num(opacity),
        fmt_num(width)
    )
}

/// Highlight stroke: fixed color, two pixels wider than the layer's
/// own stroke so the selected feature reads through the main rule.
fn highlight_stroke_css(stroke_size: f64) -> String {
    format!(
        "<CssParameter name=\"stroke\">{}</CssParameter>\
         <CssParameter name=\"stroke-width\">{}</CssParameter>",
        HIGHLIGHT_COLOR,
        fmt_num(stroke_size + 2.0)
    )
}

fn point_filter_rule(sym: &PointSymbology, selection: Option<&[(String, String)]>) -> String {
    filter_rule(
        selection,
        &format!(
            "<PointSymbolizer><Graphic><Mark>\
             <WellKnownName>{shape}</WellKnownName>\
             <Stroke>{stroke}</Stroke>\
             </Mark><Size>{size}</Size></Graphic></PointSymbolizer>",
            shape = sym.fill_shape.as_str(),
            stroke = highlight_stroke_css(sym.stroke_size),
            size = fmt_num(sym.fill_size),
        ),
    )
}

/// The highlight `FeatureTypeStyle`: an equality-AND filter over the
/// selected feature's attribute pairs, empty values skipped upstream.
fn filter_rule(selection: Option<&[(String, String)]>, symbolizer: &str) -> String {
    let pairs = match selection {
        Some(pairs) if !pairs.is_empty() => pairs,
        _ => return String::new(),
    };

    let comparisons: String = pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "<ogc:PropertyIsEqualTo>\
                 <ogc:PropertyName>{}</ogc:PropertyName>\
                 <ogc:Literal>{}</ogc:Literal>\
                 </ogc:PropertyIsEqualTo>",
                escape_xml(name),
                escape_xml(value)
            )
        })
        .collect();

    format!(
        "<FeatureTypeStyle><Rule>\
         <ogc:Filter><ogc:And>{}</ogc:And></ogc:Filter>\
         {}\
         </Rule></FeatureTypeStyle>",
        comparisons, symbolizer
    )
}

/// The label `FeatureTypeStyle`, empty when no label field is set.
fn label_rule(label: &LabelStyle) -> String {
    let field = match &label.field {
        Some(field) => field,
        None => return String::new(),
    };

    format!(
        "<FeatureTypeStyle><Rule><TextSymbolizer>\
         <Label><ogc:PropertyName>{field}</ogc:PropertyName></Label>\
         <Font>\
         <CssParameter name=\"font-family\">{font}</CssParameter>\
         <CssParameter name=\"font-size\">{size}</CssParameter>\
         <CssParameter name=\"font-style\">normal</CssParameter>\
         <CssParameter name=\"font-weight\">bold</CssParameter>\
         </Font>\
         <Fill>\
         <CssParameter name=\"fill\">{color}</CssParameter>\
         <CssParameter name=\"fill-opacity\">{opacity}</CssParameter>\
         </Fill>\
         <LabelPlacement><PointPlacement><Displacement>\
         <DisplacementY>0</DisplacementY><DisplacementX>0</DisplacementX>\
         </Displacement></PointPlacement></LabelPlacement>\
         </TextSymbolizer></Rule></FeatureTypeStyle>",
        field = escape_xml(field),
        font = escape_xml(&label.font),
        size = fmt_num(label.size),
        color = label.color.to_hex(),
        opacity = fmt_num(label.opacity),
    )
}

/// Assemble the full SLD document around the compiled fragments.
fn document(code: &LayerCode, rules: &str, filter_fts: &str, label_fts: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
         <StyledLayerDescriptor version=\"1.0.0\" \
         xsi:schemaLocation=\"http://www.opengis.net/sld http://schemas.opengis.net/sld/1.0.0/StyledLayerDescriptor.xsd\" \
         xmlns=\"http://www.opengis.net/sld\" \
         xmlns:ogc=\"http://www.opengis.net/ogc\" \
         xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <NamedLayer><Name>{name}</Name><UserStyle>\
         <FeatureTypeStyle>{rules}</FeatureTypeStyle>\
         {filter}{label}\
         </UserStyle></NamedLayer></StyledLayerDescriptor>",
        name = escape_xml(code.as_str()),
        rules = rules,
        filter = filter_fts,
        label = label_fts,
    )
}

/// Format a number the way the style grammar expects: integral values
/// without a trailing fraction, everything else in shortest form.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

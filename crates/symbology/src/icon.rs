//! Inline SVG icons shown next to each layer row.
//!
//! The icon previews the layer's current symbology: a marker for
//! points, a stroked path for lines, a filled square for polygons, and
//! a gradient bar for gradient fills and rasters. Gradient definitions
//! need a document-unique id, derived from the layer code so two rows
//! never collide.

use viewer_common::{ColorMap, LayerCode, ViewerError};

use crate::model::{MarkerShape, PaintMode, Symbology};

/// Render the row icon for a layer's current symbology. Basemap rows
/// carry no icon.
pub fn row_icon(code: &LayerCode, symbology: &Symbology) -> Result<String, ViewerError> {
    match symbology {
        Symbology::Point(sym) => {
            let fill = match sym.fill_mode {
                PaintMode::Simple => sym.fill_color.to_hex(),
                PaintMode::Gradient => {
                    return gradient_icon(code, &sym.fill_gradient);
                }
            };
            let marker = match sym.fill_shape {
                MarkerShape::Circle => format!(
                    "<circle cx=\"12\" cy=\"12\" r=\"{r}\" fill=\"{fill}\" \
                     fill-opacity=\"{fo}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                    r = (sym.fill_size / 2.0).min(10.0),
                    fill = fill,
                    fo = sym.fill_opacity,
                    stroke = sym.stroke_color.to_hex(),
                    sw = sym.stroke_size,
                ),
                MarkerShape::Square => format!(
                    "<rect x=\"4\" y=\"4\" width=\"16\" height=\"16\" fill=\"{fill}\" \
                     fill-opacity=\"{fo}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                    fill = fill,
                    fo = sym.fill_opacity,
                    stroke = sym.stroke_color.to_hex(),
                    sw = sym.stroke_size,
                ),
                MarkerShape::Triangle => format!(
                    "<polygon points=\"12,3 21,20 3,20\" fill=\"{fill}\" \
                     fill-opacity=\"{fo}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                    fill = fill,
                    fo = sym.fill_opacity,
                    stroke = sym.stroke_color.to_hex(),
                    sw = sym.stroke_size,
                ),
            };
            Ok(svg(&marker))
        }
        Symbology::Line(sym) => match sym.stroke_mode {
            PaintMode::Simple => Ok(svg(&format!(
                "<polyline points=\"2,18 9,8 15,14 22,5\" fill=\"none\" \
                 stroke=\"{stroke}\" stroke-opacity=\"{so}\" stroke-width=\"{sw}\"/>",
                stroke = sym.stroke_color.to_hex(),
                so = sym.stroke_opacity,
                sw = sym.stroke_size.max(1.5),
            ))),
            PaintMode::Gradient => gradient_icon(code, &sym.stroke_gradient),
        },
        Symbology::Polygon(sym) => match sym.fill_mode {
            PaintMode::Simple => Ok(svg(&format!(
                "<rect x=\"3\" y=\"5\" width=\"18\" height=\"14\" fill=\"{fill}\" \
                 fill-opacity=\"{fo}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
                fill = sym.fill_color.to_hex(),
                fo = sym.fill_opacity,
                stroke = sym.stroke_color.to_hex(),
                sw = sym.stroke_size,
            ))),
            PaintMode::Gradient => gradient_icon(code, &sym.fill_gradient),
        },
        Symbology::Raster(sym) => gradient_icon(code, &sym.fill_gradient),
        Symbology::Basemap { .. } => Ok(String::new()),
    }
}

/// Gradient bar icon. The `<linearGradient>` id embeds the layer code
/// with separator characters replaced, keeping ids valid and unique
/// when many rows are in the same document.
fn gradient_icon(code: &LayerCode, colormap: &str) -> Result<String, ViewerError> {
    let cmap = ColorMap::named(colormap)?;
    let id = format!("grad-{}", sanitize_id(code.as_str()));
    let stops: String = cmap
        .stops
        .iter()
        .map(|stop| {
            format!(
                "<stop offset=\"{}%\" stop-color=\"{}\"/>",
                (stop.position * 100.0).round(),
                stop.color.to_hex()
            )
        })
        .collect();
    Ok(svg(&format!(
        "<defs><linearGradient id=\"{id}\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"0\">{stops}\
         </linearGradient></defs>\
         <rect x=\"2\" y=\"7\" width=\"20\" height=\"10\" fill=\"url(#{id})\"/>",
        id = id,
        stops = stops,
    )))
}

fn svg(body: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"24\" height=\"24\" \
         viewBox=\"0 0 24 24\">{}</svg>",
        body
    )
}

fn sanitize_id(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

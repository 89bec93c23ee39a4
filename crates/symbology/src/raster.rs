//! Per-pixel color transform for client-rendered rasters.
//!
//! When a raster is drawn on the client instead of through WMS, each
//! cell value is mapped through the layer's colormap scaled to the
//! band's min/max statistics. Values outside the range clamp to the
//! end stops.

use viewer_common::{Color, ColorMap, ViewerError};

/// A colormap scaled onto a value range.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTransform {
    stops: Vec<(f64, Color)>,
}

impl RasterTransform {
    /// Scale the named colormap onto `[min, max]`. A degenerate range
    /// (min == max) is allowed and maps every value to the first stop.
    pub fn new(colormap: &str, min: f64, max: f64) -> Result<Self, ViewerError> {
        let cmap = ColorMap::named(colormap)?;
        Ok(Self {
            stops: cmap.scaled_stops(min, max),
        })
    }

    /// Color for one cell value, linearly interpolated between the two
    /// bracketing stops. Out-of-range values clamp.
    pub fn color_at(&self, value: f64) -> Color {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let (lo_q, lo_c) = pair[0];
            let (hi_q, hi_c) = pair[1];
            if value <= hi_q {
                let span = hi_q - lo_q;
                if span == 0.0 {
                    return lo_c;
                }
                return lo_c.lerp(&hi_c, (value - lo_q) / span);
            }
        }
        last.1
    }
}

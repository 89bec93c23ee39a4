//! Named gradient catalog used for raster and attribute styling.
//!
//! The catalog is a fixed, closed set of colormaps. Each colormap is an
//! ordered list of stops at normalized positions in [0, 1], with the
//! first stop at 0 and the last at 1. Requesting a name outside the
//! catalog is a configuration error.

use crate::color::Color;
use crate::error::ViewerError;

/// A single gradient stop at a normalized position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Normalized position in [0, 1], ascending within a colormap.
    pub position: f64,
    pub color: Color,
}

/// A named gradient definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: &'static str,
    pub stops: Vec<ColorStop>,
}

/// Names of every colormap in the catalog, in display order.
pub const COLORMAP_NAMES: &[&str] = &[
    "gray",
    "rainbow",
    "viridis",
    "jet",
    "hot",
    "cool",
    "magma",
    "plasma",
    "spring",
    "electric",
    "blackbody",
    "summer",
    "autumn",
    "winter",
    "bone",
];

// (normalized position, hex color) definitions. Hex literals are
// compile-time constants of the catalog, so parsing them cannot fail
// at runtime; `named` still propagates errors rather than panicking.
const GRAY: &[(f64, &str)] = &[(0.0, "#000000"), (1.0, "#FFFFFF")];
const RAINBOW: &[(f64, &str)] = &[
    (0.0, "#96005A"),
    (0.125, "#0000C8"),
    (0.25, "#0019FF"),
    (0.375, "#0098FF"),
    (0.5, "#2CFF96"),
    (0.625, "#97FF00"),
    (0.75, "#FFEA00"),
    (0.875, "#FF6F00"),
    (1.0, "#FF0000"),
];
const VIRIDIS: &[(f64, &str)] = &[
    (0.0, "#4401FF"),
    (0.125, "#472C7A"),
    (0.25, "#3B518B"),
    (0.375, "#2C718E"),
    (0.5, "#21908D"),
    (0.625, "#27AD81"),
    (0.75, "#5CC863"),
    (0.875, "#AADC32"),
    (1.0, "#FDE725"),
];
const JET: &[(f64, &str)] = &[
    (0.0, "#000083"),
    (0.125, "#003CAA"),
    (0.375, "#05FFFF"),
    (0.625, "#FFFF00"),
    (0.875, "#FF0000"),
    (1.0, "#800000"),
];
const HOT: &[(f64, &str)] = &[
    (0.0, "#000000"),
    (0.333, "#E60000"),
    (0.666, "#FFD200"),
    (1.0, "#FFFFFF"),
];
const COOL: &[(f64, &str)] = &[(0.0, "#00FFFF"), (1.0, "#FF00FF")];
const MAGMA: &[(f64, &str)] = &[
    (0.0, "#000004"),
    (0.125, "#1C1044"),
    (0.25, "#4F127B"),
    (0.375, "#812581"),
    (0.5, "#B5367A"),
    (0.625, "#E55064"),
    (0.75, "#FB8761"),
    (0.875, "#FEC287"),
    (1.0, "#FCFDBF"),
];
const PLASMA: &[(f64, &str)] = &[
    (0.0, "#0D0887"),
    (0.125, "#4B03A1"),
    (0.25, "#7D03A8"),
    (0.375, "#A82296"),
    (0.5, "#CB4679"),
    (0.625, "#E56B5D"),
    (0.75, "#F89441"),
    (0.875, "#FDC328"),
    (1.0, "#F0F921"),
];
const SPRING: &[(f64, &str)] = &[(0.0, "#FF00FF"), (1.0, "#FFFF00")];
const ELECTRIC: &[(f64, &str)] = &[
    (0.0, "#000000"),
    (0.15, "#1E0064"),
    (0.4, "#780064"),
    (0.6, "#A05A00"),
    (0.8, "#E6C800"),
    (1.0, "#FFFADC"),
];
const BLACKBODY: &[(f64, &str)] = &[
    (0.0, "#000000"),
    (0.2, "#E60000"),
    (0.4, "#E6D200"),
    (0.7, "#FFFFFF"),
    (1.0, "#A0C8FF"),
];
const SUMMER: &[(f64, &str)] = &[(0.0, "#008066"), (1.0, "#FFFF66")];
const AUTUMN: &[(f64, &str)] = &[(0.0, "#FF0000"), (1.0, "#FFFF00")];
const WINTER: &[(f64, &str)] = &[(0.0, "#0000FF"), (1.0, "#00FF80")];
const BONE: &[(f64, &str)] = &[
    (0.0, "#000000"),
    (0.376, "#545474"),
    (0.753, "#A9C8C8"),
    (1.0, "#FFFFFF"),
];

impl ColorMap {
    /// Look up a colormap by name. Unknown names are a configuration
    /// error (never defaulted to another gradient).
    pub fn named(name: &str) -> Result<ColorMap, ViewerError> {
        let (name, stops) = match name {
            "gray" => ("gray", GRAY),
            "rainbow" => ("rainbow", RAINBOW),
            "viridis" => ("viridis", VIRIDIS),
            "jet" => ("jet", JET),
            "hot" => ("hot", HOT),
            "cool" => ("cool", COOL),
            "magma" => ("magma", MAGMA),
            "plasma" => ("plasma", PLASMA),
            "spring" => ("spring", SPRING),
            "electric" => ("electric", ELECTRIC),
            "blackbody" => ("blackbody", BLACKBODY),
            "summer" => ("summer", SUMMER),
            "autumn" => ("autumn", AUTUMN),
            "winter" => ("winter", WINTER),
            "bone" => ("bone", BONE),
            other => return Err(ViewerError::UnknownColorMap(other.to_string())),
        };
        let stops = stops
            .iter()
            .map(|(position, hex)| {
                Ok(ColorStop {
                    position: *position,
                    color: Color::from_hex(hex)?,
                })
            })
            .collect::<Result<Vec<_>, ViewerError>>()?;
        Ok(ColorMap { name, stops })
    }

    /// Map normalized stop positions into value space:
    /// `min + position * (max - min)`.
    pub fn scaled_stops(&self, min: f64, max: f64) -> Vec<(f64, Color)> {
        self.stops
            .iter()
            .map(|stop| (min + stop.position * (max - min), stop.color))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_name_resolves() {
        for name in COLORMAP_NAMES {
            let cmap = ColorMap::named(name).unwrap();
            assert_eq!(cmap.name, *name);
            assert!(cmap.stops.len() >= 2, "{} has too few stops", name);
            assert_eq!(cmap.stops.first().unwrap().position, 0.0);
            assert_eq!(cmap.stops.last().unwrap().position, 1.0);
            for pair in cmap.stops.windows(2) {
                assert!(pair[0].position < pair[1].position);
            }
        }
    }

    #[test]
    fn test_unknown_name_is_error() {
        let err = ColorMap::named("inferno").unwrap_err();
        assert!(matches!(err, ViewerError::UnknownColorMap(_)));
    }

    #[test]
    fn test_scaled_stops() {
        let cmap = ColorMap::named("gray").unwrap();
        let scaled = cmap.scaled_stops(10.0, 30.0);
        assert_eq!(scaled[0].0, 10.0);
        assert_eq!(scaled[1].0, 30.0);

        let viridis = ColorMap::named("viridis").unwrap();
        let scaled = viridis.scaled_stops(0.0, 1000.0);
        assert_eq!(scaled.len(), 9);
        assert_eq!(scaled[1].0, 125.0);
        assert_eq!(scaled[4].0, 500.0);
    }
}

//! Layer symbology model and style compiler.
//!
//! Compiles per-layer symbology into the artifact the renderer needs:
//! OGC SLD documents for WMS-backed vector and raster layers, a
//! client-side point style for timeseries layers, and per-pixel color
//! transforms for client-rendered rasters. Compilation is pure: the
//! same inputs always produce the same output, and any required side
//! effect (a statistics fetch) is reported back to the caller instead
//! of performed here.

pub mod escape;
pub mod icon;
pub mod model;
pub mod raster;
pub mod sld;
pub mod vector;

pub use escape::escape_xml;
pub use icon::row_icon;
pub use model::{
    LabelStyle, LineSymbology, MarkerShape, PaintMode, PointSymbology, PolygonSymbology,
    RasterSymbology, Symbology, DEFAULT_SWATCHES,
};
pub use raster::RasterTransform;
pub use sld::{compile_style, CompileOutput, StyleArtifact};
pub use vector::VectorPointStyle;

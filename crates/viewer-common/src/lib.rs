//! Common types shared across the map viewer core.

pub mod bbox;
pub mod color;
pub mod colormap;
pub mod error;
pub mod field;
pub mod layer;

pub use bbox::BoundingBox;
pub use color::Color;
pub use colormap::{ColorMap, ColorStop};
pub use error::{ViewerError, ViewerResult};
pub use field::{FieldKind, FieldStats, LayerField};
pub use layer::{LayerCode, LayerDescriptor, LayerKind};

//! Observer seam between the workspace and the actual map.
//!
//! The workspace never talks to a rendering library directly; it calls
//! through this trait so the map integration (and tests) can be
//! swapped without touching registry logic.

use symbology::StyleArtifact;
use viewer_common::LayerCode;

/// Rendering-side operations the workspace drives.
pub trait MapBridge {
    /// A layer was registered. `style` is `None` for kinds with no
    /// compiled style (basemaps).
    fn attach_layer(&mut self, code: &LayerCode, source_ref: &str, style: Option<&StyleArtifact>);

    /// A layer's compiled style changed.
    fn update_style(&mut self, code: &LayerCode, style: &StyleArtifact);

    fn set_visible(&mut self, code: &LayerCode, visible: bool);

    fn set_z_index(&mut self, code: &LayerCode, z_index: i32);

    /// A layer was removed; release its rendering handle.
    fn detach_layer(&mut self, code: &LayerCode);

    /// The workspace-list row icon for a layer changed.
    fn set_row_icon(&mut self, code: &LayerCode, icon_svg: &str);
}

/// Bridge that ignores every call. Useful headless.
#[derive(Debug, Default)]
pub struct NoopBridge;

impl MapBridge for NoopBridge {
    fn attach_layer(&mut self, _: &LayerCode, _: &str, _: Option<&StyleArtifact>) {}
    fn update_style(&mut self, _: &LayerCode, _: &StyleArtifact) {}
    fn set_visible(&mut self, _: &LayerCode, _: bool) {}
    fn set_z_index(&mut self, _: &LayerCode, _: i32) {}
    fn detach_layer(&mut self, _: &LayerCode) {}
    fn set_row_icon(&mut self, _: &LayerCode, _: &str) {}
}

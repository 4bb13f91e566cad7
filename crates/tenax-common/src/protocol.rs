use serde::{Deserialize, Serialize};

/// Rendered geometry of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// A pointer action can only land on a box with strictly positive area.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// One row of an overlay census: stacking-order and visibility data for an
/// element matched by an Overlay signature.
///
/// The handle identifies the element for follow-up detach/hide calls and
/// stays valid until the element is detached or the document navigates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayInfo {
    pub handle: u64,
    /// Stacking order from the element's inline style, if it parses.
    #[serde(default)]
    pub inline_z: Option<i64>,
    /// Stacking order from computed style, if it parses.
    #[serde(default)]
    pub computed_z: Option<i64>,
    /// Whether computed style currently shows the element.
    pub visible: bool,
}

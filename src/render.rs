//! View models for the host's drawing layer.
//!
//! The engine never draws; it produces plain data describing what the
//! shape looks like right now, in screen coordinates. The host applies a
//! [`RectView`] to whatever rendering technology it uses. Building a view
//! is pure and cheap, so the host can rebuild on every move event.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::consts::{HANDLE_RADIUS_PX, TEXT_ANCHOR_OFFSET_X, TEXT_ANCHOR_OFFSET_Y};
use crate::record::{AnnotationId, AnnotationRecord};
use crate::scale::{Point, Scale};

/// Everything the host needs to draw one rectangle annotation.
///
/// All coordinates are screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RectView {
    pub id: AnnotationId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Center of the circular move/resize handle.
    pub handle: Point,
    pub handle_radius: f64,
    /// Anchor of the text label above the box.
    pub label: Point,
    pub text: Option<String>,
    pub color: Option<String>,
    pub selected: bool,
    pub highlighted: bool,
    pub read_only: bool,
}

/// Label anchor in document space: a fixed offset above the top-left
/// corner.
pub(crate) fn label_anchor(x: f64, y: f64) -> Point {
    Point::new(x + TEXT_ANCHOR_OFFSET_X, y - TEXT_ANCHOR_OFFSET_Y)
}

/// Project a record plus its visual flags into screen space.
#[must_use]
pub fn rect_view(record: &AnnotationRecord, selected: bool, highlighted: bool, scale: Scale) -> RectView {
    let origin = scale.to_screen_space(Point::new(record.x, record.y));
    let extent = scale.to_screen_space(Point::new(record.width, record.height));
    let label = scale.to_screen_space(label_anchor(record.x, record.y));
    RectView {
        // Records straight out of storage may lack an id; a nil id still
        // draws but cannot be addressed by the host.
        id: record.id.unwrap_or_else(AnnotationId::nil),
        x: origin.x,
        y: origin.y,
        width: extent.x,
        height: extent.y,
        handle: origin,
        handle_radius: HANDLE_RADIUS_PX,
        label,
        text: record.text.clone(),
        color: record.color.clone(),
        selected,
        highlighted,
        read_only: record.read_only,
    }
}

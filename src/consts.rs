//! Shared numeric constants for the overlay crate.

// ── Label placement ─────────────────────────────────────────────

/// Horizontal offset from the rectangle's left edge to its label anchor,
/// in document units.
pub const TEXT_ANCHOR_OFFSET_X: f64 = 7.0;

/// Vertical offset from the rectangle's top edge up to its label anchor,
/// in document units.
pub const TEXT_ANCHOR_OFFSET_Y: f64 = 20.0;

// ── Handles ─────────────────────────────────────────────────────

/// Radius of the circular move/resize handle in screen pixels.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

#[cfg(test)]
#[path = "scale_test.rs"]
mod scale_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport scale injected by the host's scale utility.
///
/// `factor` is screen pixels per document unit (1.0 = no zoom). The overlay
/// never computes this itself; the host updates it when the page zoom
/// changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub factor: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl Scale {
    #[must_use]
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// Convert a screen-space delta (pixels) to a document-space delta.
    #[must_use]
    pub fn to_document_space(&self, screen: Point) -> Point {
        let f = self.effective_factor();
        Point { x: screen.x / f, y: screen.y / f }
    }

    /// Convert a document-space point to screen coordinates (pixels).
    #[must_use]
    pub fn to_screen_space(&self, doc: Point) -> Point {
        let f = self.effective_factor();
        Point { x: doc.x * f, y: doc.y * f }
    }

    /// The factor actually used for conversion. A missing or broken scale
    /// value (zero, negative, NaN, infinite) degrades to identity so a drag
    /// never produces NaN geometry.
    fn effective_factor(&self) -> f64 {
        if self.factor.is_finite() && self.factor > 0.0 {
            self.factor
        } else {
            log::warn!("invalid scale factor {}, using 1.0", self.factor);
            1.0
        }
    }
}

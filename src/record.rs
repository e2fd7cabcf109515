//! Persisted annotation records: the wire format shared with storage.
//!
//! A record is what the host's persistence layer reads and writes. It is
//! deliberately tolerant on the way in (missing ids, missing numerics, the
//! legacy `readyOnly` field name) and canonical on the way out.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an annotation.
pub type AnnotationId = Uuid;

/// The kind of an annotation, stored as a lowercase tag so records can live
/// in a polymorphic collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Rectangular region highlight.
    #[default]
    Area,
}

/// A rectangular annotation as stored on disk and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Stable unique identifier. Stored data may lack one; hydration
    /// generates it.
    #[serde(default)]
    pub id: Option<AnnotationId>,
    /// Annotation kind tag.
    #[serde(default)]
    pub kind: AnnotationKind,
    /// Left edge in document coordinate space.
    #[serde(default)]
    pub x: f64,
    /// Top edge in document coordinate space.
    #[serde(default)]
    pub y: f64,
    /// Extent in document coordinate space.
    #[serde(default)]
    pub width: f64,
    /// Extent in document coordinate space.
    #[serde(default)]
    pub height: f64,
    /// Label text owned by the paired text sub-object, persisted together.
    #[serde(default)]
    pub text: Option<String>,
    /// Display color tag.
    #[serde(default)]
    pub color: Option<String>,
    /// Suppresses all pointer interaction when true.
    ///
    /// `readOnly` is the canonical stored name. The `readyOnly` alias
    /// accepts records written by an old serializer; it is never written
    /// back, so stored data migrates forward on the next save.
    #[serde(default, rename = "readOnly", alias = "readyOnly")]
    pub read_only: bool,
}

impl Default for AnnotationRecord {
    fn default() -> Self {
        Self {
            id: None,
            kind: AnnotationKind::Area,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            text: None,
            color: None,
            read_only: false,
        }
    }
}

impl AnnotationRecord {
    /// Clamp geometry to the invariants hydration relies on: finite
    /// coordinates and non-negative extents.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for v in [&mut self.x, &mut self.y] {
            if !v.is_finite() {
                log::warn!("dropping non-finite coordinate {v} in stored annotation");
                *v = 0.0;
            }
        }
        for v in [&mut self.width, &mut self.height] {
            if !v.is_finite() || *v < 0.0 {
                log::warn!("clamping invalid extent {v} in stored annotation");
                *v = 0.0;
            }
        }
        self
    }
}

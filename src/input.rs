//! Input model: the drag gesture state machine and hover targets.
//!
//! [`DragState`] is the active gesture tracked between pointer-down and
//! pointer-up. Each variant carries the context needed to compute deltas
//! and commit on release; transient drag fields live nowhere else and are
//! cleared by returning to `Idle`.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::scale::Point;

/// Which part of the shape a hover event targets. The circle handle has
/// affordances the body does not, so hovering it is reported separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Shape,
    Handle,
}

/// The drag-to-move state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer-down seen, no move yet. A pointer-up from here is a click,
    /// not a move: nothing is persisted.
    Armed {
        /// Document-space position of the shape at drag start.
        origin: Point,
    },
    /// At least one pointer-move processed.
    Moving {
        /// Document-space position of the shape at drag start.
        origin: Point,
        /// Screen position captured lazily on the first move. The
        /// pointer-down position is not used because the handle may be
        /// grabbed before any move occurs.
        start_screen: Point,
        /// Screen position of the most recent move.
        last_screen: Point,
    },
}

impl DragState {
    /// Whether a drag session is live (document listeners attached).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether at least one move has been processed.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Moving { .. })
    }

    /// The drag origin, when a session is live.
    #[must_use]
    pub fn origin(&self) -> Option<Point> {
        match self {
            Self::Idle => None,
            Self::Armed { origin } | Self::Moving { origin, .. } => Some(*origin),
        }
    }
}

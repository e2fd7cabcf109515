//! Shared annotation behavior: capability traits, the base state they hang
//! off, and the effect values handlers return.
//!
//! Annotation variants do not inherit from a base class; each references a
//! [`BaseBehavior`] value for the state every variant shares (selection,
//! highlight, render bookkeeping, teardown) and implements the
//! [`Annotation`] interface the generic collection consumes.

use serde::Serialize;

use crate::bus::BusEvent;
use crate::record::{AnnotationId, AnnotationKind, AnnotationRecord};

/// A consequence of a state transition, for the wiring layer and the host
/// to process.
///
/// Handlers never touch the bus, the store, or the DOM directly; they
/// return effects in order. `Publish`, `Save`, `SelectText` and
/// `DeselectText` are consumed by the annotation's own wiring; the rest are
/// host actions, handed to the platform binding layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Effect {
    /// Publish an event on the injected bus.
    Publish(BusEvent),
    /// Persist the annotation's current record.
    Save,
    /// Select the paired text sub-object (enables its edit affordance).
    SelectText,
    /// Deselect the paired text sub-object.
    DeselectText,
    /// The shape's visual state changed; the host should redraw it.
    RenderNeeded,
    /// Attach document-level pointer-move/up listeners for a drag session.
    BindDragListeners,
    /// Detach the document-level drag listeners.
    UnbindDragListeners,
    /// Suppress page-wide text selection while dragging.
    DisablePageTextSelection,
    /// Restore page-wide text selection.
    EnablePageTextSelection,
    /// Attach click/pointer-down handlers to the shape and its handle.
    BindInteractionHandlers,
    /// Detach the click/pointer-down handlers.
    UnbindInteractionHandlers,
    /// Remove the annotation's visual node from the page.
    Detach,
}

/// Selection state toggled by clicks and mirrored from the text label.
pub trait Selectable {
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
}

/// Hover highlight state.
pub trait Hoverable {
    fn is_highlighted(&self) -> bool;
    fn highlight(&mut self);
    fn dehighlight(&mut self);
}

/// Render bookkeeping: re-rendering is idempotent, so the flag only tells
/// the host something changed since it last drew.
pub trait Renderable {
    fn needs_render(&self) -> bool;
    fn mark_rendered(&mut self);
}

/// State shared by every annotation variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseBehavior {
    selected: bool,
    highlighted: bool,
    dirty: bool,
    destroyed: bool,
}

impl BaseBehavior {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Flag the instance destroyed. Returns false when it already was, so
    /// teardown runs at most once.
    pub fn mark_destroyed(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        true
    }
}

impl Selectable for BaseBehavior {
    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

impl Hoverable for BaseBehavior {
    fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn highlight(&mut self) {
        self.highlighted = true;
    }

    fn dehighlight(&mut self) {
        self.highlighted = false;
    }
}

impl Renderable for BaseBehavior {
    fn needs_render(&self) -> bool {
        self.dirty
    }

    fn mark_rendered(&mut self) {
        self.dirty = false;
    }
}

/// Common interface over annotation variants, consumed by the generic
/// collection and the wasm shell.
pub trait Annotation {
    fn id(&self) -> AnnotationId;
    fn kind(&self) -> AnnotationKind;
    fn to_record(&self) -> AnnotationRecord;
    fn is_selected(&self) -> bool;
    fn is_destroyed(&self) -> bool;
    /// Tear the instance down: detach from the page, release bus
    /// subscriptions, destroy sub-objects. Idempotent.
    fn destroy(&mut self);
    /// Drain host actions queued by bus-driven transitions.
    fn take_effects(&mut self) -> Vec<Effect>;
}

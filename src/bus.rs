//! Injected publish/subscribe event bus.
//!
//! Every annotation receives a clone of the same [`EventBus`] at
//! construction; there is no process-global state. Subscriptions are RAII
//! handles: dropping a [`Subscription`] detaches its handler, and an
//! instance drops all of its handles together when it is destroyed.
//!
//! Dispatch works on a snapshot of the topic's subscriber list, so handlers
//! may unsubscribe (including themselves) and publish other topics while a
//! publish is in flight. A handler that is re-entered while already running
//! is skipped and logged rather than panicking on the borrow.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::record::{AnnotationId, AnnotationRecord};

/// An event carried on the bus, with its payload.
///
/// Wire names match the host protocol: the serialized `topic` tag is the
/// name the host subscribes to from JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "payload", rename_all = "lowercase")]
pub enum BusEvent {
    /// Host request: delete whichever annotation is currently selected.
    #[serde(rename = "deleteSelectedAnnotation")]
    DeleteSelectedAnnotation,
    /// Host request: enter view mode (interaction handlers bound).
    #[serde(rename = "enableViewMode")]
    EnableViewMode,
    /// Host request: leave view mode (interaction handlers unbound).
    #[serde(rename = "disableViewMode")]
    DisableViewMode,
    /// A rectangle moved during an active drag. Fired per pointer-move.
    RectMove(AnnotationRecord),
    /// A drag session committed. Fired once per completed move.
    RectMoveEnd(AnnotationRecord),
    /// An annotation was destroyed; listeners should drop its stored record.
    Delete(AnnotationRecord),
    /// The pointer entered an annotation's shape.
    HoverIn(AnnotationId),
    /// The pointer left an annotation's shape.
    HoverOut(AnnotationId),
    /// The pointer entered an annotation's circle handle specifically.
    HandleHoverIn(AnnotationId),
    /// The pointer left an annotation's circle handle specifically.
    HandleHoverOut(AnnotationId),
    /// A text label entered its selected (editable) state.
    TextSelected(AnnotationId),
    /// A text label left its selected state.
    TextDeselected(AnnotationId),
    /// The pointer entered a text label.
    TextHoverIn(AnnotationId),
    /// The pointer left a text label.
    TextHoverOut(AnnotationId),
    /// A text label's content was committed by the editor.
    TextChanged {
        id: AnnotationId,
        text: String,
    },
}

/// Fieldless mirror of [`BusEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    DeleteSelectedAnnotation,
    EnableViewMode,
    DisableViewMode,
    RectMove,
    RectMoveEnd,
    Delete,
    HoverIn,
    HoverOut,
    HandleHoverIn,
    HandleHoverOut,
    TextSelected,
    TextDeselected,
    TextHoverIn,
    TextHoverOut,
    TextChanged,
}

impl BusEvent {
    /// The topic this event is dispatched under.
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::DeleteSelectedAnnotation => Topic::DeleteSelectedAnnotation,
            Self::EnableViewMode => Topic::EnableViewMode,
            Self::DisableViewMode => Topic::DisableViewMode,
            Self::RectMove(_) => Topic::RectMove,
            Self::RectMoveEnd(_) => Topic::RectMoveEnd,
            Self::Delete(_) => Topic::Delete,
            Self::HoverIn(_) => Topic::HoverIn,
            Self::HoverOut(_) => Topic::HoverOut,
            Self::HandleHoverIn(_) => Topic::HandleHoverIn,
            Self::HandleHoverOut(_) => Topic::HandleHoverOut,
            Self::TextSelected(_) => Topic::TextSelected,
            Self::TextDeselected(_) => Topic::TextDeselected,
            Self::TextHoverIn(_) => Topic::TextHoverIn,
            Self::TextHoverOut(_) => Topic::TextHoverOut,
            Self::TextChanged { .. } => Topic::TextChanged,
        }
    }
}

impl Topic {
    /// The wire name the host uses for this topic.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DeleteSelectedAnnotation => "deleteSelectedAnnotation",
            Self::EnableViewMode => "enableViewMode",
            Self::DisableViewMode => "disableViewMode",
            Self::RectMove => "rectmove",
            Self::RectMoveEnd => "rectmoveend",
            Self::Delete => "delete",
            Self::HoverIn => "hoverin",
            Self::HoverOut => "hoverout",
            Self::HandleHoverIn => "handlehoverin",
            Self::HandleHoverOut => "handlehoverout",
            Self::TextSelected => "textselected",
            Self::TextDeselected => "textdeselected",
            Self::TextHoverIn => "texthoverin",
            Self::TextHoverOut => "texthoverout",
            Self::TextChanged => "textchanged",
        }
    }

    /// Parse a wire name back into a topic.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        const ALL: [Topic; 15] = [
            Topic::DeleteSelectedAnnotation,
            Topic::EnableViewMode,
            Topic::DisableViewMode,
            Topic::RectMove,
            Topic::RectMoveEnd,
            Topic::Delete,
            Topic::HoverIn,
            Topic::HoverOut,
            Topic::HandleHoverIn,
            Topic::HandleHoverOut,
            Topic::TextSelected,
            Topic::TextDeselected,
            Topic::TextHoverIn,
            Topic::TextHoverOut,
            Topic::TextChanged,
        ];
        ALL.into_iter().find(|t| t.name() == name)
    }
}

type Handler = Rc<RefCell<dyn FnMut(&BusEvent)>>;

#[derive(Clone)]
struct Entry {
    id: u64,
    active: Rc<Cell<bool>>,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: HashMap<Topic, Vec<Entry>>,
}

/// Single-threaded publish/subscribe bus shared by all annotations on a
/// page. Cheap to clone; clones share the subscriber table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one topic. The handler stays attached until
    /// the returned [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(&self, topic: Topic, handler: impl FnMut(&BusEvent) + 'static) -> Subscription {
        let handler: Handler = Rc::new(RefCell::new(handler));
        let active = Rc::new(Cell::new(true));
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let list = inner.subscribers.entry(topic).or_default();
        list.retain(|e| e.active.get());
        list.push(Entry { id, active: Rc::clone(&active), handler });
        Subscription { bus: Rc::downgrade(&self.inner), topic, id, active }
    }

    /// Deliver an event to every live subscriber of its topic, in
    /// subscription order.
    pub fn publish(&self, event: &BusEvent) {
        let entries: Vec<Entry> = {
            let inner = self.inner.borrow();
            inner.subscribers.get(&event.topic()).cloned().unwrap_or_default()
        };
        for entry in entries {
            if !entry.active.get() {
                continue;
            }
            match entry.handler.try_borrow_mut() {
                Ok(mut handler) => (*handler)(event),
                Err(_) => log::warn!("skipping re-entrant handler for {:?}", event.topic()),
            }
        }
    }

    /// Number of live subscriptions for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(&topic)
            .map_or(0, |list| list.iter().filter(|e| e.active.get()).count())
    }
}

/// RAII handle for one bus subscription. Dropping it detaches the handler;
/// an event published afterwards never reaches it, even if the drop happens
/// mid-dispatch.
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    topic: Topic,
    id: u64,
    active: Rc<Cell<bool>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.set(false);
        // Removal from the table is best-effort; the active flag alone
        // guarantees the handler never runs again.
        if let Some(inner) = self.bus.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                if let Some(list) = inner.subscribers.get_mut(&self.topic) {
                    list.retain(|e| e.id != self.id);
                }
            }
        }
    }
}

//! Construction context injected into every annotation.
//!
//! Replaces ambient globals: the bus, the scale utility, the persistence
//! collaborator, and the id generator all arrive here, so instances carry
//! no references to `window`-style shared state.

use std::cell::Cell;
use std::rc::Rc;

use uuid::Uuid;

use crate::bus::EventBus;
use crate::record::AnnotationId;
use crate::scale::Scale;
use crate::store::{AnnotationStore, MemoryStore};

/// Produces globally unique annotation identifiers.
pub trait IdProvider {
    fn generate(&self) -> AnnotationId;
}

/// Default id generator: random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate(&self) -> AnnotationId {
        Uuid::new_v4()
    }
}

/// Shared collaborators handed to each annotation at construction.
#[derive(Clone)]
pub struct Context {
    pub bus: EventBus,
    /// Live viewport scale; the host updates it on zoom and in-flight drags
    /// read it per move event.
    pub scale: Rc<Cell<Scale>>,
    pub store: Rc<dyn AnnotationStore>,
    pub ids: Rc<dyn IdProvider>,
}

impl Context {
    #[must_use]
    pub fn new(bus: EventBus, scale: Scale, store: Rc<dyn AnnotationStore>, ids: Rc<dyn IdProvider>) -> Self {
        Self { bus, scale: Rc::new(Cell::new(scale)), store, ids }
    }

    /// Context backed by an in-memory store and random ids; the default for
    /// native hosts and tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(EventBus::new(), Scale::default(), Rc::new(MemoryStore::new()), Rc::new(UuidProvider))
    }

    #[must_use]
    pub fn scale(&self) -> Scale {
        self.scale.get()
    }

    pub fn set_scale(&self, scale: Scale) {
        self.scale.set(scale);
    }
}

//! Generic container for the annotations on one page.
//!
//! Consumes the [`Annotation`] interface only, so any annotation variant
//! can live here. The container owns its annotations; tearing it down
//! destroys every one of them.

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;

use std::collections::HashMap;

use crate::base::{Annotation, Effect};
use crate::record::AnnotationId;

/// Runtime registry of the annotations on a page.
pub struct AnnotationCollection<A: Annotation> {
    annotations: HashMap<AnnotationId, A>,
}

impl<A: Annotation> AnnotationCollection<A> {
    #[must_use]
    pub fn new() -> Self {
        Self { annotations: HashMap::new() }
    }

    /// Insert an annotation, keyed by its id. An existing annotation with
    /// the same id is replaced and returned.
    pub fn insert(&mut self, annotation: A) -> Option<A> {
        self.annotations.insert(annotation.id(), annotation)
    }

    #[must_use]
    pub fn get(&self, id: &AnnotationId) -> Option<&A> {
        self.annotations.get(id)
    }

    /// Remove an annotation without destroying it.
    pub fn remove(&mut self, id: &AnnotationId) -> Option<A> {
        self.annotations.remove(id)
    }

    /// The currently selected annotation, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<AnnotationId> {
        self.annotations.values().find(|a| a.is_selected()).map(Annotation::id)
    }

    /// Iterate over the live (non-destroyed) annotations.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.annotations.values().filter(|a| !a.is_destroyed())
    }

    /// Drain queued host actions from every annotation, paired with the
    /// annotation they belong to.
    pub fn drain_effects(&mut self) -> Vec<(AnnotationId, Vec<Effect>)> {
        let mut drained = Vec::new();
        for (id, annotation) in &mut self.annotations {
            let effects = annotation.take_effects();
            if !effects.is_empty() {
                drained.push((*id, effects));
            }
        }
        drained
    }

    /// Drop annotations that have been destroyed (e.g. via the bus),
    /// returning their ids.
    pub fn sweep(&mut self) -> Vec<AnnotationId> {
        let gone: Vec<AnnotationId> =
            self.annotations.iter().filter(|(_, a)| a.is_destroyed()).map(|(id, _)| *id).collect();
        for id in &gone {
            self.annotations.remove(id);
        }
        gone
    }

    /// Container teardown: destroy every annotation and drop them,
    /// returning the teardown actions each one queued so the host can still
    /// detach their visual nodes.
    pub fn destroy_all(&mut self) -> Vec<(AnnotationId, Vec<Effect>)> {
        let mut drained = Vec::new();
        for (id, annotation) in &mut self.annotations {
            annotation.destroy();
            let effects = annotation.take_effects();
            if !effects.is_empty() {
                drained.push((*id, effects));
            }
        }
        self.annotations.clear();
        drained
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl<A: Annotation> Default for AnnotationCollection<A> {
    fn default() -> Self {
        Self::new()
    }
}

use uuid::Uuid;

use super::*;
use crate::record::{AnnotationKind, AnnotationRecord};

// =============================================================
// Helpers
// =============================================================

/// Minimal annotation variant exercising the container contract.
struct FakeAnnotation {
    id: AnnotationId,
    selected: bool,
    destroyed: bool,
    queued: Vec<Effect>,
}

impl FakeAnnotation {
    fn new() -> Self {
        Self { id: Uuid::new_v4(), selected: false, destroyed: false, queued: Vec::new() }
    }

    fn selected() -> Self {
        Self { selected: true, ..Self::new() }
    }
}

impl Annotation for FakeAnnotation {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Area
    }

    fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord { id: Some(self.id), ..AnnotationRecord::default() }
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.queued.push(Effect::Detach);
        }
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.queued)
    }
}

// =============================================================
// Insertion and lookup
// =============================================================

#[test]
fn starts_empty() {
    let collection: AnnotationCollection<FakeAnnotation> = AnnotationCollection::new();
    assert!(collection.is_empty());
    assert_eq!(collection.len(), 0);
}

#[test]
fn insert_and_get_by_id() {
    let mut collection = AnnotationCollection::new();
    let ann = FakeAnnotation::new();
    let id = ann.id();
    collection.insert(ann);
    assert_eq!(collection.len(), 1);
    assert!(collection.get(&id).is_some());
    assert!(collection.get(&Uuid::new_v4()).is_none());
}

#[test]
fn insert_replaces_same_id() {
    let mut collection = AnnotationCollection::new();
    let ann = FakeAnnotation::new();
    let id = ann.id();
    collection.insert(ann);
    let mut replacement = FakeAnnotation::new();
    replacement.id = id;
    let previous = collection.insert(replacement);
    assert!(previous.is_some());
    assert_eq!(collection.len(), 1);
}

#[test]
fn remove_returns_the_annotation() {
    let mut collection = AnnotationCollection::new();
    let ann = FakeAnnotation::new();
    let id = ann.id();
    collection.insert(ann);
    assert!(collection.remove(&id).is_some());
    assert!(collection.is_empty());
}

// =============================================================
// Selection lookup
// =============================================================

#[test]
fn selected_id_finds_the_selected_annotation() {
    let mut collection = AnnotationCollection::new();
    collection.insert(FakeAnnotation::new());
    let chosen = FakeAnnotation::selected();
    let chosen_id = chosen.id();
    collection.insert(chosen);
    assert_eq!(collection.selected_id(), Some(chosen_id));
}

#[test]
fn selected_id_is_none_without_selection() {
    let mut collection = AnnotationCollection::new();
    collection.insert(FakeAnnotation::new());
    assert_eq!(collection.selected_id(), None);
}

// =============================================================
// Effects and sweeping
// =============================================================

#[test]
fn drain_effects_collects_queued_batches() {
    let mut collection = AnnotationCollection::new();
    let mut noisy = FakeAnnotation::new();
    noisy.queued.push(Effect::RenderNeeded);
    let noisy_id = noisy.id();
    collection.insert(noisy);
    collection.insert(FakeAnnotation::new());

    let drained = collection.drain_effects();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].0, noisy_id);
    assert_eq!(drained[0].1, vec![Effect::RenderNeeded]);

    assert!(collection.drain_effects().is_empty());
}

#[test]
fn iter_skips_destroyed_annotations() {
    let mut collection = AnnotationCollection::new();
    let mut dead = FakeAnnotation::new();
    dead.destroyed = true;
    collection.insert(dead);
    collection.insert(FakeAnnotation::new());
    assert_eq!(collection.iter().count(), 1);
}

#[test]
fn sweep_drops_destroyed_annotations() {
    let mut collection = AnnotationCollection::new();
    let mut dead = FakeAnnotation::new();
    dead.destroyed = true;
    let dead_id = dead.id();
    collection.insert(dead);
    collection.insert(FakeAnnotation::new());

    let gone = collection.sweep();
    assert_eq!(gone, vec![dead_id]);
    assert_eq!(collection.len(), 1);
}

// =============================================================
// Teardown
// =============================================================

#[test]
fn destroy_all_destroys_then_clears() {
    let mut collection = AnnotationCollection::new();
    collection.insert(FakeAnnotation::new());
    collection.insert(FakeAnnotation::new());

    let drained = collection.destroy_all();

    assert!(collection.is_empty());
    assert_eq!(drained.len(), 2);
    for (_, effects) in &drained {
        assert_eq!(effects, &vec![Effect::Detach]);
    }
}

#[test]
fn destroy_all_keeps_earlier_queued_effects() {
    let mut collection = AnnotationCollection::new();
    let mut noisy = FakeAnnotation::new();
    noisy.queued.push(Effect::RenderNeeded);
    let noisy_id = noisy.id();
    collection.insert(noisy);

    let drained = collection.destroy_all();

    let (_, effects) = drained.iter().find(|(id, _)| *id == noisy_id).unwrap();
    assert_eq!(effects, &vec![Effect::RenderNeeded, Effect::Detach]);
}

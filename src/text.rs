//! The editable text label paired with each rectangle.
//!
//! Exactly one label exists per rectangle; both are created and destroyed
//! together. The host's label editor drives the handlers here; the label
//! publishes its state changes on the bus and the owning rectangle mirrors
//! them onto its own visual state.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use std::cell::RefCell;
use std::rc::Rc;

use crate::base::{BaseBehavior, Effect, Hoverable, Selectable};
use crate::bus::BusEvent;
use crate::context::Context;
use crate::record::AnnotationId;

/// Pure state for one text label.
#[derive(Debug)]
pub struct TextState {
    id: AnnotationId,
    text: Option<String>,
    base: BaseBehavior,
}

impl TextState {
    fn new(id: AnnotationId) -> Self {
        Self { id, text: None, base: BaseBehavior::new() }
    }

    fn select(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() || self.base.is_selected() {
            return Vec::new();
        }
        self.base.set_selected(true);
        vec![Effect::Publish(BusEvent::TextSelected(self.id))]
    }

    fn deselect(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() || !self.base.is_selected() {
            return Vec::new();
        }
        self.base.set_selected(false);
        vec![Effect::Publish(BusEvent::TextDeselected(self.id))]
    }

    fn hover_in(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.highlight();
        vec![Effect::Publish(BusEvent::TextHoverIn(self.id))]
    }

    fn hover_out(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.dehighlight();
        vec![Effect::Publish(BusEvent::TextHoverOut(self.id))]
    }

    fn commit_text(&mut self, text: String) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.text = Some(text.clone());
        vec![Effect::Publish(BusEvent::TextChanged { id: self.id, text })]
    }
}

/// Handle for one text label. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TextAnnotation {
    state: Rc<RefCell<TextState>>,
    ctx: Context,
}

impl TextAnnotation {
    pub(crate) fn new(ctx: &Context) -> Self {
        let id = ctx.ids.generate();
        Self { state: Rc::new(RefCell::new(TextState::new(id))), ctx: ctx.clone() }
    }

    #[must_use]
    pub fn id(&self) -> AnnotationId {
        self.state.borrow().id
    }

    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.state.borrow().text.clone()
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.state.borrow().base.is_selected()
    }

    #[must_use]
    pub fn is_highlighted(&self) -> bool {
        self.state.borrow().base.is_highlighted()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().base.is_destroyed()
    }

    /// Enter the selected (editable) state and announce it.
    pub fn select(&self) {
        let effects = self.state.borrow_mut().select();
        self.emit(effects);
    }

    /// Leave the selected state and announce it.
    pub fn deselect(&self) {
        let effects = self.state.borrow_mut().deselect();
        self.emit(effects);
    }

    /// Pointer entered the label.
    pub fn hover_in(&self) {
        let effects = self.state.borrow_mut().hover_in();
        self.emit(effects);
    }

    /// Pointer left the label.
    pub fn hover_out(&self) {
        let effects = self.state.borrow_mut().hover_out();
        self.emit(effects);
    }

    /// Commit edited text from the host's editor.
    pub fn commit_text(&self, text: impl Into<String>) {
        let effects = self.state.borrow_mut().commit_text(text.into());
        self.emit(effects);
    }

    /// Hydrate the label text from a stored record without announcing a
    /// change.
    pub(crate) fn hydrate(&self, text: Option<String>) {
        self.state.borrow_mut().text = text;
    }

    /// Tear down with the owning rectangle. Idempotent; a destroyed label
    /// ignores all further handlers.
    pub fn destroy(&self) {
        self.state.borrow_mut().base.mark_destroyed();
    }

    fn emit(&self, effects: Vec<Effect>) {
        // The label has no standalone visual node; everything it produces
        // is a bus event the owning rectangle mirrors.
        for effect in effects {
            if let Effect::Publish(event) = effect {
                self.ctx.bus.publish(&event);
            }
        }
    }
}

//! The rectangular area annotation: state machine and wiring.
//!
//! Split in two layers so all interaction logic is testable without a
//! browser:
//!
//! - [`RectState`] is the pure state machine. Transition methods take plain
//!   inputs and return [`Effect`]s; they never touch the bus, the store, or
//!   the DOM.
//! - [`RectAnnotation`] is the public handle. It owns the state cell, the
//!   paired text label, and the bus subscriptions; it executes internal
//!   effects (publish, save, text selection) and hands host actions back to
//!   the platform binding layer.

#[cfg(test)]
#[path = "rect_test.rs"]
mod rect_test;

use std::cell::RefCell;
use std::rc::Rc;

use crate::base::{Annotation, BaseBehavior, Effect, Hoverable, Renderable, Selectable};
use crate::bus::{BusEvent, Subscription, Topic};
use crate::context::Context;
use crate::input::{DragState, HoverTarget};
use crate::record::{AnnotationId, AnnotationKind, AnnotationRecord};
use crate::render::{self, RectView};
use crate::scale::{Point, Scale};
use crate::text::TextAnnotation;

/// Pure interaction state for one rectangle.
pub struct RectState {
    id: AnnotationId,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    /// Mirror of the paired label's text, persisted with the geometry.
    text: Option<String>,
    color: Option<String>,
    read_only: bool,
    base: BaseBehavior,
    drag: DragState,
    /// Whether view-mode click/pointer-down handlers are currently bound.
    handlers_bound: bool,
}

impl RectState {
    fn new(id: AnnotationId) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            text: None,
            color: None,
            read_only: false,
            base: BaseBehavior::new(),
            drag: DragState::Idle,
            handlers_bound: false,
        }
    }

    fn record(&self) -> AnnotationRecord {
        AnnotationRecord {
            id: Some(self.id),
            kind: AnnotationKind::Area,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            text: self.text.clone(),
            color: self.color.clone(),
            read_only: self.read_only,
        }
    }

    fn is_destroyed(&self) -> bool {
        self.base.is_destroyed()
    }

    // --- View-mode toggling ---

    fn enable_view_mode(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        // Unbind first so repeated enables never stack handlers.
        self.handlers_bound = false;
        let mut effects = vec![Effect::UnbindInteractionHandlers];
        if !self.read_only {
            self.handlers_bound = true;
            effects.push(Effect::BindInteractionHandlers);
        }
        effects
    }

    fn disable_view_mode(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.handlers_bound = false;
        vec![Effect::UnbindInteractionHandlers]
    }

    // --- Drag-to-move ---

    fn pointer_down(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() || self.read_only || !self.handlers_bound || self.drag.is_active() {
            return Vec::new();
        }
        log::debug!("pointer down on rect {}", self.id);
        self.drag = DragState::Armed { origin: Point::new(self.x, self.y) };
        vec![Effect::DisablePageTextSelection, Effect::BindDragListeners]
    }

    fn pointer_move(&mut self, screen: Point, scale: Scale) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        let (origin, start) = match self.drag {
            DragState::Idle => return Vec::new(),
            // First move: capture the screen start point lazily. The
            // pointer-down position is unusable because the handle may be
            // grabbed before any move fires.
            DragState::Armed { origin } => (origin, screen),
            DragState::Moving { origin, start_screen, .. } => (origin, start_screen),
        };
        self.drag = DragState::Moving { origin, start_screen: start, last_screen: screen };
        let delta = scale.to_document_space(Point::new(screen.x - start.x, screen.y - start.y));
        self.x = origin.x + delta.x;
        self.y = origin.y + delta.y;
        self.base.mark_dirty();
        vec![Effect::RenderNeeded, Effect::Publish(BusEvent::RectMove(self.record()))]
    }

    fn pointer_up(&mut self) -> Vec<Effect> {
        match self.drag {
            DragState::Idle => Vec::new(),
            // Click without drag: nothing to commit, nothing to announce.
            DragState::Armed { .. } => {
                self.drag = DragState::Idle;
                vec![Effect::EnablePageTextSelection, Effect::UnbindDragListeners]
            }
            DragState::Moving { .. } => {
                self.drag = DragState::Idle;
                let mut effects = vec![Effect::Save];
                effects.extend(self.enable_view_mode());
                effects.push(Effect::Publish(BusEvent::RectMoveEnd(self.record())));
                effects.push(Effect::EnablePageTextSelection);
                effects.push(Effect::UnbindDragListeners);
                effects
            }
        }
    }

    // --- Selection / hover ---

    fn click(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() || self.read_only || !self.handlers_bound {
            return Vec::new();
        }
        let selected = !self.base.is_selected();
        self.base.set_selected(selected);
        self.base.mark_dirty();
        let text_effect = if selected { Effect::SelectText } else { Effect::DeselectText };
        vec![text_effect, Effect::RenderNeeded]
    }

    fn hover_in(&mut self, target: HoverTarget) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.highlight();
        self.base.mark_dirty();
        let mut effects = vec![Effect::Publish(BusEvent::HoverIn(self.id))];
        if target == HoverTarget::Handle {
            effects.push(Effect::Publish(BusEvent::HandleHoverIn(self.id)));
        }
        effects.push(Effect::RenderNeeded);
        effects
    }

    fn hover_out(&mut self, target: HoverTarget) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.dehighlight();
        self.base.mark_dirty();
        let mut effects = vec![Effect::Publish(BusEvent::HoverOut(self.id))];
        if target == HoverTarget::Handle {
            effects.push(Effect::Publish(BusEvent::HandleHoverOut(self.id)));
        }
        effects.push(Effect::RenderNeeded);
        effects
    }

    // --- Text label mirroring ---

    fn text_selected(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.set_selected(true);
        self.base.mark_dirty();
        vec![Effect::RenderNeeded]
    }

    fn text_deselected(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.set_selected(false);
        self.base.mark_dirty();
        vec![Effect::RenderNeeded]
    }

    fn text_hover_in(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.highlight();
        self.base.mark_dirty();
        vec![Effect::Publish(BusEvent::HoverIn(self.id)), Effect::RenderNeeded]
    }

    fn text_hover_out(&mut self) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        self.base.dehighlight();
        self.base.mark_dirty();
        vec![Effect::Publish(BusEvent::HoverOut(self.id)), Effect::RenderNeeded]
    }

    fn text_changed(&mut self, text: String) -> Vec<Effect> {
        if self.base.is_destroyed() {
            return Vec::new();
        }
        // Text edits persist immediately; geometry is untouched.
        self.text = Some(text);
        self.base.mark_dirty();
        vec![Effect::Save, Effect::RenderNeeded]
    }

    // --- Lifecycle ---

    fn delete_selected(&mut self) -> Vec<Effect> {
        if self.base.is_selected() { self.destroy() } else { Vec::new() }
    }

    fn destroy(&mut self) -> Vec<Effect> {
        if !self.base.mark_destroyed() {
            return Vec::new();
        }
        log::debug!("destroying rect {}", self.id);
        self.handlers_bound = false;
        let mut effects = Vec::new();
        if self.drag.is_active() {
            // Document-level drag listeners must not outlive the instance.
            self.drag = DragState::Idle;
            effects.push(Effect::UnbindDragListeners);
            effects.push(Effect::EnablePageTextSelection);
        }
        effects.push(Effect::UnbindInteractionHandlers);
        effects.push(Effect::Detach);
        effects.push(Effect::Publish(BusEvent::Delete(self.record())));
        effects
    }
}

/// Execute a transition's effects: internal ones are consumed here, host
/// actions accumulate in `host` in order.
fn run_effects(
    ctx: &Context,
    text: &TextAnnotation,
    state: &Rc<RefCell<RectState>>,
    host: &mut Vec<Effect>,
    effects: Vec<Effect>,
) {
    for effect in effects {
        match effect {
            Effect::Publish(event) => ctx.bus.publish(&event),
            Effect::Save => {
                let record = state.borrow().record();
                if let Err(err) = ctx.store.save(&record) {
                    log::warn!("failed to save annotation {:?}: {err}", record.id);
                }
            }
            Effect::SelectText => text.select(),
            Effect::DeselectText => text.deselect(),
            other => host.push(other),
        }
    }
}

/// One rectangular area annotation overlaid on a page.
///
/// Built by [`RectAnnotation::create`] or [`RectAnnotation::from_record`];
/// destroyed explicitly, which releases every bus subscription taken at
/// construction.
pub struct RectAnnotation {
    ctx: Context,
    state: Rc<RefCell<RectState>>,
    text: TextAnnotation,
    subs: Rc<RefCell<Vec<Subscription>>>,
    /// Host actions produced by bus-driven transitions, drained via
    /// [`Annotation::take_effects`].
    pending: Rc<RefCell<Vec<Effect>>>,
}

impl RectAnnotation {
    /// Build an unrendered instance with zero geometry, subscribed to the
    /// bus and paired with a fresh text label.
    #[must_use]
    pub fn create(ctx: &Context) -> Self {
        let text = TextAnnotation::new(ctx);
        let state = Rc::new(RefCell::new(RectState::new(ctx.ids.generate())));
        let ann = Self {
            ctx: ctx.clone(),
            state,
            text,
            subs: Rc::new(RefCell::new(Vec::new())),
            pending: Rc::new(RefCell::new(Vec::new())),
        };
        ann.wire_subscriptions();
        ann
    }

    /// Hydrate an instance from a stored record. A missing id is generated
    /// and invalid geometry is normalized.
    #[must_use]
    pub fn from_record(ctx: &Context, record: AnnotationRecord) -> Self {
        let record = record.normalized();
        let ann = Self::create(ctx);
        {
            let mut st = ann.state.borrow_mut();
            if let Some(id) = record.id {
                st.id = id;
            }
            st.x = record.x;
            st.y = record.y;
            st.width = record.width;
            st.height = record.height;
            st.text = record.text.clone();
            st.color = record.color;
            st.read_only = record.read_only;
        }
        ann.text.hydrate(record.text);
        ann
    }

    fn wire_subscriptions(&self) {
        let text_id = self.text.id();
        let wired = vec![
            self.subscribe(Topic::DeleteSelectedAnnotation, |st, _| Some(st.delete_selected())),
            self.subscribe(Topic::EnableViewMode, |st, _| Some(st.enable_view_mode())),
            self.subscribe(Topic::DisableViewMode, |st, _| Some(st.disable_view_mode())),
            self.subscribe(Topic::TextSelected, move |st, ev| {
                matches!(ev, BusEvent::TextSelected(id) if *id == text_id).then(|| st.text_selected())
            }),
            self.subscribe(Topic::TextDeselected, move |st, ev| {
                matches!(ev, BusEvent::TextDeselected(id) if *id == text_id).then(|| st.text_deselected())
            }),
            self.subscribe(Topic::TextHoverIn, move |st, ev| {
                matches!(ev, BusEvent::TextHoverIn(id) if *id == text_id).then(|| st.text_hover_in())
            }),
            self.subscribe(Topic::TextHoverOut, move |st, ev| {
                matches!(ev, BusEvent::TextHoverOut(id) if *id == text_id).then(|| st.text_hover_out())
            }),
            self.subscribe(Topic::TextChanged, move |st, ev| match ev {
                BusEvent::TextChanged { id, text } if *id == text_id => Some(st.text_changed(text.clone())),
                _ => None,
            }),
        ];
        *self.subs.borrow_mut() = wired;
    }

    /// Attach one bus handler that routes an event through a state
    /// transition and executes the resulting effects. Host actions queue on
    /// `pending`; if the transition destroyed the instance, the label and
    /// every subscription (including the running one) are released.
    fn subscribe<F>(&self, topic: Topic, transition: F) -> Subscription
    where
        F: Fn(&mut RectState, &BusEvent) -> Option<Vec<Effect>> + 'static,
    {
        let ctx = self.ctx.clone();
        let text = self.text.clone();
        let weak_state = Rc::downgrade(&self.state);
        let weak_subs = Rc::downgrade(&self.subs);
        let pending = Rc::clone(&self.pending);
        self.ctx.bus.subscribe(topic, move |event| {
            let Some(state) = weak_state.upgrade() else { return };
            if state.borrow().is_destroyed() {
                return;
            }
            let effects = {
                let mut st = state.borrow_mut();
                transition(&mut st, event)
            };
            let Some(effects) = effects else { return };
            let mut host = Vec::new();
            run_effects(&ctx, &text, &state, &mut host, effects);
            if !host.is_empty() {
                pending.borrow_mut().extend(host);
            }
            if state.borrow().is_destroyed() {
                text.destroy();
                if let Some(subs) = weak_subs.upgrade() {
                    subs.borrow_mut().clear();
                }
            }
        })
    }

    /// Run a transition from a direct handler call and return the host
    /// actions it produced.
    fn run(&self, transition: impl FnOnce(&mut RectState) -> Vec<Effect>) -> Vec<Effect> {
        let effects = {
            let mut st = self.state.borrow_mut();
            transition(&mut st)
        };
        let mut host = Vec::new();
        run_effects(&self.ctx, &self.text, &self.state, &mut host, effects);
        host
    }

    // --- Input handlers (bound to concrete UI elements by the host) ---

    /// Pointer-down on the shape or its handle.
    pub fn handle_pointer_down(&self) -> Vec<Effect> {
        self.run(RectState::pointer_down)
    }

    /// Document-level pointer-move during a drag session.
    pub fn handle_pointer_move(&self, screen: Point) -> Vec<Effect> {
        let scale = self.ctx.scale();
        self.run(|st| st.pointer_move(screen, scale))
    }

    /// Document-level pointer-up ending a drag session.
    pub fn handle_pointer_up(&self) -> Vec<Effect> {
        self.run(RectState::pointer_up)
    }

    /// Click on the shape or its handle.
    pub fn handle_click(&self) -> Vec<Effect> {
        self.run(RectState::click)
    }

    /// Pointer entered the shape body or the circle handle.
    pub fn handle_hover_in(&self, target: HoverTarget) -> Vec<Effect> {
        self.run(|st| st.hover_in(target))
    }

    /// Pointer left the shape body or the circle handle.
    pub fn handle_hover_out(&self, target: HoverTarget) -> Vec<Effect> {
        self.run(|st| st.hover_out(target))
    }

    /// Bind interaction handlers (normally bus-driven via `enableViewMode`).
    pub fn enable_view_mode(&self) -> Vec<Effect> {
        self.run(RectState::enable_view_mode)
    }

    /// Unbind interaction handlers (normally bus-driven via
    /// `disableViewMode`).
    pub fn disable_view_mode(&self) -> Vec<Effect> {
        self.run(RectState::disable_view_mode)
    }

    /// Tear the annotation down: detach, announce `delete`, destroy the
    /// paired label, release all bus subscriptions. Safe to call mid-drag
    /// and idempotent.
    pub fn destroy(&mut self) -> Vec<Effect> {
        let host = self.run(RectState::destroy);
        self.text.destroy();
        self.subs.borrow_mut().clear();
        host
    }

    // --- Geometry ---

    /// Anchor point for the label, a fixed offset above the top-left
    /// corner, in document space.
    #[must_use]
    pub fn text_anchor(&self) -> Point {
        let st = self.state.borrow();
        render::label_anchor(st.x, st.y)
    }

    /// Screen-space center of the circle handle, computed from live
    /// geometry and the current scale.
    #[must_use]
    pub fn bounding_handle_position(&self) -> Point {
        let st = self.state.borrow();
        self.ctx.scale().to_screen_space(Point::new(st.x, st.y))
    }

    /// Build the view model the host draws. Idempotent and cheap enough to
    /// call on every move event.
    #[must_use]
    pub fn view(&self) -> RectView {
        let st = self.state.borrow();
        render::rect_view(&st.record(), st.base.is_selected(), st.base.is_highlighted(), self.ctx.scale())
    }

    // --- Queries ---

    #[must_use]
    pub fn x(&self) -> f64 {
        self.state.borrow().x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.state.borrow().y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.state.borrow().width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.state.borrow().height
    }

    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.state.borrow().text.clone()
    }

    #[must_use]
    pub fn color(&self) -> Option<String> {
        self.state.borrow().color.clone()
    }

    #[must_use]
    pub fn read_only(&self) -> bool {
        self.state.borrow().read_only
    }

    #[must_use]
    pub fn is_highlighted(&self) -> bool {
        self.state.borrow().base.is_highlighted()
    }

    /// The current drag gesture state.
    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.state.borrow().drag
    }

    /// Whether view-mode interaction handlers are currently bound.
    #[must_use]
    pub fn interaction_bound(&self) -> bool {
        self.state.borrow().handlers_bound
    }

    /// Whether the shape changed since the host last drew it.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.state.borrow().base.needs_render()
    }

    /// Host acknowledgment that the shape was drawn.
    pub fn mark_rendered(&self) {
        self.state.borrow_mut().base.mark_rendered();
    }

    /// The paired text label.
    #[must_use]
    pub fn text_annotation(&self) -> &TextAnnotation {
        &self.text
    }
}

impl Annotation for RectAnnotation {
    fn id(&self) -> AnnotationId {
        self.state.borrow().id
    }

    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Area
    }

    fn to_record(&self) -> AnnotationRecord {
        self.state.borrow().record()
    }

    fn is_selected(&self) -> bool {
        self.state.borrow().base.is_selected()
    }

    fn is_destroyed(&self) -> bool {
        self.state.borrow().is_destroyed()
    }

    fn destroy(&mut self) {
        let effects = RectAnnotation::destroy(self);
        if !effects.is_empty() {
            self.pending.borrow_mut().extend(effects);
        }
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

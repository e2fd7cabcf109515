//! The wasm shell: what the host JavaScript layer talks to.
//!
//! [`Overlay`] owns the page's annotations and the injected context. The
//! host attaches DOM listeners itself and forwards events in; every entry
//! point returns the resulting host actions as a JSON string of
//! `{ id, effects }` batches for the binding layer to apply. Rust never
//! touches the DOM here.
//!
//! [`LocalStorageStore`] persists committed records in browser local
//! storage, one key per annotation.

use std::rc::Rc;

use serde::Serialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use crate::base::{Annotation, Effect};
use crate::bus::{BusEvent, EventBus, Subscription, Topic};
use crate::collection::AnnotationCollection;
use crate::context::{Context, UuidProvider};
use crate::record::{AnnotationId, AnnotationRecord};
use crate::rect::RectAnnotation;
use crate::render::RectView;
use crate::scale::{Point, Scale};
use crate::store::{AnnotationStore, StoreError};

/// Install the browser console logger and panic hook. The host calls this
/// once before constructing an overlay; later calls keep the first logger.
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("console logger already installed");
    }
}

/// Annotation store backed by `window.localStorage`. One key per record,
/// namespaced by a fixed prefix.
pub struct LocalStorageStore {
    prefix: String,
}

impl LocalStorageStore {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Backend("no window".into()))?
            .local_storage()
            .map_err(|err| StoreError::Backend(format!("{err:?}")))?
            .ok_or_else(|| StoreError::Backend("local storage disabled".into()))
    }
}

impl AnnotationStore for LocalStorageStore {
    fn save(&self, record: &AnnotationRecord) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::MissingId)?;
        let key = format!("{}/{id}", self.prefix);
        let value = serde_json::to_string(record)?;
        Self::storage()?
            .set_item(&key, &value)
            .map_err(|err| StoreError::Backend(format!("{err:?}")))
    }
}

#[derive(Serialize)]
struct EffectBatch {
    id: String,
    effects: Vec<Effect>,
}

fn parse_id(id: &str) -> Result<AnnotationId, JsValue> {
    Uuid::parse_str(id).map_err(|err| JsValue::from_str(&format!("invalid annotation id: {err}")))
}

fn to_js(err: serde_json::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The annotation overlay for one rendered page.
#[wasm_bindgen]
pub struct Overlay {
    ctx: Context,
    annotations: AnnotationCollection<RectAnnotation>,
    host_subs: Vec<Subscription>,
}

#[wasm_bindgen]
impl Overlay {
    /// Build an overlay persisting to local storage under `storage_key`,
    /// with the given initial viewport scale.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(scale: f64, storage_key: String) -> Overlay {
        let store: Rc<dyn AnnotationStore> = Rc::new(LocalStorageStore::new(storage_key));
        let ctx = Context::new(EventBus::new(), Scale::new(scale), store, Rc::new(UuidProvider));
        Overlay { ctx, annotations: AnnotationCollection::new(), host_subs: Vec::new() }
    }

    /// Update the viewport scale after a zoom change.
    pub fn set_scale(&self, factor: f64) {
        self.ctx.set_scale(Scale::new(factor));
    }

    /// Hydrate annotations from a JSON array of stored records.
    ///
    /// # Errors
    ///
    /// Fails when the JSON is not an array of annotation records.
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), JsValue> {
        let records: Vec<AnnotationRecord> = serde_json::from_str(json).map_err(to_js)?;
        for record in records {
            let annotation = RectAnnotation::from_record(&self.ctx, record);
            self.annotations.insert(annotation);
        }
        Ok(())
    }

    /// Create a fresh, unrendered annotation and return its id.
    pub fn create_annotation(&mut self) -> String {
        let annotation = RectAnnotation::create(&self.ctx);
        let id = annotation.id();
        self.annotations.insert(annotation);
        id.to_string()
    }

    /// Publish one of the host-driven topics (`deleteSelectedAnnotation`,
    /// `enableViewMode`, `disableViewMode`).
    ///
    /// # Errors
    ///
    /// Fails on an unknown or payload-carrying topic name.
    pub fn publish(&mut self, topic: &str) -> Result<String, JsValue> {
        let event = match Topic::parse(topic) {
            Some(Topic::DeleteSelectedAnnotation) => BusEvent::DeleteSelectedAnnotation,
            Some(Topic::EnableViewMode) => BusEvent::EnableViewMode,
            Some(Topic::DisableViewMode) => BusEvent::DisableViewMode,
            _ => return Err(JsValue::from_str("topic is not host-publishable")),
        };
        self.ctx.bus.publish(&event);
        self.respond(None)
    }

    /// Attach a host callback to a bus topic. Events arrive as JSON. The
    /// subscription lives until the overlay is dropped or
    /// [`Overlay::clear_subscriptions`] is called.
    ///
    /// # Errors
    ///
    /// Fails on an unknown topic name.
    pub fn subscribe(&mut self, topic: &str, callback: js_sys::Function) -> Result<(), JsValue> {
        let topic = Topic::parse(topic).ok_or_else(|| JsValue::from_str("unknown topic"))?;
        let sub = self.ctx.bus.subscribe(topic, move |event| match serde_json::to_string(event) {
            Ok(json) => {
                if callback.call1(&JsValue::NULL, &JsValue::from_str(&json)).is_err() {
                    log::warn!("bus callback threw for {:?}", event.topic());
                }
            }
            Err(err) => log::warn!("failed to encode bus event: {err}"),
        });
        self.host_subs.push(sub);
        Ok(())
    }

    /// Detach every host callback attached via [`Overlay::subscribe`].
    pub fn clear_subscriptions(&mut self) {
        self.host_subs.clear();
    }

    // --- Forwarded input events ---

    /// Pointer-down on an annotation's shape or handle.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn pointer_down(&mut self, id: &str) -> Result<String, JsValue> {
        self.with(id, |a| a.handle_pointer_down())
    }

    /// Document-level pointer-move, in screen pixels.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn pointer_move(&mut self, id: &str, x: f64, y: f64) -> Result<String, JsValue> {
        self.with(id, |a| a.handle_pointer_move(Point::new(x, y)))
    }

    /// Document-level pointer-up.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn pointer_up(&mut self, id: &str) -> Result<String, JsValue> {
        self.with(id, |a| a.handle_pointer_up())
    }

    /// Click on an annotation's shape or handle.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn click(&mut self, id: &str) -> Result<String, JsValue> {
        self.with(id, |a| a.handle_click())
    }

    /// Pointer entered a shape (`handle = true` for the circle handle).
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn hover_in(&mut self, id: &str, handle: bool) -> Result<String, JsValue> {
        let target = if handle { crate::input::HoverTarget::Handle } else { crate::input::HoverTarget::Shape };
        self.with(id, |a| a.handle_hover_in(target))
    }

    /// Pointer left a shape (`handle = true` for the circle handle).
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn hover_out(&mut self, id: &str, handle: bool) -> Result<String, JsValue> {
        let target = if handle { crate::input::HoverTarget::Handle } else { crate::input::HoverTarget::Shape };
        self.with(id, |a| a.handle_hover_out(target))
    }

    // --- Forwarded text label events ---

    /// The host's label editor selected an annotation's label.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn text_select(&mut self, id: &str) -> Result<String, JsValue> {
        self.with_text(id, crate::text::TextAnnotation::select)
    }

    /// The label editor deselected the label.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn text_deselect(&mut self, id: &str) -> Result<String, JsValue> {
        self.with_text(id, crate::text::TextAnnotation::deselect)
    }

    /// Pointer entered the label.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn text_hover_in(&mut self, id: &str) -> Result<String, JsValue> {
        self.with_text(id, crate::text::TextAnnotation::hover_in)
    }

    /// Pointer left the label.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn text_hover_out(&mut self, id: &str) -> Result<String, JsValue> {
        self.with_text(id, crate::text::TextAnnotation::hover_out)
    }

    /// Commit edited label text.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn commit_text(&mut self, id: &str, text: &str) -> Result<String, JsValue> {
        let text = text.to_owned();
        self.with_text(id, move |t| t.commit_text(text))
    }

    // --- Lifecycle ---

    /// Destroy one annotation and drop it from the page.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable or unknown id.
    pub fn destroy_annotation(&mut self, id: &str) -> Result<String, JsValue> {
        let id = parse_id(id)?;
        let Some(mut annotation) = self.annotations.remove(&id) else {
            return Err(JsValue::from_str("unknown annotation id"));
        };
        let effects = RectAnnotation::destroy(&mut annotation);
        self.respond(Some((id, effects)))
    }

    /// Container teardown: destroy everything, returning the queued
    /// teardown actions.
    ///
    /// # Errors
    ///
    /// Fails when the resulting effect batches cannot be encoded.
    pub fn destroy_all(&mut self) -> Result<String, JsValue> {
        let batches: Vec<EffectBatch> = self
            .annotations
            .destroy_all()
            .into_iter()
            .map(|(id, effects)| EffectBatch { id: id.to_string(), effects })
            .collect();
        serde_json::to_string(&batches).map_err(to_js)
    }

    // --- Queries ---

    /// View models for every live annotation, as a JSON array.
    ///
    /// # Errors
    ///
    /// Fails when the view models cannot be encoded.
    pub fn render_models(&self) -> Result<String, JsValue> {
        let views: Vec<RectView> = self.annotations.iter().map(RectAnnotation::view).collect();
        serde_json::to_string(&views).map_err(to_js)
    }

    /// Current records for every live annotation, as a JSON array.
    ///
    /// # Errors
    ///
    /// Fails when the records cannot be encoded.
    pub fn records(&self) -> Result<String, JsValue> {
        let records: Vec<AnnotationRecord> = self.annotations.iter().map(Annotation::to_record).collect();
        serde_json::to_string(&records).map_err(to_js)
    }

    /// Id of the currently selected annotation, if any.
    #[must_use]
    pub fn selected_annotation(&self) -> Option<String> {
        self.annotations.selected_id().map(|id| id.to_string())
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

impl Overlay {
    fn with(&mut self, id: &str, f: impl FnOnce(&RectAnnotation) -> Vec<Effect>) -> Result<String, JsValue> {
        let id = parse_id(id)?;
        let effects = {
            let Some(annotation) = self.annotations.get(&id) else {
                return Err(JsValue::from_str("unknown annotation id"));
            };
            f(annotation)
        };
        self.respond(Some((id, effects)))
    }

    fn with_text(&mut self, id: &str, f: impl FnOnce(&crate::text::TextAnnotation)) -> Result<String, JsValue> {
        let id = parse_id(id)?;
        {
            let Some(annotation) = self.annotations.get(&id) else {
                return Err(JsValue::from_str("unknown annotation id"));
            };
            f(annotation.text_annotation());
        }
        self.respond(None)
    }

    /// Collect the direct effects plus everything queued by bus cascades,
    /// drop annotations destroyed along the way, and encode the batches.
    fn respond(&mut self, first: Option<(AnnotationId, Vec<Effect>)>) -> Result<String, JsValue> {
        let mut batches = Vec::new();
        if let Some((id, effects)) = first {
            if !effects.is_empty() {
                batches.push(EffectBatch { id: id.to_string(), effects });
            }
        }
        for (id, effects) in self.annotations.drain_effects() {
            batches.push(EffectBatch { id: id.to_string(), effects });
        }
        self.annotations.sweep();
        serde_json::to_string(&batches).map_err(to_js)
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use uuid::Uuid;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn record_events(bus: &EventBus, topic: Topic) -> (Subscription, Rc<RefCell<Vec<BusEvent>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = bus.subscribe(topic, move |event| sink.borrow_mut().push(event.clone()));
    (sub, log)
}

// =============================================================
// Delivery
// =============================================================

#[test]
fn publish_reaches_subscriber() {
    let bus = EventBus::new();
    let (_sub, log) = record_events(&bus, Topic::EnableViewMode);
    bus.publish(&BusEvent::EnableViewMode);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn publish_carries_payload() {
    let bus = EventBus::new();
    let (_sub, log) = record_events(&bus, Topic::HoverIn);
    let id = Uuid::new_v4();
    bus.publish(&BusEvent::HoverIn(id));
    assert_eq!(log.borrow()[0], BusEvent::HoverIn(id));
}

#[test]
fn other_topics_are_not_delivered() {
    let bus = EventBus::new();
    let (_sub, log) = record_events(&bus, Topic::EnableViewMode);
    bus.publish(&BusEvent::DisableViewMode);
    assert!(log.borrow().is_empty());
}

#[test]
fn handlers_run_in_subscription_order() {
    let bus = EventBus::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let a = Rc::clone(&order);
    let b = Rc::clone(&order);
    let _s1 = bus.subscribe(Topic::Delete, move |_| a.borrow_mut().push(1));
    let _s2 = bus.subscribe(Topic::Delete, move |_| b.borrow_mut().push(2));
    bus.publish(&BusEvent::Delete(crate::record::AnnotationRecord::default()));
    assert_eq!(*order.borrow(), vec![1, 2]);
}

#[test]
fn publish_with_no_subscribers_is_a_noop() {
    let bus = EventBus::new();
    bus.publish(&BusEvent::EnableViewMode);
}

// =============================================================
// Unsubscription
// =============================================================

#[test]
fn dropping_subscription_stops_delivery() {
    let bus = EventBus::new();
    let (sub, log) = record_events(&bus, Topic::EnableViewMode);
    drop(sub);
    bus.publish(&BusEvent::EnableViewMode);
    assert!(log.borrow().is_empty());
}

#[test]
fn subscriber_count_tracks_live_subscriptions() {
    let bus = EventBus::new();
    assert_eq!(bus.subscriber_count(Topic::HoverIn), 0);
    let (s1, _) = record_events(&bus, Topic::HoverIn);
    let (s2, _) = record_events(&bus, Topic::HoverIn);
    assert_eq!(bus.subscriber_count(Topic::HoverIn), 2);
    drop(s1);
    assert_eq!(bus.subscriber_count(Topic::HoverIn), 1);
    drop(s2);
    assert_eq!(bus.subscriber_count(Topic::HoverIn), 0);
}

#[test]
fn subscription_outliving_bus_drops_cleanly() {
    let bus = EventBus::new();
    let (sub, _log) = record_events(&bus, Topic::HoverIn);
    drop(bus);
    drop(sub);
}

// =============================================================
// Dispatch tolerance
// =============================================================

#[test]
fn handler_may_unsubscribe_a_later_handler_mid_dispatch() {
    let bus = EventBus::new();
    let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let killer_view = Rc::clone(&victim);
    let _killer = bus.subscribe(Topic::EnableViewMode, move |_| {
        killer_view.borrow_mut().take();
    });
    let (sub, log) = record_events(&bus, Topic::EnableViewMode);
    *victim.borrow_mut() = Some(sub);

    bus.publish(&BusEvent::EnableViewMode);
    assert!(log.borrow().is_empty(), "handler dropped mid-dispatch must not run");
}

#[test]
fn handler_may_drop_its_own_subscription() {
    let bus = EventBus::new();
    let own: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let own_view = Rc::clone(&own);
    let count = Rc::new(RefCell::new(0));
    let count_view = Rc::clone(&count);
    let sub = bus.subscribe(Topic::EnableViewMode, move |_| {
        *count_view.borrow_mut() += 1;
        own_view.borrow_mut().take();
    });
    *own.borrow_mut() = Some(sub);

    bus.publish(&BusEvent::EnableViewMode);
    bus.publish(&BusEvent::EnableViewMode);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn handler_may_publish_another_topic() {
    let bus = EventBus::new();
    let chained = bus.clone();
    let _relay = bus.subscribe(Topic::EnableViewMode, move |_| {
        chained.publish(&BusEvent::DisableViewMode);
    });
    let (_sub, log) = record_events(&bus, Topic::DisableViewMode);
    bus.publish(&BusEvent::EnableViewMode);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn reentrant_handler_is_skipped_not_looped() {
    let bus = EventBus::new();
    let count = Rc::new(RefCell::new(0));
    let count_view = Rc::clone(&count);
    let reentrant = bus.clone();
    let _sub = bus.subscribe(Topic::EnableViewMode, move |_| {
        let calls = {
            let mut c = count_view.borrow_mut();
            *c += 1;
            *c
        };
        if calls == 1 {
            // Publishing our own topic from inside the handler must not
            // recurse into this handler.
            reentrant.publish(&BusEvent::EnableViewMode);
        }
    });
    bus.publish(&BusEvent::EnableViewMode);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn subscribing_mid_dispatch_does_not_affect_current_publish() {
    let bus = EventBus::new();
    let late_log = Rc::new(RefCell::new(Vec::new()));
    let late_sink = Rc::clone(&late_log);
    let spawner = bus.clone();
    let spawned: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
    let spawned_view = Rc::clone(&spawned);
    let _sub = bus.subscribe(Topic::EnableViewMode, move |_| {
        let sink = Rc::clone(&late_sink);
        let sub = spawner.subscribe(Topic::EnableViewMode, move |e| sink.borrow_mut().push(e.clone()));
        spawned_view.borrow_mut().push(sub);
    });

    bus.publish(&BusEvent::EnableViewMode);
    assert!(late_log.borrow().is_empty(), "a handler added mid-dispatch runs next publish");
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn host_topics_use_camel_case_wire_names() {
    assert_eq!(serde_json::to_value(BusEvent::DeleteSelectedAnnotation).unwrap()["topic"], json!("deleteSelectedAnnotation"));
    assert_eq!(serde_json::to_value(BusEvent::EnableViewMode).unwrap()["topic"], json!("enableViewMode"));
    assert_eq!(serde_json::to_value(BusEvent::DisableViewMode).unwrap()["topic"], json!("disableViewMode"));
}

#[test]
fn annotation_topics_use_lowercase_wire_names() {
    let id = Uuid::new_v4();
    assert_eq!(serde_json::to_value(BusEvent::RectMove(crate::record::AnnotationRecord::default())).unwrap()["topic"], json!("rectmove"));
    assert_eq!(serde_json::to_value(BusEvent::RectMoveEnd(crate::record::AnnotationRecord::default())).unwrap()["topic"], json!("rectmoveend"));
    assert_eq!(serde_json::to_value(BusEvent::HandleHoverIn(id)).unwrap()["topic"], json!("handlehoverin"));
    assert_eq!(serde_json::to_value(BusEvent::HandleHoverOut(id)).unwrap()["topic"], json!("handlehoverout"));
}

#[test]
fn text_changed_carries_id_and_text() {
    let id = Uuid::new_v4();
    let value = serde_json::to_value(BusEvent::TextChanged { id, text: "note".into() }).unwrap();
    assert_eq!(value["topic"], json!("textchanged"));
    assert_eq!(value["payload"]["text"], json!("note"));
    assert_eq!(value["payload"]["id"], json!(id.to_string()));
}

#[test]
fn topic_names_parse_back() {
    for topic in [
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
    ] {
        assert_eq!(Topic::parse(topic.name()), Some(topic));
    }
}

#[test]
fn unknown_topic_does_not_parse() {
    assert_eq!(Topic::parse("resize"), None);
}

#[test]
fn event_topic_matches_subscription_key() {
    assert_eq!(BusEvent::EnableViewMode.topic(), Topic::EnableViewMode);
    assert_eq!(BusEvent::TextChanged { id: Uuid::new_v4(), text: String::new() }.topic(), Topic::TextChanged);
}

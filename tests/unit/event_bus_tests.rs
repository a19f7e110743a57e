//! Listener registration, ordering and removal on `EventBus`.

use std::sync::{Arc, Mutex};

use playstate::events::{EventBus, SessionEvent};

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn FnMut(&SessionEvent) + Send>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let make = move |name: &str| {
        let sink = Arc::clone(&sink);
        let name = name.to_owned();
        Box::new(move |event: &SessionEvent| {
            sink.lock().unwrap().push(format!("{name}:{event:?}"));
        }) as Box<dyn FnMut(&SessionEvent) + Send>
    };
    (log, make)
}

#[test]
fn new_bus_is_empty() {
    let bus = EventBus::new();
    assert!(bus.is_empty());
    assert_eq!(bus.len(), 0);
}

#[test]
fn listeners_fire_in_registration_order() {
    let (log, make) = recorder();
    let mut bus = EventBus::new();
    bus.subscribe(make("a"));
    bus.subscribe(make("b"));

    bus.emit(SessionEvent::Started);
    bus.emit(SessionEvent::ScoreChanged(10));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "a:Started",
            "b:Started",
            "a:ScoreChanged(10)",
            "b:ScoreChanged(10)"
        ]
    );
}

#[test]
fn unsubscribe_stops_delivery() {
    let (log, make) = recorder();
    let mut bus = EventBus::new();
    let first = bus.subscribe(make("a"));
    bus.subscribe(make("b"));

    assert!(bus.unsubscribe(first));
    assert!(!bus.unsubscribe(first), "second removal reports unknown id");

    bus.emit(SessionEvent::Failed);
    assert_eq!(*log.lock().unwrap(), vec!["b:Failed"]);
}

#[test]
fn channel_listener_receives_events() {
    let mut bus = EventBus::new();
    let (_id, mut rx) = bus.subscribe_channel();

    bus.emit(SessionEvent::Started);
    bus.emit(SessionEvent::Finished);

    assert_eq!(rx.try_recv().unwrap(), SessionEvent::Started);
    assert_eq!(rx.try_recv().unwrap(), SessionEvent::Finished);
    assert!(rx.try_recv().is_err());
}

#[test]
fn closed_channel_is_pruned_on_emit() {
    let mut bus = EventBus::new();
    let (_id, rx) = bus.subscribe_channel();
    assert_eq!(bus.len(), 1);

    drop(rx);
    bus.emit(SessionEvent::Started);

    assert!(bus.is_empty());
}

#[test]
fn events_serialize_with_tag() {
    assert_eq!(
        serde_json::to_string(&SessionEvent::Started).unwrap(),
        r#"{"event":"started"}"#
    );
    assert_eq!(
        serde_json::to_string(&SessionEvent::ScoreChanged(30)).unwrap(),
        r#"{"event":"score_changed","score":30}"#
    );
}

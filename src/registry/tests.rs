use std::sync::{Arc, Mutex};

use assert_call::{call, CallRecorder};

use super::*;

#[test]
fn subscribe_and_fire() {
    let mut cr = CallRecorder::new();
    let registry = ListenerRegistry::new();
    let _s = registry.subscribe(|event: &i32| call!("{event}"));

    registry.fire_event(&10);
    registry.fire_event(&20);
    cr.verify(["10", "20"]);
}

#[test]
fn drop_subscription_stops_delivery() {
    let mut cr = CallRecorder::new();
    let registry = ListenerRegistry::new();
    let s = registry.subscribe(|event: &i32| call!("{event}"));

    registry.fire_event(&10);
    drop(s);
    registry.fire_event(&20);
    cr.verify("10");
}

#[test]
fn weak_listener_dies_with_owner() {
    let mut cr = CallRecorder::new();
    let registry = ListenerRegistry::new();
    let listener = Arc::new(FnListener(|event: &i32| call!("{event}")));
    registry.subscribe_weak(&listener);

    registry.fire_event(&10);
    cr.verify("10");
    assert!(registry.has_subscribers());

    drop(listener);
    registry.fire_event(&20);
    cr.verify(());
    assert!(!registry.has_subscribers());
}

#[test]
fn fire_prunes_dead_weak_entries() {
    let registry = ListenerRegistry::<i32>::new();
    let listener = Arc::new(FnListener(|_: &i32| {}));
    registry.subscribe_weak(&listener);
    assert_eq!(registry.listeners.read().unwrap().weak.len(), 1);

    drop(listener);
    registry.fire_event(&1);
    assert!(registry.listeners.read().unwrap().weak.is_empty());
}

#[test]
fn has_subscribers_tracks_strong() {
    let registry = ListenerRegistry::<i32>::new();
    assert!(!registry.has_subscribers());

    let s = registry.subscribe(|_| {});
    assert!(registry.has_subscribers());

    drop(s);
    assert!(!registry.has_subscribers());
}

#[test]
fn fire_reaches_all_listeners() {
    let mut cr = CallRecorder::new();
    let registry = ListenerRegistry::new();
    let _a = registry.subscribe(|event: &i32| call!("a {event}"));
    let _b = registry.subscribe(|event: &i32| call!("b {event}"));

    registry.fire_event(&1);
    cr.verify(assert_call::Call::par(["a 1", "b 1"]));
}

#[test]
fn reentrant_subscribe_during_fire() {
    let registry = Arc::new(ListenerRegistry::<i32>::new());
    let added = Arc::new(Mutex::new(Vec::new()));

    let registry2 = registry.clone();
    let added2 = added.clone();
    let _s = registry.subscribe(move |_: &i32| {
        let s = registry2.subscribe(|_: &i32| {});
        added2.lock().unwrap().push(s);
    });

    registry.fire_event(&1);
    registry.fire_event(&2);
    assert_eq!(added.lock().unwrap().len(), 2);
}

use assert_call::{call, CallRecorder};

use super::*;

#[test]
fn constant() {
    let o = ObservableValue::constant(10);
    assert_eq!(o.get(), Some(10));
    assert!(o.has_value());
    assert!(!o.is_empty());
}

#[test]
fn empty() {
    let o = ObservableValue::<i32>::empty();
    assert_eq!(o.get(), None);
    assert!(o.is_empty());
    assert!(!o.has_value());
}

#[test]
fn clone_shares_value() {
    let a = ObservableValue::constant(10);
    let b = a.clone();
    assert_eq!(b.get(), Some(10));

    a.set(Some(20));
    assert_eq!(b.get(), Some(20));
}

#[test]
fn set_fires_change_event() {
    let mut cr = CallRecorder::new();
    let o = ObservableValue::empty();
    let _s = o.subscribe(|e: &ChangeEvent<i32>| call!("{:?} -> {:?}", e.old_value, e.new_value));

    o.set(Some(1));
    o.set(Some(2));
    cr.verify(["None -> Some(1)", "Some(1) -> Some(2)"]);
}

#[test]
fn set_same_value_does_not_fire() {
    let mut cr = CallRecorder::new();
    let o = ObservableValue::empty();
    let _s = o.subscribe(|e: &ChangeEvent<i32>| call!("{:?}", e.new_value));

    assert!(o.set(Some(1)));
    assert!(!o.set(Some(1)));
    cr.verify("Some(1)");
}

#[test]
fn debug() {
    let o = ObservableValue::constant(10);
    assert_eq!(format!("{o:?}"), "Some(10)");
}

#[test]
fn serialize() {
    let o = ObservableValue::constant(10);
    assert_eq!(serde_json::to_string(&o).unwrap(), "10");

    let e = ObservableValue::<i32>::empty();
    assert_eq!(serde_json::to_string(&e).unwrap(), "null");
}

#[test]
fn deserialize() {
    let o: ObservableValue<i32> = serde_json::from_str("10").unwrap();
    assert_eq!(o.get(), Some(10));
}

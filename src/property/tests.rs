use assert_call::{call, CallRecorder};

use super::*;

#[test]
fn new_is_clean() {
    let p = Property::new(10);
    assert_eq!(p.get(), Some(10));
    assert!(!p.is_dirty());
    assert!(!p.is_read_only());
}

#[test]
fn set_changes_value_and_dirty() {
    let p = Property::new(10);
    p.set(20).unwrap();
    assert_eq!(p.get(), Some(20));
    assert!(p.is_dirty());
}

#[test]
fn set_back_to_baseline_clears_dirty() {
    let p = Property::new(10);
    p.set(20).unwrap();
    assert!(p.is_dirty());

    p.set(10).unwrap();
    assert!(!p.is_dirty());
}

#[test]
fn change_event_sequence() {
    let mut cr = CallRecorder::new();
    let p = Property::empty();
    let _s = p.subscribe(|e: &ChangeEvent<i32>| call!("{:?} -> {:?}", e.old_value, e.new_value));

    p.set(1).unwrap();
    p.set(2).unwrap();
    cr.verify(["None -> Some(1)", "Some(1) -> Some(2)"]);
}

#[test]
fn set_same_value_fires_once() {
    let mut cr = CallRecorder::new();
    let p = Property::empty();
    let _s = p.subscribe(|e: &ChangeEvent<i32>| call!("{:?}", e.new_value));

    p.set(1).unwrap();
    p.set(1).unwrap();
    cr.verify("Some(1)");
}

#[test]
fn dirty_event_fires_only_on_flip() {
    let mut cr = CallRecorder::new();
    let p = Property::new(0);
    let _s = p
        .dirty()
        .subscribe(|e: &ChangeEvent<bool>| call!("{:?}", e.new_value));

    p.set(1).unwrap();
    p.set(2).unwrap();
    p.set(0).unwrap();
    cr.verify(["Some(true)", "Some(false)"]);
}

#[test]
fn value_event_fires_before_dirty_event() {
    let mut cr = CallRecorder::new();
    let p = Property::new(0);
    let _v = p.subscribe(|_: &ChangeEvent<i32>| call!("value"));
    let _d = p
        .dirty()
        .subscribe(|_: &ChangeEvent<bool>| call!("dirty"));

    p.set(1).unwrap();
    cr.verify(["value", "dirty"]);
}

#[test]
fn read_only_rejects_set() {
    let p = Property::new(10);
    p.set_read_only(true);

    assert_eq!(p.set(20), Err(Error::ReadOnly));
    assert_eq!(p.get(), Some(10));
    assert!(!p.is_dirty());

    p.set_read_only(false);
    p.set(20).unwrap();
    assert_eq!(p.get(), Some(20));
}

#[test]
fn read_only_flag_notifies_on_flip() {
    let mut cr = CallRecorder::new();
    let p = Property::new(10);
    let _s = p
        .read_only()
        .subscribe(|e: &ChangeEvent<bool>| call!("{:?}", e.new_value));

    p.set_read_only(true);
    p.set_read_only(true);
    p.set_read_only(false);
    cr.verify(["Some(true)", "Some(false)"]);
}

#[test]
fn set_clean_loads_without_dirtying() {
    let p = Property::new(10);
    p.set_clean(20).unwrap();
    assert_eq!(p.get(), Some(20));
    assert!(!p.is_dirty());

    p.set(30).unwrap();
    assert!(p.is_dirty());
    p.discard();
    assert_eq!(p.get(), Some(20));
}

#[test]
fn reset_dirty_flag_remembers_baseline() {
    let p = Property::new(10);
    p.set(20).unwrap();
    p.reset_dirty_flag();
    assert!(!p.is_dirty());

    p.set(10).unwrap();
    assert!(p.is_dirty());
}

#[test]
fn discard_restores_baseline() {
    let p = Property::new(10);
    p.set(20).unwrap();
    p.discard();
    assert_eq!(p.get(), Some(10));
    assert!(!p.is_dirty());
}

#[test]
fn clear_empties_value() {
    let p = Property::new(10);
    p.clear().unwrap();
    assert!(p.is_empty());
    assert!(p.is_dirty());
}

#[test]
fn serde_round_trip_is_clean() {
    let p = Property::new(10);
    p.set(20).unwrap();

    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "20");

    let q: Property<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(q.get(), Some(20));
    assert!(!q.is_dirty());
}

use std::sync::Arc;

use assert_call::{call, CallRecorder};

use super::*;

#[test]
fn from_fn_calls_on_drop() {
    let mut cr = CallRecorder::new();
    {
        let _s = Subscription::from_fn(|| call!("drop"));
    }
    cr.verify("drop");
}

#[test]
fn empty_is_noop() {
    let mut cr = CallRecorder::new();
    {
        let _s = Subscription::empty();
    }
    cr.verify(());
}

#[test]
fn from_arc_keeps_value_alive() {
    let value = Arc::new(7usize);
    let weak = Arc::downgrade(&value);

    let s = Subscription::from_arc(value);
    assert!(weak.upgrade().is_some());

    drop(s);
    assert!(weak.upgrade().is_none());
}

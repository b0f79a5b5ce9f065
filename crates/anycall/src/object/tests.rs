// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::error::ErrorKind;
use crate::exec::{EventLoop, ExecutionContext};
use crate::function::AnyFunction;
use crate::future::FutureState;
use parking_lot::Mutex;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

fn calculator() -> AnyObject {
    ObjectBuilder::new("Calculator")
        .advertise_method("add", AnyFunction::new(|a: i32, b: i32| a + b))
        .advertise_method("add", AnyFunction::new(|a: f64, b: f64| a + b))
        .advertise_method(
            "fail",
            AnyFunction::new(|| -> i32 { panic!("calculator exploded") }),
        )
        .advertise_signal("computed", "(i)")
        .advertise_property("total", Value::from(0i32))
        .build()
        .expect("valid object")
        .into()
}

fn id_of(object: &AnyObject, name: &str, params: &str) -> u32 {
    let params = Signature::parse(params).expect("signature");
    object
        .meta_object()
        .method_id(name, &params)
        .expect("method registered")
}

#[test]
fn test_add_resolves_and_arity_is_checked() {
    let object = calculator();
    let add = id_of(&object, "add", "(ii)");

    let sum = object.meta_call(add, &[Value::from(2i32), Value::from(3i32)], MetaCallType::Auto);
    assert_eq!(sum.value(WAIT).expect("sum"), Value::from(5i32));

    let wrong = object.meta_call(add, &[Value::from("x")], MetaCallType::Auto);
    assert_eq!(wrong.wait(WAIT), FutureState::FinishedWithError);
    assert_eq!(
        wrong.error().map(|e| e.kind()),
        Some(ErrorKind::ArgumentCountMismatch)
    );
}

#[test]
fn test_unknown_method_fails_immediately() {
    let object = calculator();
    let signal = object.meta_object().signal_id("computed").expect("signal");
    for id in [signal, 999] {
        let future = object.meta_call(id, &[], MetaCallType::Queued);
        assert!(future.is_finished(), "failure is not deferred");
        assert_eq!(future.error().map(|e| e.kind()), Some(ErrorKind::MethodNotFound));
    }
}

#[test]
fn test_panics_become_unknown_exception() {
    let object = calculator();
    let fail = id_of(&object, "fail", "()");
    let future = object.meta_call(fail, &[], MetaCallType::Direct);
    let err = future.value(WAIT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownException);
    assert!(err.message().contains("exploded"), "{}", err);
}

#[test]
fn test_return_signature_is_checked() {
    let object = calculator();
    let add = id_of(&object, "add", "(ii)");
    let args = [Value::from(1i32), Value::from(1i32)];
    let as_double = Signature::parse("d").expect("sig");
    let as_string = Signature::parse("s").expect("sig");
    let ok = object.meta_call_expecting(add, &args, MetaCallType::Direct, Some(&as_double));
    assert_eq!(ok.value(WAIT).expect("int converts to double"), Value::from(2i32));
    let bad = object.meta_call_expecting(add, &args, MetaCallType::Direct, Some(&as_string));
    assert_eq!(bad.error().map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
}

#[test]
fn test_call_by_name_picks_overload() {
    let object = calculator();
    let ints = object.call("add", &[Value::from(2i8), Value::from(3i8)]);
    assert_eq!(ints.value(WAIT).expect("int overload"), Value::from(5i32));
    let floats = object.call("add", &[Value::from(0.5f32), Value::from(0.25f32)]);
    assert_eq!(floats.value(WAIT).expect("double overload"), Value::from(0.75f64));
    let missing = object.call("sub", &[]);
    assert_eq!(missing.error().map(|e| e.kind()), Some(ErrorKind::MethodNotFound));

    let blocking = object.call_blocking("add", &[Value::from(1i32), Value::from(1i32)]);
    assert_eq!(blocking.expect("blocking call"), Value::from(2i32));
}

fn context_reporter(ev: &Arc<EventLoop>) -> (AnyObject, u32) {
    let on_loop = Arc::clone(ev);
    let object: AnyObject = ObjectBuilder::new("ContextReporter")
        .with_context(Arc::clone(ev) as Arc<dyn ExecutionContext>)
        .advertise_method(
            "where",
            AnyFunction::new(move || on_loop.is_in_this_context()),
        )
        .build()
        .expect("valid object")
        .into();
    let id = id_of(&object, "where", "()");
    (object, id)
}

#[test]
fn test_call_types_pick_the_context() {
    let ev = Arc::new(EventLoop::new("test-dispatch", 2));
    let (object, id) = context_reporter(&ev);

    let direct = object.meta_call(id, &[], MetaCallType::Direct);
    assert_eq!(direct.value(WAIT).expect("direct").as_bool(), Some(false));

    let queued = object.meta_call(id, &[], MetaCallType::Queued);
    assert_eq!(queued.value(WAIT).expect("queued").as_bool(), Some(true));

    // caller is not on the loop: Auto schedules
    let auto = object.meta_call(id, &[], MetaCallType::Auto);
    assert_eq!(auto.value(WAIT).expect("auto").as_bool(), Some(true));

    let AnyObject::Local(local) = &object else {
        panic!("local object expected");
    };
    let metrics = local.metrics();
    assert_eq!(metrics.calls, 3);
    assert_eq!(metrics.queued, 2);
    assert_eq!(metrics.completed, 3);
}

#[test]
fn test_auto_runs_inline_on_own_context() {
    let ev = Arc::new(EventLoop::new("test-auto", 1));
    let (object, id) = context_reporter(&ev);
    let outer = object.clone();
    let nested = crate::exec::run_async(ev.as_ref(), move || {
        let inner = outer.meta_call(id, &[], MetaCallType::Auto);
        // inline calls are finished on return
        Ok(Value::from(inner.is_finished()))
    });
    assert_eq!(nested.value(WAIT).expect("ran").as_bool(), Some(true));
}

#[test]
fn test_single_thread_objects_serialize_calls() {
    let active = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicUsize::new(0));
    let (a, o) = (Arc::clone(&active), Arc::clone(&overlap));
    let object: AnyObject = ObjectBuilder::new("Serial")
        .with_threading(ObjectThreadingModel::SingleThread)
        .advertise_method(
            "work",
            AnyFunction::new(move || {
                if a.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                std::thread::sleep(Duration::from_millis(1));
                a.fetch_sub(1, Ordering::SeqCst);
            }),
        )
        .build()
        .expect("valid object")
        .into();
    let id = id_of(&object, "work", "()");
    let calls: Vec<Future> = (0..16)
        .map(|_| object.meta_call(id, &[], MetaCallType::Queued))
        .collect();
    crate::future::wait_for_all(calls, WAIT).expect("all done");
    assert_eq!(overlap.load(Ordering::SeqCst), 0);
}

struct Counter {
    hits: AtomicUsize,
}

#[test]
fn test_methods_receive_native_state() {
    let counter = Arc::new(Counter {
        hits: AtomicUsize::new(0),
    });
    let object: AnyObject = ObjectBuilder::new("Counter")
        .with_native(Arc::clone(&counter))
        .advertise_method(
            "bump",
            AnyFunction::method(|this: &Counter, by: u32| {
                (this.hits.fetch_add(by as usize, Ordering::SeqCst) + by as usize) as u64
            }),
        )
        .build()
        .expect("valid object")
        .into();
    let id = id_of(&object, "bump", "(I)");
    let first = object.meta_call(id, &[Value::from(2u32)], MetaCallType::Auto);
    assert_eq!(first.value(WAIT).expect("bumped").to::<u64>().ok(), Some(2));
    let queued = object.meta_call(id, &[Value::from(3u8)], MetaCallType::Queued);
    queued.wait(WAIT);
    assert_eq!(counter.hits.load(Ordering::SeqCst), 5);
    assert!(object.native::<Counter>().is_some());
    assert!(object.native::<String>().is_none());
}

#[test]
fn test_rejected_calls_count_as_failed() {
    let object = ObjectBuilder::new("Counter")
        .with_native(Arc::new(Counter {
            hits: AtomicUsize::new(0),
        }))
        .advertise_method(
            "bump",
            AnyFunction::method(|this: &Counter, by: u32| {
                this.hits.fetch_add(by as usize, Ordering::SeqCst) as u64
            }),
        )
        .build()
        .expect("valid object");
    let id = id_of(&AnyObject::Local(Arc::clone(&object)), "bump", "(I)");

    let unknown = object.meta_call(999, &[], MetaCallType::Direct);
    assert_eq!(unknown.error().map(|e| e.kind()), Some(ErrorKind::MethodNotFound));
    let expects = Signature::parse("s").expect("signature");
    let args = [Value::from(1u32)];
    let mismatch = object.meta_call_expecting(id, &args, MetaCallType::Direct, Some(&expects));
    assert_eq!(mismatch.error().map(|e| e.kind()), Some(ErrorKind::TypeMismatch));
    let metrics = object.metrics();
    assert_eq!((metrics.calls, metrics.failed, metrics.completed), (2, 2, 0));

    // moved out of its Arc, the object can no longer hand itself to a method
    let detached = Arc::try_unwrap(object).ok().expect("sole owner");
    let orphaned = detached.meta_call(id, &args, MetaCallType::Direct);
    assert_eq!(orphaned.error().map(|e| e.kind()), Some(ErrorKind::UnknownException));
    let metrics = detached.metrics();
    assert_eq!((metrics.calls, metrics.failed, metrics.completed), (3, 3, 0));
}

#[test]
fn test_emit_triggers_subscribers() {
    let object = calculator();
    let signal = object.meta_object().signal_id("computed").expect("signal");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let link = object
        .connect(
            signal,
            SignalSubscriber::callback(move |args| sink.lock().push(args.to_vec())),
        )
        .expect("connect");
    assert_eq!(crate::signal::link_signal_id(link), signal);

    object.meta_emit(signal, &[Value::from(7i32)]).expect("emit");
    assert_eq!(*seen.lock(), vec![vec![Value::from(7i32)]]);

    assert!(object.disconnect(link).expect("known signal"));
    assert!(!object.disconnect(link).expect("known signal"));
    object.meta_emit(signal, &[Value::from(8i32)]).expect("emit");
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn test_emit_on_method_calls_it() {
    let (tx, rx) = crossbeam::channel::bounded(1);
    let object: AnyObject = ObjectBuilder::new("Sink")
        .advertise_method(
            "receive",
            AnyFunction::new(move |v: i32| {
                let _ = tx.send(v);
            }),
        )
        .build()
        .expect("valid object")
        .into();
    let id = id_of(&object, "receive", "(i)");
    object.meta_emit(id, &[Value::from(11i32)]).expect("fallback");
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).expect("called"), 11);

    // failing fallback is only logged
    object.meta_emit(id, &[]).expect("fallback failure not reported");

    let err = object.meta_emit(42, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignalNotFound);
    assert_eq!(
        object
            .connect(id, SignalSubscriber::callback(|_| {}))
            .unwrap_err()
            .kind(),
        ErrorKind::SignalNotFound
    );
}

#[test]
fn test_method_subscribers_follow_the_target() {
    let (tx, rx) = crossbeam::channel::unbounded();
    let target: AnyObject = ObjectBuilder::new("Target")
        .advertise_method(
            "on_value",
            AnyFunction::new(move |v: i64| {
                let _ = tx.send(v);
            }),
        )
        .build()
        .expect("valid object")
        .into();
    let method = id_of(&target, "on_value", "(l)");
    let source = calculator();
    let signal = source.meta_object().signal_id("computed").expect("signal");
    source
        .connect(signal, SignalSubscriber::method(&target, method))
        .expect("connect");

    source.meta_emit(signal, &[Value::from(4i32)]).expect("emit");
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).expect("delivered"), 4);

    drop(target);
    source.meta_emit(signal, &[Value::from(5i32)]).expect("emit");
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_properties_convert_and_notify() {
    let object = calculator();
    let total = object.meta_object().property_id("total").expect("property");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    object
        .connect_named(
            "total",
            SignalSubscriber::callback(move |args| sink.lock().extend_from_slice(args)),
        )
        .expect("change signal");

    object
        .meta_set_property(total, Value::from(3.9f64))
        .value(WAIT)
        .expect("converted");
    assert_eq!(object.meta_property(total).value(WAIT).expect("read"), Value::from(3i32));
    assert_eq!(*seen.lock(), vec![Value::from(3i32)]);

    let err = object
        .meta_set_property(total, Value::from("three"))
        .value(WAIT)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(seen.lock().len(), 1);

    let add = id_of(&object, "add", "(ii)");
    let err = object.meta_property(add).value(WAIT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PropertyNotFound);
}

#[test]
fn test_builder_reports_duplicates() {
    let err = ObjectBuilder::new("Dup")
        .advertise_method("f", AnyFunction::new(|x: i32| x))
        .advertise_method("f", AnyFunction::new(|x: i32| x + 1))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    let err = ObjectBuilder::new("BadSignal")
        .advertise_signal("s", "(i")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn test_handles_compare_by_identity() {
    let a = calculator();
    let b = calculator();
    assert!(a.same_object(&a.clone()));
    assert!(!a.same_object(&b));
    assert_eq!(a.object_type().name(), "Calculator");
    let weak = a.downgrade();
    assert!(weak.upgrade().is_some());
    drop(a);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_call_type_deserializes_lowercase() {
    let parsed: Vec<MetaCallType> =
        serde_json::from_str(r#"["auto","direct","queued"]"#).expect("valid names");
    assert_eq!(
        parsed,
        vec![MetaCallType::Auto, MetaCallType::Direct, MetaCallType::Queued]
    );
}

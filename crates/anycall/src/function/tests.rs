// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::object::{AnyObject, ObjectBuilder};
use crate::types::{TypeKind, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_plain_function_converts_arguments() {
    let add = AnyFunction::new(|a: i32, b: i32| a + b);
    assert_eq!(add.kind(), FunctionKind::Plain);
    assert_eq!(add.parameters().len(), 2);
    assert_eq!(add.return_signature().as_str(), "i");

    let sum = add
        .call(&[Value::from(2i32), Value::from(3i32)])
        .expect("call succeeds");
    assert_eq!(sum, Value::from(5i32));

    let widened = add
        .call(&[Value::from(2.9f64), Value::from(1u8)])
        .expect("convertible arguments");
    assert_eq!(widened, Value::from(3i32));
}

#[test]
fn test_argument_count_is_checked() {
    let add = AnyFunction::new(|a: i32, b: i32| a + b);
    let err = add.call(&[Value::from("x")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentCountMismatch);
}

#[test]
fn test_argument_types_are_checked() {
    let len = AnyFunction::new(|s: String| s.len() as u32);
    let err = len.call(&[Value::from(3i32)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.message().contains("argument 0"), "{}", err);
}

#[test]
fn test_zero_arity_and_void_return() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let bump = AnyFunction::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(bump.parameters_signature().as_str(), "()");
    assert_eq!(bump.return_type().kind(), TypeKind::Void);
    assert!(bump.call(&[]).expect("call").is_void());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_result_errors_propagate() {
    let div = AnyFunction::new(|a: i64, b: i64| -> Result<i64> {
        if b == 0 {
            return Err(Error::new(ErrorKind::UnknownException, "division by zero"));
        }
        Ok(a / b)
    });
    assert_eq!(div.return_signature().as_str(), "l");
    assert_eq!(
        div.call(&[Value::from(9i64), Value::from(3i64)]).expect("ok"),
        Value::from(3i64)
    );
    let err = div
        .call(&[Value::from(1i64), Value::from(0i64)])
        .unwrap_err();
    assert_eq!(err.message(), "division by zero");
}

#[test]
fn test_panics_become_unknown_exception() {
    let boom = AnyFunction::new(|| -> i32 { panic!("kaboom") });
    let err = boom.call(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownException);
    assert_eq!(err.message(), "kaboom");
}

#[test]
fn test_dynamic_sees_raw_arguments() {
    let count = AnyFunction::dynamic(|args: &[Value]| Ok(Value::from(args.len() as u32)));
    assert_eq!(count.kind(), FunctionKind::Dynamic);
    assert_eq!(count.parameters_signature().as_str(), "#m");
    let n = count
        .call(&[Value::from("a"), Value::from(1.5f32), Value::void()])
        .expect("dynamic call");
    assert_eq!(n.to::<u32>().expect("u32"), 3);
}

#[test]
fn test_six_arguments() {
    let f = AnyFunction::new(|a: u8, b: u16, c: u32, d: u64, e: i8, g: String| {
        format!("{}{}{}{}{}{}", a, b, c, d, e, g)
    });
    assert_eq!(f.parameters_signature().as_str(), "(CWILcs)");
    let out = f
        .call(&[
            Value::from(1u8),
            Value::from(2u16),
            Value::from(3u32),
            Value::from(4u64),
            Value::from(-5i8),
            Value::from("z"),
        ])
        .expect("call");
    assert_eq!(out.as_str(), Some("1234-5z"));
}

struct Counter {
    step: i32,
}

#[test]
fn test_method_downcasts_receiver() {
    let object: AnyObject = ObjectBuilder::new("Counter")
        .with_native(Arc::new(Counter { step: 10 }))
        .build()
        .expect("object")
        .into();
    let scaled = AnyFunction::method(|this: &Counter, x: i32| this.step * x);
    assert_eq!(scaled.kind(), FunctionKind::Method);
    assert_eq!(scaled.parameters_signature().as_str(), "(i)");

    let result = scaled
        .call(&[Value::object(object.clone()), Value::from(4i32)])
        .expect("receiver is a Counter");
    assert_eq!(result, Value::from(40i32));

    let wrong = AnyFunction::method(|this: &String| this.len() as u32);
    let err = wrong.call(&[Value::object(object)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.message().contains("receiver"), "{}", err);

    let err = scaled.call(&[Value::from(1i32)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentCountMismatch);
}

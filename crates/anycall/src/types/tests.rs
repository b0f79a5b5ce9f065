// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::error::ErrorKind;
use std::collections::{BTreeMap, HashMap};

#[test]
fn test_descriptors_are_interned() {
    let a = TypeDescriptor::list(&TypeDescriptor::int32());
    let b = TypeDescriptor::parse("[i]").expect("valid");
    let c = <Vec<i32>>::type_descriptor();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.signature().as_str(), "[i]");
    assert_eq!(TypeDescriptor::bool().size(), Some(0));
    assert_eq!(TypeDescriptor::uint16().is_signed(), Some(false));
    assert_ne!(TypeDescriptor::int32(), TypeDescriptor::uint32());
    assert!(TypeDescriptor::int(3, true).is_err());
}

#[test]
fn test_descriptors_from_modifier_signatures() {
    let varargs = TypeDescriptor::parse("#i").expect("valid");
    assert_eq!(varargs, TypeDescriptor::list(&TypeDescriptor::int32()));
    let kwargs = TypeDescriptor::parse("~d").expect("valid");
    assert_eq!(
        kwargs,
        TypeDescriptor::map(&TypeDescriptor::string(), &TypeDescriptor::float64())
    );
    assert!(TypeDescriptor::parse("+i").is_err());
    assert!(TypeDescriptor::parse("ii").is_err());

    let point = TypeDescriptor::parse("(ii)<Point,x,y>").expect("valid");
    assert_eq!(point.struct_name(), Some("Point"));
    assert_eq!(point.field_names(), ["x", "y"]);
    assert_ne!(point, TypeDescriptor::parse("(ii)").expect("valid"));
}

#[test]
fn test_float_to_int_truncates() {
    let v = Value::from(3.9f32);
    let converted = v.convert(&TypeDescriptor::int32()).expect("convertible");
    assert!(converted.owns_storage());
    assert_eq!(converted.into_owned(), Value::from(3i32));

    let negative = Value::from(-2.7f64).convert_to(&TypeDescriptor::int64());
    assert_eq!(negative.expect("convertible"), Value::from(-2i64));
}

#[test]
fn test_string_to_int_fails() {
    let v = Value::from("abc");
    assert!(v.convert(&TypeDescriptor::int32()).is_none());
    let err = v.convert_to(&TypeDescriptor::int32()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_identity_conversion_borrows() {
    let v = Value::from(vec![1i32, 2, 3]);
    let converted = v.convert(v.descriptor()).expect("same type");
    assert!(!converted.owns_storage());
    assert_eq!(converted.view(), v.view());
}

#[test]
fn test_integer_narrowing_is_range_checked() {
    assert_eq!(
        Value::from(200i32).convert_to(&TypeDescriptor::uint8()).expect("fits"),
        Value::from(200u8)
    );
    assert!(Value::from(300i32).convert(&TypeDescriptor::uint8()).is_none());
    assert!(Value::from(-1i32).convert(&TypeDescriptor::uint64()).is_none());
    assert!(Value::from(u64::MAX).convert(&TypeDescriptor::int64()).is_none());
    assert!(Value::from(f64::NAN).convert(&TypeDescriptor::int32()).is_none());
    assert!(Value::from(1e20f64).convert(&TypeDescriptor::int32()).is_none());

    let flag = Value::from(5i32).convert_to(&TypeDescriptor::bool()).expect("bool");
    assert_eq!(flag.as_bool(), Some(true));
}

#[test]
fn test_float_widths() {
    let v = Value::from(0.1f64).convert_to(&TypeDescriptor::float32()).expect("float");
    assert_eq!(v.as_f64(), Some(f64::from(0.1f32)));
    let back = Value::from(1.5f32).convert_to(&TypeDescriptor::float64()).expect("double");
    assert_eq!(back.to::<f64>().expect("f64"), 1.5);
}

#[test]
fn test_containers_convert_element_wise() {
    let ints = Value::from(vec![1i32, 2, 3]);
    let doubles = ints
        .convert_to(&TypeDescriptor::list(&TypeDescriptor::float64()))
        .expect("list of double");
    assert_eq!(doubles.to::<Vec<f64>>().expect("vec"), vec![1.0, 2.0, 3.0]);

    let mut map = BTreeMap::new();
    map.insert("a".to_string(), 1i8);
    map.insert("b".to_string(), 2i8);
    let wide = Value::new(map)
        .convert_to(&TypeDescriptor::map(
            &TypeDescriptor::string(),
            &TypeDescriptor::int64(),
        ))
        .expect("map");
    assert_eq!(wide.get(&Value::from("b")).and_then(|v| v.as_i64()), Some(2));

    let tuple = Value::new((1i32, "x"));
    assert!(tuple
        .convert(&TypeDescriptor::tuple(&[TypeDescriptor::int32()]))
        .is_none());
    let widened = tuple
        .convert_to(&TypeDescriptor::tuple(&[
            TypeDescriptor::float64(),
            TypeDescriptor::string(),
        ]))
        .expect("tuple");
    assert_eq!(widened.element(0).and_then(|v| v.as_f64()), Some(1.0));
}

#[test]
fn test_dynamic_wraps_and_unwraps() {
    let wrapped = Value::from(7u16)
        .convert_to(&TypeDescriptor::dynamic())
        .expect("dynamic");
    assert_eq!(wrapped.kind(), TypeKind::Dynamic);
    assert_eq!(wrapped.dynamic_inner().map(|v| v.kind()), Some(TypeKind::Int));

    let rewrapped = Value::dynamic(wrapped.clone());
    assert_eq!(rewrapped, wrapped);

    let out = wrapped.convert_to(&TypeDescriptor::int32()).expect("int");
    assert_eq!(out, Value::from(7i32));
    assert_eq!(wrapped.to::<i64>().expect("i64"), 7);

    let list_of_dynamic = Value::from(vec![1i32, 2])
        .convert_to(&TypeDescriptor::list(&TypeDescriptor::dynamic()))
        .expect("list");
    assert_eq!(list_of_dynamic.to::<Vec<u32>>().expect("vec"), vec![1, 2]);
}

#[test]
fn test_dynamic_inner_views_the_held_value() {
    let held = Value::dynamic(Value::from("hello"));
    let inner = held.dynamic_inner().expect("dynamic");
    assert_eq!(inner.kind(), TypeKind::String);
    assert_eq!(inner.as_str(), Some("hello"));
    assert_eq!(held.to_string(), inner.to_string());

    let list = Value::from(vec![3i32, 4])
        .convert_to(&TypeDescriptor::list(&TypeDescriptor::dynamic()))
        .expect("list");
    let second = list.element(1).and_then(|e| e.dynamic_inner()).expect("element");
    assert_eq!(second.as_i64(), Some(4));
    assert!(Value::from(1i32).dynamic_inner().is_none());
}

#[test]
fn test_object_types_follow_inheritance() {
    let base = ObjectType::new("Base");
    let mid = ObjectType::new("Mid").with_base(base.clone(), 8);
    let leaf = ObjectType::new("Leaf").with_base(mid.clone(), 16);
    assert_eq!(leaf.inherits(&leaf), Some(0));
    assert_eq!(leaf.inherits(&base), Some(24));
    assert_eq!(base.inherits(&leaf), None);
    assert!(ObjectType::any().is_any());
}

#[test]
fn test_pointers_dereference() {
    let ptr = Value::pointer(Value::from(41i32));
    assert_eq!(ptr.kind(), TypeKind::Pointer);
    assert_eq!(ptr.pointee().and_then(|v| v.as_i64()), Some(41));
    let value = ptr.convert_to(&TypeDescriptor::int64()).expect("deref");
    assert_eq!(value, Value::from(41i64));
    let other = ptr
        .convert_to(&TypeDescriptor::pointer(&TypeDescriptor::float64()))
        .expect("pointee converted");
    assert_eq!(other.pointee().and_then(|v| v.as_f64()), Some(41.0));
}

#[test]
fn test_void_and_defaults() {
    assert!(Value::void().is_void());
    assert_eq!(Value::default(), Value::void());
    assert!(Value::void().convert(&TypeDescriptor::void()).is_some());
    assert!(Value::void().convert(&TypeDescriptor::int32()).is_none());

    let point = TypeDescriptor::parse("(is)<P,n,s>").expect("valid");
    let zero = Value::default_for(&point).expect("default");
    assert_eq!(zero.field("n").and_then(|v| v.as_i64()), Some(0));
    assert_eq!(zero.field("s").and_then(|v| v.as_str()), Some(""));
    assert!(Value::default_for(&TypeDescriptor::any_object()).is_none());
}

#[test]
fn test_native_round_trips() {
    assert!(Value::from(true).to::<bool>().expect("bool"));
    assert_eq!(Value::from(-5i8).to::<i8>().expect("i8"), -5);
    assert_eq!(Value::from("hey").to::<String>().expect("string"), "hey");
    assert_eq!(
        Value::from(RawBuffer(vec![0, 1, 2])).to::<RawBuffer>().expect("raw"),
        RawBuffer(vec![0, 1, 2])
    );
    let tuple = Value::new((1u8, 2.5f64, "z".to_string()));
    assert_eq!(
        tuple.to::<(u8, f64, String)>().expect("tuple"),
        (1, 2.5, "z".to_string())
    );
    let mut hm = HashMap::new();
    hm.insert(3u32, vec!["a".to_string()]);
    let v = Value::new(hm.clone());
    assert_eq!(v.signature().as_str(), "{I[s]}");
    assert_eq!(v.to::<HashMap<u32, Vec<String>>>().expect("map"), hm);
    assert!(Value::from("x").to::<i32>().is_err());
}

#[test]
fn test_map_equality_ignores_order() {
    let a = Value::map(
        &TypeDescriptor::int32(),
        &TypeDescriptor::string(),
        vec![(1i32.into(), "a".into()), (2i32.into(), "b".into())],
    )
    .expect("map");
    let b = Value::map(
        &TypeDescriptor::int32(),
        &TypeDescriptor::string(),
        vec![(2i32.into(), "b".into()), (1i32.into(), "a".into())],
    )
    .expect("map");
    assert_eq!(a, b);
}

#[test]
fn test_builders_check_element_types() {
    let list = Value::list(&TypeDescriptor::int16(), vec![1u8.into(), 2i64.into()]).expect("fits");
    assert_eq!(list.to::<Vec<i16>>().expect("vec"), vec![1, 2]);
    let err = Value::list(&TypeDescriptor::int16(), vec!["no".into()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let s = Value::named_tuple("Pair", &["left", "right"], vec![1i32.into(), "r".into()])
        .expect("struct");
    assert_eq!(s.signature().as_str(), "(is)<Pair,left,right>");
    assert_eq!(s.field("right").and_then(|v| v.as_str()), Some("r"));
    assert!(s.field("middle").is_none());
    assert_eq!(s.to_string(), "Pair(left: 1, right: \"r\")");
}

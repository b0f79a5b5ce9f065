// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire encodings for values: binary (calls, replies, signals) and JSON.

pub mod binary;
pub mod cursor;
pub mod json;

pub use cursor::{Cursor, Writer};
pub use json::{from_json, to_json, to_json_with};

use crate::error::{Error, Result};
use crate::signature::Signature;
use crate::types::{TypeDescriptor, Value, ValueRef};

/// Binary encoding of one value.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    encode_ref(value.view())
}

/// Binary encoding of a borrowed value.
pub fn encode_ref(value: ValueRef<'_>) -> Result<Vec<u8>> {
    let mut out = Writer::new();
    binary::encode_into(value, &mut out)?;
    Ok(out.into_inner())
}

/// Decode exactly one value of type `desc`; trailing bytes are an error.
pub fn decode(desc: &TypeDescriptor, bytes: &[u8]) -> Result<Value> {
    let mut cursor = Cursor::new(bytes);
    let value = binary::decode_from(desc, &mut cursor)?;
    if !cursor.is_eof() {
        return Err(Error::deserialization(
            cursor.offset(),
            format!("{} trailing bytes", cursor.remaining()),
        ));
    }
    Ok(value)
}

/// Encode an argument list as one tuple. Returns the tuple signature.
pub fn encode_args(args: &[Value]) -> Result<(Signature, Vec<u8>)> {
    let signature = args_signature(args);
    let mut out = Writer::new();
    for arg in args {
        binary::encode_into(arg.view(), &mut out)?;
    }
    Ok((signature, out.into_inner()))
}

/// Decode an argument tuple written by [`encode_args`].
pub fn decode_args(signature: &Signature, bytes: &[u8]) -> Result<Vec<Value>> {
    let desc = TypeDescriptor::from_signature(signature)?;
    let tuple = decode(&desc, bytes)?;
    if desc.members().is_none() {
        return Err(Error::deserialization(
            0,
            format!("argument signature '{}' is not a tuple", signature),
        ));
    }
    Ok(tuple.elements().into_iter().map(|v| v.to_owned()).collect())
}

/// Tuple signature of an argument list, e.g. `(is)`.
pub fn args_signature(args: &[Value]) -> Signature {
    Signature::tuple(args.iter().map(|a| a.signature()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::RawBuffer;
    use std::collections::BTreeMap;

    fn round_trip(value: &Value) -> Value {
        let bytes = encode(value).expect("encodable");
        decode(value.descriptor(), &bytes).expect("decodable")
    }

    #[test]
    fn test_scalar_layout() {
        assert_eq!(encode(&Value::from(true)).expect("bool"), [1]);
        assert_eq!(
            encode(&Value::from(0x0102i16)).expect("i16"),
            [0x02, 0x01]
        );
        assert_eq!(encode(&Value::from(1.0f32)).expect("f32"), 1.0f32.to_le_bytes());
        assert_eq!(
            encode(&Value::from("ab")).expect("string"),
            [2, 0, 0, 0, b'a', b'b']
        );
        assert!(encode(&Value::void()).expect("void").is_empty());
    }

    #[test]
    fn test_container_layout() {
        let list = Value::from(vec![7u8, 8]);
        assert_eq!(encode(&list).expect("list"), [2, 0, 0, 0, 7, 8]);
        let tuple = Value::new((1u8, 2u8));
        assert_eq!(encode(&tuple).expect("tuple"), [1, 2]);
        let dynamic = Value::dynamic(Value::from(5u8));
        assert_eq!(encode(&dynamic).expect("dynamic"), [1, 0, 0, 0, b'C', 5]);
    }

    #[test]
    fn test_values_round_trip() {
        let mut map = BTreeMap::new();
        map.insert(1i32, vec!["one".to_string()]);
        map.insert(-2i32, Vec::new());
        let samples = vec![
            Value::from(-7i8),
            Value::from(u64::MAX),
            Value::from(std::f64::consts::E),
            Value::from("héllo"),
            Value::from(RawBuffer(vec![0, 255, 3])),
            Value::new(map),
            Value::new((1i32, "x", 2.5f32)),
            Value::named_tuple("P", &["a"], vec![Value::from(9u16)]).expect("struct"),
            Value::dynamic(Value::from(vec![1i64, 2])),
            Value::dynamic(Value::void()),
        ];
        for sample in &samples {
            assert_eq!(&round_trip(sample), sample, "{:?}", sample);
        }
    }

    #[test]
    fn test_args_round_trip() {
        let args = vec![Value::from(2i32), Value::from("three")];
        let (signature, bytes) = encode_args(&args).expect("encodable");
        assert_eq!(signature.as_str(), "(is)");
        assert_eq!(decode_args(&signature, &bytes).expect("decodable"), args);

        let (empty, bytes) = encode_args(&[]).expect("empty");
        assert_eq!(empty.as_str(), "()");
        assert!(decode_args(&empty, &bytes).expect("decodable").is_empty());
    }

    #[test]
    fn test_objects_and_pointers_rejected() {
        let ptr = Value::pointer(Value::from(1i32));
        let err = encode(&ptr).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationFailure);
    }

    #[test]
    fn test_malformed_input_fails_cleanly() {
        let desc = TypeDescriptor::parse("[s]").expect("valid");
        let err = decode(&desc, &[1, 0, 0, 0, 9, 0, 0, 0, b'x']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailure);

        let err = decode(&TypeDescriptor::int32(), &[1, 2, 3, 4, 5]).unwrap_err();
        assert!(err.message().contains("trailing"), "{}", err);

        let err = decode(&TypeDescriptor::string(), &[2, 0, 0, 0, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailure);

        let bad_sig = [1, 0, 0, 0, b'!'];
        let err = decode(&TypeDescriptor::dynamic(), &bad_sig).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailure);

        let huge = [0xff, 0xff, 0xff, 0xff];
        assert!(decode(&TypeDescriptor::parse("[i]").expect("valid"), &huge).is_err());
        assert!(decode(&TypeDescriptor::parse("[v]").expect("valid"), &huge).is_err());
    }

    #[test]
    fn test_deep_dynamic_nesting_rejected() {
        let text = format!("{}i{}", "[".repeat(100), "]".repeat(100));
        let mut bytes = (text.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(text.as_bytes());
        let err = decode(&TypeDescriptor::dynamic(), &bytes).unwrap_err();
        assert!(err.message().contains("too deep"), "{}", err);
    }

    #[test]
    fn test_json_encoding() {
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), 1i32);
        assert_eq!(to_json_with(Value::new(map).view(), false), r#"{"k":1}"#);

        let mut by_int = BTreeMap::new();
        by_int.insert(3i32, "x".to_string());
        assert_eq!(
            to_json_with(Value::new(by_int).view(), false),
            r#"[[3,"x"]]"#
        );

        let s = Value::named_tuple("P", &["a", "b"], vec![1i32.into(), "q\"".into()])
            .expect("struct");
        assert_eq!(to_json_with(s.view(), false), r#"{"a":1,"b":"q\""}"#);
        assert_eq!(
            to_json_with(Value::new((true, 1.5f64)).view(), false),
            "[true,1.5]"
        );
        assert_eq!(
            to_json_with(Value::dynamic(Value::void()).view(), false),
            "null"
        );
        assert_eq!(
            to_json_with(Value::raw(vec![1]).view(), false),
            r#""Error: no serialization for raw""#
        );
    }

    #[test]
    fn test_json_decoding() {
        let value = from_json(r#"{"a": [1, 2.5, "x", null, true], "b": 18446744073709551615}"#)
            .expect("valid JSON");
        let inner = value.dynamic_inner().expect("dynamic");
        let a = inner.get(&Value::from("a")).expect("key a");
        let list = a.dynamic_inner().expect("dynamic list");
        assert_eq!(list.len(), Some(5));
        assert_eq!(list.element(0).and_then(|v| v.to::<i64>().ok()), Some(1));
        assert_eq!(list.element(1).and_then(|v| v.to::<f64>().ok()), Some(2.5));
        assert_eq!(list.element(3).and_then(|v| v.dynamic_inner()).map(|v| v.is_void()), Some(true));
        let b = inner.get(&Value::from("b")).expect("key b");
        assert_eq!(b.to::<u64>().expect("u64"), u64::MAX);

        let err = from_json("{oops").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailure);
        assert!(err.message().contains("line 1"), "{}", err);
    }
}

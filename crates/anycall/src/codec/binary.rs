// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary value encoding.
//!
//! Layout per kind:
//!
//! | Kind | Bytes |
//! |------|-------|
//! | void | nothing |
//! | bool | one byte, 0 or 1 |
//! | int / float | natural width, little-endian |
//! | string / raw | `u32` length then bytes |
//! | list | `u32` count then elements |
//! | map | `u32` count then key, value per entry |
//! | tuple | members in order, no count |
//! | dynamic | signature string (as a string) then the held value |
//!
//! Objects and pointers need a transport context and are rejected.

use super::cursor::{Cursor, Writer};
use crate::error::{Error, ErrorKind, Result};
use crate::types::{Data, Shape, TypeDescriptor, Value, ValueRef};

/// Deepest container/dynamic nesting accepted while decoding.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Upper bound on element counts for zero-sized element types.
const MAX_ZERO_SIZED_ELEMENTS: usize = 1 << 16;

// =======================================================================
// Encoder
// =======================================================================

/// Append the encoding of `value` to `out`.
pub fn encode_into(value: ValueRef<'_>, out: &mut Writer) -> Result<()> {
    encode_data(value.descriptor(), value.data(), out)
}

fn encode_data(desc: &TypeDescriptor, data: &Data, out: &mut Writer) -> Result<()> {
    match (desc.shape(), data) {
        (Shape::Void, _) => {}
        (Shape::Int { size: 0, .. }, Data::Bool(b)) => out.write_u8(u8::from(*b)),
        (Shape::Int { size, signed: true }, Data::Int(v)) => {
            let v = *v;
            match size {
                1 => out.write_i8(narrow(v)?),
                2 => out.write_i16_le(narrow(v)?),
                4 => out.write_i32_le(narrow(v)?),
                _ => out.write_i64_le(v),
            }
        }
        (Shape::Int { size, signed: false }, Data::UInt(v)) => {
            let v = *v;
            match size {
                1 => out.write_u8(narrow(v)?),
                2 => out.write_u16_le(narrow(v)?),
                4 => out.write_u32_le(narrow(v)?),
                _ => out.write_u64_le(v),
            }
        }
        (Shape::Float { size: 4 }, Data::Float(v)) => out.write_f32_le(*v as f32),
        (Shape::Float { .. }, Data::Float(v)) => out.write_f64_le(*v),
        (Shape::String, Data::String(s)) => out.write_prefixed(s.as_bytes())?,
        (Shape::Raw, Data::Raw(bytes)) => out.write_prefixed(bytes)?,
        (Shape::List(element), Data::List(items)) => {
            out.write_len(items.len())?;
            for item in items {
                encode_data(element, item, out)?;
            }
        }
        (Shape::Map(key, value), Data::Map(entries)) => {
            out.write_len(entries.len())?;
            for (k, v) in entries {
                encode_data(key, k, out)?;
                encode_data(value, v, out)?;
            }
        }
        (Shape::Tuple { members, .. }, Data::Tuple(items)) if members.len() == items.len() => {
            for (member, item) in members.iter().zip(items) {
                encode_data(member, item, out)?;
            }
        }
        (Shape::Dynamic, Data::Dynamic(inner)) => {
            out.write_prefixed(inner.signature().as_str().as_bytes())?;
            encode_data(inner.descriptor(), inner.data(), out)?;
        }
        (Shape::Object(_), _) | (Shape::Pointer(_), _) => {
            return Err(Error::new(
                ErrorKind::SerializationFailure,
                format!("cannot serialize {} without a transport context", desc),
            ));
        }
        _ => {
            return Err(Error::new(
                ErrorKind::SerializationFailure,
                format!("storage does not match descriptor {}", desc),
            ));
        }
    }
    Ok(())
}

fn narrow<S, D: TryFrom<S>>(v: S) -> Result<D> {
    D::try_from(v).map_err(|_| {
        Error::new(
            ErrorKind::SerializationFailure,
            "integer does not fit its declared width",
        )
    })
}

// =======================================================================
// Decoder
// =======================================================================

/// Decode one value of type `desc` at the cursor position.
pub fn decode_from(desc: &TypeDescriptor, cursor: &mut Cursor<'_>) -> Result<Value> {
    let data = decode_data(desc, cursor, 0)?;
    Ok(Value::from_parts(desc.clone(), data))
}

fn decode_data(desc: &TypeDescriptor, cursor: &mut Cursor<'_>, depth: usize) -> Result<Data> {
    if depth > MAX_DECODE_DEPTH {
        return Err(Error::deserialization(
            cursor.offset(),
            "value nesting too deep",
        ));
    }
    let data = match desc.shape() {
        Shape::Void => Data::Void,
        Shape::Int { size: 0, .. } => Data::Bool(cursor.read_u8()? != 0),
        Shape::Int { size, signed: true } => Data::Int(match size {
            1 => i64::from(cursor.read_i8()?),
            2 => i64::from(cursor.read_i16_le()?),
            4 => i64::from(cursor.read_i32_le()?),
            _ => cursor.read_i64_le()?,
        }),
        Shape::Int { size, .. } => Data::UInt(match size {
            1 => u64::from(cursor.read_u8()?),
            2 => u64::from(cursor.read_u16_le()?),
            4 => u64::from(cursor.read_u32_le()?),
            _ => cursor.read_u64_le()?,
        }),
        Shape::Float { size: 4 } => Data::Float(f64::from(cursor.read_f32_le()?)),
        Shape::Float { .. } => Data::Float(cursor.read_f64_le()?),
        Shape::String => Data::String(read_string(cursor)?),
        Shape::Raw => Data::Raw(cursor.read_prefixed()?.to_vec()),
        Shape::List(element) => {
            let count = read_count(element, cursor)?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(decode_data(element, cursor, depth + 1)?);
            }
            Data::List(items)
        }
        Shape::Map(key, value) => {
            let min = min_size(key).saturating_add(min_size(value));
            let at = cursor.offset();
            let count = cursor.read_u32_le()? as usize;
            check_count(count, min, cursor, at)?;
            let mut entries = Vec::new();
            for _ in 0..count {
                let k = decode_data(key, cursor, depth + 1)?;
                let v = decode_data(value, cursor, depth + 1)?;
                entries.push((k, v));
            }
            Data::Map(entries)
        }
        Shape::Tuple { members, .. } => Data::Tuple(
            members
                .iter()
                .map(|member| decode_data(member, cursor, depth + 1))
                .collect::<Result<Vec<Data>>>()?,
        ),
        Shape::Dynamic => {
            let at = cursor.offset();
            let text = read_string(cursor)?;
            let inner_desc = dynamic_descriptor(&text, at)?;
            let inner = decode_data(&inner_desc, cursor, depth + 1)?;
            Data::Dynamic(Box::new(Value::from_parts(inner_desc, inner)))
        }
        Shape::Object(_) | Shape::Pointer(_) => {
            return Err(Error::deserialization(
                cursor.offset(),
                format!("cannot deserialize {} without a transport context", desc),
            ));
        }
    };
    Ok(data)
}

fn read_string(cursor: &mut Cursor<'_>) -> Result<String> {
    let at = cursor.offset();
    let bytes = cursor.read_prefixed()?;
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::deserialization(at, e))
}

fn read_count(element: &TypeDescriptor, cursor: &mut Cursor<'_>) -> Result<usize> {
    let at = cursor.offset();
    let count = cursor.read_u32_le()? as usize;
    check_count(count, min_size(element), cursor, at)?;
    Ok(count)
}

fn check_count(count: usize, min: usize, cursor: &Cursor<'_>, at: usize) -> Result<()> {
    let fits = if min == 0 {
        count <= MAX_ZERO_SIZED_ELEMENTS
    } else {
        count.saturating_mul(min) <= cursor.remaining()
    };
    if fits {
        Ok(())
    } else {
        Err(Error::deserialization(
            at,
            format!(
                "count {} exceeds remaining {} bytes",
                count,
                cursor.remaining()
            ),
        ))
    }
}

/// Smallest possible encoding of a value of `desc`.
fn min_size(desc: &TypeDescriptor) -> usize {
    match desc.shape() {
        Shape::Void => 0,
        Shape::Int { size: 0, .. } => 1,
        Shape::Int { size, .. } | Shape::Float { size } => usize::from(*size),
        Shape::String | Shape::Raw | Shape::List(_) | Shape::Map(..) => 4,
        Shape::Dynamic => 5,
        Shape::Tuple { members, .. } => members.iter().map(min_size).sum(),
        Shape::Object(_) | Shape::Pointer(_) => 1,
    }
}

fn dynamic_descriptor(text: &str, at: usize) -> Result<TypeDescriptor> {
    let mut depth = 0usize;
    for c in text.bytes() {
        match c {
            b'[' | b'{' | b'(' => {
                depth += 1;
                if depth > MAX_DECODE_DEPTH {
                    return Err(Error::deserialization(at, "signature nesting too deep"));
                }
            }
            b']' | b'}' | b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    TypeDescriptor::parse(text).map_err(|e| {
        Error::deserialization(at, format!("bad dynamic signature '{}': {}", text, e.message()))
    })
}

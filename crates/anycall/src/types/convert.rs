// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value conversion between descriptors.
//!
//! Order of rules: identity, wrap into dynamic, unwrap out of dynamic,
//! numeric (same kind or int/float promotion), containers element by
//! element, objects by inheritance, pointers by pointee. Anything else fails.

use super::descriptor::Shape;
use super::value::{Converted, Data, Value, ValueRef};
use super::TypeDescriptor;
use std::sync::Arc;

pub(super) fn convert<'a>(source: ValueRef<'a>, target: &TypeDescriptor) -> Option<Converted<'a>> {
    if source.descriptor() == target {
        return Some(Converted::Borrowed(source));
    }
    convert_data(source, target)
        .map(|data| Converted::Owned(Value::from_parts(target.clone(), data)))
}

/// Child conversion: identical descriptors only copy.
fn convert_child(desc: &TypeDescriptor, data: &Data, target: &TypeDescriptor) -> Option<Data> {
    if desc == target {
        return Some(data.clone());
    }
    convert_data(ValueRef::new(desc, data), target)
}

fn convert_data(source: ValueRef<'_>, target: &TypeDescriptor) -> Option<Data> {
    let src_shape = source.descriptor().shape();
    let data = source.data();

    if matches!(target.shape(), Shape::Dynamic) {
        let inner = match data {
            Data::Dynamic(inner) => (**inner).clone(),
            _ => source.to_owned(),
        };
        return Some(Data::Dynamic(Box::new(inner)));
    }
    if let Data::Dynamic(inner) = data {
        return convert_child(inner.descriptor(), inner.data(), target);
    }

    match (src_shape, target.shape()) {
        (Shape::Int { .. }, Shape::Int { size, signed }) => int_to_int(data, *size, *signed),
        (Shape::Float { .. }, Shape::Float { size }) => {
            let Data::Float(v) = *data else { return None };
            Some(Data::Float(narrow_float(v, *size)))
        }
        (Shape::Int { .. }, Shape::Float { size }) => {
            let v = match *data {
                Data::Bool(b) => f64::from(u8::from(b)),
                Data::Int(v) => v as f64,
                Data::UInt(v) => v as f64,
                _ => return None,
            };
            Some(Data::Float(narrow_float(v, *size)))
        }
        (Shape::Float { .. }, Shape::Int { size, signed }) => {
            let Data::Float(v) = *data else { return None };
            float_to_int(v, *size, *signed)
        }
        (Shape::String, Shape::String) | (Shape::Raw, Shape::Raw) | (Shape::Void, Shape::Void) => {
            Some(data.clone())
        }
        (Shape::List(from), Shape::List(to)) => {
            let Data::List(items) = data else { return None };
            let items = items
                .iter()
                .map(|item| convert_child(from, item, to))
                .collect::<Option<Vec<Data>>>()?;
            Some(Data::List(items))
        }
        (Shape::Map(from_k, from_v), Shape::Map(to_k, to_v)) => {
            let Data::Map(entries) = data else {
                return None;
            };
            let entries = entries
                .iter()
                .map(|(k, v)| {
                    Some((
                        convert_child(from_k, k, to_k)?,
                        convert_child(from_v, v, to_v)?,
                    ))
                })
                .collect::<Option<Vec<(Data, Data)>>>()?;
            Some(Data::Map(entries))
        }
        (Shape::Tuple { members: from, .. }, Shape::Tuple { members: to, .. }) => {
            let Data::Tuple(items) = data else {
                return None;
            };
            if from.len() != to.len() || items.len() != from.len() {
                return None;
            }
            let items = from
                .iter()
                .zip(to)
                .zip(items)
                .map(|((f, t), item)| convert_child(f, item, t))
                .collect::<Option<Vec<Data>>>()?;
            Some(Data::Tuple(items))
        }
        (Shape::Object(from), Shape::Object(to)) => {
            if to.is_any() || from.inherits(to).is_some() {
                Some(data.clone())
            } else {
                // the runtime type may be more derived than the static one
                let Data::Object(object) = data else {
                    return None;
                };
                object
                    .object_type()
                    .inherits(to)
                    .map(|_| data.clone())
            }
        }
        (Shape::Pointer(from), Shape::Pointer(to)) => {
            let Data::Pointer(pointee) = data else {
                return None;
            };
            if from == to {
                return Some(Data::Pointer(Arc::clone(pointee)));
            }
            let converted = convert_child(from, pointee, to)?;
            Some(Data::Pointer(Arc::new(converted)))
        }
        (Shape::Pointer(from), _) => {
            let Data::Pointer(pointee) = data else {
                return None;
            };
            convert_child(from, pointee, target)
        }
        (Shape::Object(_), Shape::Pointer(to)) if matches!(to.shape(), Shape::Object(_)) => {
            let converted = convert_child(source.descriptor(), data, to)?;
            Some(Data::Pointer(Arc::new(converted)))
        }
        _ => None,
    }
}

fn narrow_float(v: f64, size: u8) -> f64 {
    if size == 4 {
        f64::from(v as f32)
    } else {
        v
    }
}

fn int_to_int(data: &Data, size: u8, signed: bool) -> Option<Data> {
    let wide: i128 = match *data {
        Data::Bool(b) => i128::from(b),
        Data::Int(v) => i128::from(v),
        Data::UInt(v) => i128::from(v),
        _ => return None,
    };
    fit_int(wide, size, signed)
}

fn float_to_int(v: f64, size: u8, signed: bool) -> Option<Data> {
    if v.is_nan() {
        return None;
    }
    if size == 0 {
        return Some(Data::Bool(v != 0.0));
    }
    let truncated = v.trunc();
    if truncated < i128::MIN as f64 || truncated > i128::MAX as f64 {
        return None;
    }
    fit_int(truncated as i128, size, signed)
}

/// Range-checked placement of an integer into a sized slot.
fn fit_int(v: i128, size: u8, signed: bool) -> Option<Data> {
    if size == 0 {
        return Some(Data::Bool(v != 0));
    }
    let bits = u32::from(size) * 8;
    if signed {
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        (min..=max)
            .contains(&v)
            .then(|| i64::try_from(v).ok().map(Data::Int))
            .flatten()
    } else {
        let max = (1i128 << bits) - 1;
        (0..=max)
            .contains(&v)
            .then(|| u64::try_from(v).ok().map(Data::UInt))
            .flatten()
    }
}

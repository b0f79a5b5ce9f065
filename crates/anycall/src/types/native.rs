// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping between native Rust types and type-erased values.

use super::value::{Data, Value, ValueRef};
use super::TypeDescriptor;
use crate::object::AnyObject;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Native type with a runtime descriptor.
pub trait Typed {
    fn type_descriptor() -> TypeDescriptor;
}

/// Native type that can be moved into a [`Value`].
pub trait IntoValue: Typed {
    fn into_value(self) -> Value;
}

/// Native type that can be read back from a value of its own descriptor.
///
/// Callers convert first (see [`ValueRef::to`]); `from_value` only reads
/// storage that already has `Self::type_descriptor()`.
pub trait FromValue: Typed + Sized {
    fn from_value(value: ValueRef<'_>) -> Option<Self>;
}

/// Opaque byte buffer (the `r` signature).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawBuffer(pub Vec<u8>);

// =======================================================================
// Scalars
// =======================================================================

macro_rules! impl_signed {
    ($($ty:ty => $ctor:ident),* $(,)?) => {$(
        impl Typed for $ty {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::$ctor()
            }
        }

        impl IntoValue for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::from_parts(TypeDescriptor::$ctor(), Data::Int(i64::from(self)))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: ValueRef<'_>) -> Option<Self> {
                <$ty>::try_from(value.as_i64()?).ok()
            }
        }

        impl From<$ty> for Value {
            #[inline]
            fn from(v: $ty) -> Self {
                v.into_value()
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty => $ctor:ident),* $(,)?) => {$(
        impl Typed for $ty {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::$ctor()
            }
        }

        impl IntoValue for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::from_parts(TypeDescriptor::$ctor(), Data::UInt(u64::from(self)))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: ValueRef<'_>) -> Option<Self> {
                <$ty>::try_from(value.as_u64()?).ok()
            }
        }

        impl From<$ty> for Value {
            #[inline]
            fn from(v: $ty) -> Self {
                v.into_value()
            }
        }
    )*};
}

impl_signed!(i8 => int8, i16 => int16, i32 => int32, i64 => int64);
impl_unsigned!(u8 => uint8, u16 => uint16, u32 => uint32, u64 => uint64);

impl Typed for bool {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::bool()
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::bool(), Data::Bool(self))
    }
}

impl FromValue for bool {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value.as_bool()
    }
}

impl Typed for f32 {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::float32()
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::float32(), Data::Float(f64::from(self)))
    }
}

impl FromValue for f32 {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match *value.data() {
            Data::Float(v) => Some(v as f32),
            _ => None,
        }
    }
}

impl Typed for f64 {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::float64()
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::float64(), Data::Float(self))
    }
}

impl FromValue for f64 {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match *value.data() {
            Data::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl Typed for () {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::void()
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::void()
    }
}

impl FromValue for () {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value.is_void().then_some(())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::void()
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(v: $ty) -> Self {
                v.into_value()
            }
        }
    )*};
}

impl_from_scalar!(bool, f32, f64);

// =======================================================================
// Strings and buffers
// =======================================================================

impl Typed for String {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::string()
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::string(), Data::String(self))
    }
}

impl FromValue for String {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Typed for &str {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::string()
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::string(), Data::String(self.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        v.into_value()
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        v.into_value()
    }
}

impl Typed for RawBuffer {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::raw()
    }
}

impl IntoValue for RawBuffer {
    fn into_value(self) -> Value {
        Value::raw(self.0)
    }
}

impl FromValue for RawBuffer {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value.as_raw().map(|bytes| RawBuffer(bytes.to_vec()))
    }
}

impl From<RawBuffer> for Value {
    fn from(v: RawBuffer) -> Self {
        v.into_value()
    }
}

// =======================================================================
// Dynamic and objects
// =======================================================================

/// `Value` maps to the dynamic type.
impl Typed for Value {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::dynamic()
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        Value::dynamic(self)
    }
}

impl FromValue for Value {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        Some(match value.dynamic_inner() {
            Some(inner) => inner.to_owned(),
            None => value.to_owned(),
        })
    }
}

impl Typed for AnyObject {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::any_object()
    }
}

impl IntoValue for AnyObject {
    fn into_value(self) -> Value {
        Value::from_parts(TypeDescriptor::any_object(), Data::Object(self))
    }
}

impl FromValue for AnyObject {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl From<AnyObject> for Value {
    fn from(v: AnyObject) -> Self {
        Value::object(v)
    }
}

// =======================================================================
// Containers
// =======================================================================

impl<T: Typed> Typed for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(&T::type_descriptor())
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        let items = self
            .into_iter()
            .map(|item| item.into_value().into_data())
            .collect();
        Value::from_parts(Self::type_descriptor(), Data::List(items))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        value
            .elements()
            .into_iter()
            .map(|item| T::from_value(item))
            .collect()
    }
}

impl<T: IntoValue> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        v.into_value()
    }
}

macro_rules! impl_map {
    ($map:ident, $($bound:path),+) => {
        impl<K: Typed, V: Typed> Typed for $map<K, V> {
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::map(&K::type_descriptor(), &V::type_descriptor())
            }
        }

        impl<K: IntoValue, V: IntoValue> IntoValue for $map<K, V> {
            fn into_value(self) -> Value {
                let entries = self
                    .into_iter()
                    .map(|(k, v)| (k.into_value().into_data(), v.into_value().into_data()))
                    .collect();
                Value::from_parts(Self::type_descriptor(), Data::Map(entries))
            }
        }

        impl<K: FromValue $(+ $bound)+, V: FromValue> FromValue for $map<K, V> {
            fn from_value(value: ValueRef<'_>) -> Option<Self> {
                value
                    .entries()
                    .into_iter()
                    .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                    .collect()
            }
        }
    };
}

impl_map!(HashMap, Eq, Hash);
impl_map!(BTreeMap, Ord);

macro_rules! impl_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Typed),+> Typed for ($($name,)+) {
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::tuple(&[$($name::type_descriptor()),+])
            }
        }

        impl<$($name: IntoValue),+> IntoValue for ($($name,)+) {
            fn into_value(self) -> Value {
                let items = vec![$(self.$idx.into_value().into_data()),+];
                Value::from_parts(Self::type_descriptor(), Data::Tuple(items))
            }
        }

        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: ValueRef<'_>) -> Option<Self> {
                Some(($($name::from_value(value.element($idx)?)?,)+))
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased values.
//!
//! A [`Value`] pairs an interned [`TypeDescriptor`] with storage. Owned values
//! (`Value`) and borrowed views (`ValueRef`) are distinct types, so a view can
//! never outlive or release the storage it points into. Conversion returns a
//! [`Converted`], which is either the untouched view (same type, nothing
//! allocated) or a freshly owned value.
//!
//! # Example
//!
//! ```
//! use anycall::types::{TypeDescriptor, Value};
//!
//! let v = Value::from(3.9f32);
//! let as_int = v.convert_to(&TypeDescriptor::int32()).unwrap();
//! assert_eq!(as_int, Value::from(3i32));
//!
//! assert!(Value::from("abc").convert(&TypeDescriptor::int32()).is_none());
//! ```

mod convert;
mod descriptor;
mod native;
mod value;

pub use descriptor::{ObjectType, TypeDescriptor};
pub use native::{FromValue, IntoValue, RawBuffer, Typed};
pub use value::{Converted, Value, ValueRef};

pub(crate) use descriptor::Shape;
pub(crate) use value::Data;

/// Kind tag of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    /// Integers, bool included (size 0).
    Int,
    Float,
    String,
    List,
    Map,
    Tuple,
    Object,
    Pointer,
    Dynamic,
    Raw,
}

#[cfg(test)]
mod tests;

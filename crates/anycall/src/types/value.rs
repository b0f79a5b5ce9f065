// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned values, borrowed views and conversion results.

use super::descriptor::Shape;
use super::native::{FromValue, IntoValue};
use super::{TypeDescriptor, TypeKind};
use crate::error::{Error, Result};
use crate::object::AnyObject;
use crate::signature::Signature;
use std::fmt;
use std::sync::Arc;

/// Storage of a value. Which variant is used is fixed by the descriptor:
/// bool for `Int` of size 0, `Int` for signed, `UInt` for unsigned, and so on.
#[derive(Debug, Clone)]
pub(crate) enum Data {
    Void,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Raw(Vec<u8>),
    List(Vec<Data>),
    Map(Vec<(Data, Data)>),
    Tuple(Vec<Data>),
    Dynamic(Box<Value>),
    Object(AnyObject),
    Pointer(Arc<Data>),
}

impl Data {
    /// Structural equality; maps compare as sets of entries.
    pub(crate) fn structural_eq(&self, other: &Data) -> bool {
        match (self, other) {
            (Data::Void, Data::Void) => true,
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::UInt(a), Data::UInt(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => a == b,
            (Data::String(a), Data::String(b)) => a == b,
            (Data::Raw(a), Data::Raw(b)) => a == b,
            (Data::List(a), Data::List(b)) | (Data::Tuple(a), Data::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (Data::Map(a), Data::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .any(|(k2, v2)| k.structural_eq(k2) && v.structural_eq(v2))
                    })
            }
            (Data::Dynamic(a), Data::Dynamic(b)) => a == b,
            (Data::Object(a), Data::Object(b)) => a.same_object(b),
            (Data::Pointer(a), Data::Pointer(b)) => Arc::ptr_eq(a, b) || a.structural_eq(b),
            _ => false,
        }
    }
}

// =======================================================================
// Value (owning)
// =======================================================================

/// Owned type-erased value. Dropping it releases its storage exactly once.
#[derive(Clone)]
pub struct Value {
    desc: TypeDescriptor,
    data: Data,
}

impl Value {
    #[inline]
    pub(crate) fn from_parts(desc: TypeDescriptor, data: Data) -> Self {
        Self { desc, data }
    }

    #[inline]
    pub(crate) fn data(&self) -> &Data {
        &self.data
    }

    #[inline]
    pub(crate) fn into_data(self) -> Data {
        self.data
    }

    /// Value of any native type with a descriptor.
    pub fn new<T: IntoValue>(value: T) -> Self {
        value.into_value()
    }

    pub fn void() -> Self {
        Self::from_parts(TypeDescriptor::void(), Data::Void)
    }

    /// Wrap `value` into the dynamic type. Dynamic values are not nested.
    pub fn dynamic(value: Value) -> Self {
        if value.desc.kind() == TypeKind::Dynamic {
            return value;
        }
        Self::from_parts(TypeDescriptor::dynamic(), Data::Dynamic(Box::new(value)))
    }

    pub fn raw(bytes: Vec<u8>) -> Self {
        Self::from_parts(TypeDescriptor::raw(), Data::Raw(bytes))
    }

    pub fn object(object: AnyObject) -> Self {
        let desc = TypeDescriptor::object(object.object_type());
        Self::from_parts(desc, Data::Object(object))
    }

    /// Shared pointer to `value`.
    pub fn pointer(value: Value) -> Self {
        let desc = TypeDescriptor::pointer(&value.desc);
        Self::from_parts(desc, Data::Pointer(Arc::new(value.data)))
    }

    /// List of `element` values; each item is converted to `element`.
    pub fn list(element: &TypeDescriptor, items: Vec<Value>) -> Result<Self> {
        let data = items
            .into_iter()
            .map(|item| item.into_converted(element).map(Value::into_data))
            .collect::<Result<Vec<Data>>>()?;
        Ok(Self::from_parts(
            TypeDescriptor::list(element),
            Data::List(data),
        ))
    }

    /// Map from `key` to `value`; entries are converted.
    pub fn map(
        key: &TypeDescriptor,
        value: &TypeDescriptor,
        entries: Vec<(Value, Value)>,
    ) -> Result<Self> {
        let data = entries
            .into_iter()
            .map(|(k, v)| {
                Ok((
                    k.into_converted(key)?.into_data(),
                    v.into_converted(value)?.into_data(),
                ))
            })
            .collect::<Result<Vec<(Data, Data)>>>()?;
        Ok(Self::from_parts(
            TypeDescriptor::map(key, value),
            Data::Map(data),
        ))
    }

    /// Tuple typed after its members.
    pub fn tuple(items: Vec<Value>) -> Self {
        let members: Vec<TypeDescriptor> = items.iter().map(|v| v.desc.clone()).collect();
        let data = items.into_iter().map(Value::into_data).collect();
        Self::from_parts(TypeDescriptor::tuple(&members), Data::Tuple(data))
    }

    /// Named tuple (struct) typed after its members.
    pub fn named_tuple(name: &str, fields: &[&str], items: Vec<Value>) -> Result<Self> {
        let members: Vec<TypeDescriptor> = items.iter().map(|v| v.desc.clone()).collect();
        let desc = TypeDescriptor::named_tuple(name, &members, fields)?;
        let data = items.into_iter().map(Value::into_data).collect();
        Ok(Self::from_parts(desc, Data::Tuple(data)))
    }

    /// Zero value of a type: 0, empty string, empty container, void inside
    /// dynamic. Objects and pointers have none.
    pub fn default_for(desc: &TypeDescriptor) -> Option<Self> {
        Some(Self::from_parts(desc.clone(), default_data(desc)?))
    }

    // ===================================================================
    // Accessors (delegated to the view)
    // ===================================================================

    #[inline]
    pub fn view(&self) -> ValueRef<'_> {
        ValueRef {
            desc: &self.desc,
            data: &self.data,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.desc
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.desc.kind()
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        self.desc.signature()
    }

    pub fn is_void(&self) -> bool {
        self.view().is_void()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.view().as_bool()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.view().as_i64()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.view().as_u64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.view().as_f64()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.view().as_str()
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        self.view().as_raw()
    }

    pub fn as_object(&self) -> Option<&AnyObject> {
        self.view().as_object()
    }

    pub fn len(&self) -> Option<usize> {
        self.view().len()
    }

    pub fn element(&self, index: usize) -> Option<ValueRef<'_>> {
        self.view().element(index)
    }

    pub fn elements(&self) -> Vec<ValueRef<'_>> {
        self.view().elements()
    }

    pub fn entries(&self) -> Vec<(ValueRef<'_>, ValueRef<'_>)> {
        self.view().entries()
    }

    pub fn get(&self, key: &Value) -> Option<ValueRef<'_>> {
        self.view().get(key)
    }

    pub fn field(&self, name: &str) -> Option<ValueRef<'_>> {
        self.view().field(name)
    }

    pub fn dynamic_inner(&self) -> Option<ValueRef<'_>> {
        self.view().dynamic_inner()
    }

    pub fn pointee(&self) -> Option<ValueRef<'_>> {
        self.view().pointee()
    }

    // ===================================================================
    // Conversion
    // ===================================================================

    /// Convert to `target`; `None` when no conversion path exists.
    pub fn convert(&self, target: &TypeDescriptor) -> Option<Converted<'_>> {
        self.view().convert(target)
    }

    /// Owned conversion; `TypeMismatch` when no conversion path exists.
    pub fn convert_to(&self, target: &TypeDescriptor) -> Result<Value> {
        self.view().convert_to(target)
    }

    /// Consuming conversion; no copy when already of type `target`.
    pub fn into_converted(self, target: &TypeDescriptor) -> Result<Value> {
        if &self.desc == target {
            return Ok(self);
        }
        self.view().convert_to(target)
    }

    /// Extract a native value.
    pub fn to<T: FromValue>(&self) -> Result<T> {
        self.view().to()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>({})", self.desc.signature(), self.view())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::void()
    }
}

fn default_data(desc: &TypeDescriptor) -> Option<Data> {
    let data = match desc.shape() {
        Shape::Void => Data::Void,
        Shape::Int { size: 0, .. } => Data::Bool(false),
        Shape::Int { signed: true, .. } => Data::Int(0),
        Shape::Int { .. } => Data::UInt(0),
        Shape::Float { .. } => Data::Float(0.0),
        Shape::String => Data::String(String::new()),
        Shape::Raw => Data::Raw(Vec::new()),
        Shape::Dynamic => Data::Dynamic(Box::new(Value::void())),
        Shape::List(_) => Data::List(Vec::new()),
        Shape::Map(..) => Data::Map(Vec::new()),
        Shape::Tuple { members, .. } => Data::Tuple(
            members
                .iter()
                .map(default_data)
                .collect::<Option<Vec<Data>>>()?,
        ),
        Shape::Object(_) | Shape::Pointer(_) => return None,
    };
    Some(data)
}

// =======================================================================
// ValueRef (borrowed view)
// =======================================================================

/// Non-owning view of a value: container elements, dynamic contents,
/// pointees. Never releases anything.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    desc: &'a TypeDescriptor,
    data: &'a Data,
}

impl<'a> ValueRef<'a> {
    #[inline]
    pub(crate) fn new(desc: &'a TypeDescriptor, data: &'a Data) -> Self {
        Self { desc, data }
    }

    #[inline]
    pub(crate) fn data(&self) -> &'a Data {
        self.data
    }

    #[inline]
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.desc
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.desc.kind()
    }

    #[inline]
    pub fn signature(&self) -> &'a Signature {
        self.desc.signature()
    }

    /// Deep copy into an owned value.
    pub fn to_owned(&self) -> Value {
        Value::from_parts(self.desc.clone(), self.data.clone())
    }

    pub fn is_void(&self) -> bool {
        matches!(self.data, Data::Void)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Any integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self.data {
            Data::Int(v) => Some(v),
            Data::UInt(v) => i64::try_from(v).ok(),
            Data::Bool(b) => Some(i64::from(b)),
            _ => None,
        }
    }

    /// Any non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self.data {
            Data::UInt(v) => Some(v),
            Data::Int(v) => u64::try_from(v).ok(),
            Data::Bool(b) => Some(u64::from(b)),
            _ => None,
        }
    }

    /// Floats, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self.data {
            Data::Float(v) => Some(v),
            Data::Int(v) => Some(v as f64),
            Data::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.data {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&'a [u8]> {
        match self.data {
            Data::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&'a AnyObject> {
        match self.data {
            Data::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Element count of containers, byte length of strings and raw buffers.
    pub fn len(&self) -> Option<usize> {
        match self.data {
            Data::List(items) | Data::Tuple(items) => Some(items.len()),
            Data::Map(entries) => Some(entries.len()),
            Data::String(s) => Some(s.len()),
            Data::Raw(bytes) => Some(bytes.len()),
            _ => None,
        }
    }

    /// List element or tuple member.
    pub fn element(&self, index: usize) -> Option<ValueRef<'a>> {
        match (self.desc.shape(), self.data) {
            (Shape::List(element), Data::List(items)) => {
                items.get(index).map(|d| ValueRef::new(element, d))
            }
            (Shape::Tuple { members, .. }, Data::Tuple(items)) => {
                Some(ValueRef::new(members.get(index)?, items.get(index)?))
            }
            _ => None,
        }
    }

    /// All list elements or tuple members (empty for other kinds).
    pub fn elements(&self) -> Vec<ValueRef<'a>> {
        match (self.desc.shape(), self.data) {
            (Shape::List(element), Data::List(items)) => {
                items.iter().map(|d| ValueRef::new(element, d)).collect()
            }
            (Shape::Tuple { members, .. }, Data::Tuple(items)) => members
                .iter()
                .zip(items)
                .map(|(m, d)| ValueRef::new(m, d))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Map entries (empty for other kinds).
    pub fn entries(&self) -> Vec<(ValueRef<'a>, ValueRef<'a>)> {
        match (self.desc.shape(), self.data) {
            (Shape::Map(key, value), Data::Map(entries)) => entries
                .iter()
                .map(|(k, v)| (ValueRef::new(key, k), ValueRef::new(value, v)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Map lookup; `key` is converted to the map key type first.
    pub fn get(&self, key: &Value) -> Option<ValueRef<'a>> {
        let (key_desc, value_desc) = self.desc.key_value()?;
        let Data::Map(entries) = self.data else {
            return None;
        };
        let key = key.convert(key_desc)?;
        let key_data = key.view().data;
        entries
            .iter()
            .find(|(k, _)| k.structural_eq(key_data))
            .map(|(_, v)| ValueRef::new(value_desc, v))
    }

    /// Named tuple member.
    pub fn field(&self, name: &str) -> Option<ValueRef<'a>> {
        let index = self.desc.field_names().iter().position(|f| f == name)?;
        self.element(index)
    }

    /// Value held by a dynamic.
    pub fn dynamic_inner(&self) -> Option<ValueRef<'a>> {
        match self.data {
            Data::Dynamic(inner) => Some(inner.view()),
            _ => None,
        }
    }

    /// Value a pointer points to.
    pub fn pointee(&self) -> Option<ValueRef<'a>> {
        match (self.desc.shape(), self.data) {
            (Shape::Pointer(pointee), Data::Pointer(data)) => Some(ValueRef::new(pointee, data)),
            _ => None,
        }
    }

    /// Convert to `target`; `None` when no conversion path exists.
    pub fn convert(&self, target: &TypeDescriptor) -> Option<Converted<'a>> {
        super::convert::convert(*self, target)
    }

    /// Owned conversion; `TypeMismatch` when no conversion path exists.
    pub fn convert_to(&self, target: &TypeDescriptor) -> Result<Value> {
        self.convert(target)
            .map(Converted::into_owned)
            .ok_or_else(|| {
                Error::type_mismatch(format!("cannot convert {} to {}", self.desc, target))
            })
    }

    /// Extract a native value.
    pub fn to<T: FromValue>(&self) -> Result<T> {
        let target = T::type_descriptor();
        let converted = self.convert(&target).ok_or_else(|| {
            Error::type_mismatch(format!("cannot convert {} to {}", self.desc, target))
        })?;
        T::from_value(converted.view()).ok_or_else(|| {
            Error::type_mismatch(format!("cannot extract {} from {}", target, self.desc))
        })
    }
}

impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.data.structural_eq(other.data)
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueRef<{}>({})", self.desc.signature(), self)
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<'a>(
            f: &mut fmt::Formatter<'_>,
            items: impl Iterator<Item = ValueRef<'a>>,
        ) -> fmt::Result {
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self.data {
            Data::Void => f.write_str("void"),
            Data::Bool(b) => write!(f, "{}", b),
            Data::Int(v) => write!(f, "{}", v),
            Data::UInt(v) => write!(f, "{}", v),
            Data::Float(v) => write!(f, "{}", v),
            Data::String(s) => write!(f, "{:?}", s),
            Data::Raw(bytes) => write!(f, "raw({} bytes)", bytes.len()),
            Data::List(_) => {
                f.write_str("[")?;
                join(f, self.elements().into_iter())?;
                f.write_str("]")
            }
            Data::Map(_) => {
                f.write_str("{")?;
                for (i, (k, v)) in self.entries().into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Data::Tuple(_) => {
                let fields = self.desc.field_names();
                if let Some(name) = self.desc.struct_name() {
                    f.write_str(name)?;
                }
                f.write_str("(")?;
                if fields.is_empty() {
                    join(f, self.elements().into_iter())?;
                } else {
                    for (i, (field, item)) in fields.iter().zip(self.elements()).enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}: {}", field, item)?;
                    }
                }
                f.write_str(")")
            }
            Data::Dynamic(inner) => write!(f, "{}", inner.view()),
            Data::Object(_) => write!(f, "<object {}>", self.desc),
            Data::Pointer(_) => match self.pointee() {
                Some(pointee) => write!(f, "&{}", pointee),
                None => f.write_str("&?"),
            },
        }
    }
}

// =======================================================================
// Converted
// =======================================================================

/// Result of a successful conversion.
pub enum Converted<'a> {
    /// Source already had the target type; nothing was allocated.
    Borrowed(ValueRef<'a>),
    /// Newly allocated storage owned by this value.
    Owned(Value),
}

impl Converted<'_> {
    pub fn view(&self) -> ValueRef<'_> {
        match self {
            Converted::Borrowed(view) => *view,
            Converted::Owned(value) => value.view(),
        }
    }

    /// Owned value (copies a borrowed view).
    pub fn into_owned(self) -> Value {
        match self {
            Converted::Borrowed(view) => view.to_owned(),
            Converted::Owned(value) => value,
        }
    }

    /// Whether new storage was allocated.
    pub fn owns_storage(&self) -> bool {
        matches!(self, Converted::Owned(_))
    }
}

impl fmt::Debug for Converted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converted::Borrowed(view) => write!(f, "Borrowed({:?})", view),
            Converted::Owned(value) => write!(f, "Owned({:?})", value),
        }
    }
}

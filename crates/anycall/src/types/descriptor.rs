// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.
//!
//! Descriptors are interned: building the same type twice (from a native
//! Rust type, from a signature, or by hand) yields handles that compare
//! equal and share one allocation. Interned descriptors live until process
//! exit and are never mutated.

use super::TypeKind;
use crate::error::{Error, ErrorKind, Result};
use crate::signature::{Signature, SignatureKind, Token};
use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Object type: a name plus base types with their offsets.
///
/// The unnamed object type (see [`ObjectType::any`]) accepts every object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    name: Arc<str>,
    bases: Vec<(ObjectType, isize)>,
}

impl ObjectType {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            bases: Vec::new(),
        }
    }

    /// Generic object type.
    pub fn any() -> Self {
        Self::new("")
    }

    /// Declare a base type reachable at `offset`.
    #[must_use]
    pub fn with_base(mut self, base: ObjectType, offset: isize) -> Self {
        self.bases.push((base, offset));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        self.name.is_empty()
    }

    pub fn bases(&self) -> &[(ObjectType, isize)] {
        &self.bases
    }

    /// Offset of `base` within this type, searching the base list
    /// transitively. `Some(0)` for the type itself.
    pub fn inherits(&self, base: &ObjectType) -> Option<isize> {
        if self.name == base.name {
            return Some(0);
        }
        self.bases.iter().find_map(|(candidate, offset)| {
            candidate.inherits(base).map(|inner| offset + inner)
        })
    }
}

/// Shape of a descriptor (closed tagged union over the supported kinds).
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Void,
    /// `size` is the byte width; 0 marks bool.
    Int {
        size: u8,
        signed: bool,
    },
    Float {
        size: u8,
    },
    String,
    Raw,
    Dynamic,
    List(TypeDescriptor),
    Map(TypeDescriptor, TypeDescriptor),
    Tuple {
        members: Vec<TypeDescriptor>,
        name: Option<String>,
        fields: Vec<String>,
    },
    Object(ObjectType),
    Pointer(TypeDescriptor),
}

struct Inner {
    shape: Shape,
    signature: Signature,
    /// Identity key: equal keys mean the same type.
    key: Arc<str>,
}

/// Handle to an interned type descriptor.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<Inner>);

fn registry() -> &'static DashMap<Arc<str>, TypeDescriptor> {
    static REGISTRY: OnceLock<DashMap<Arc<str>, TypeDescriptor>> = OnceLock::new();
    REGISTRY.get_or_init(DashMap::new)
}

fn identity_key(shape: &Shape) -> String {
    match shape {
        Shape::Object(object) => format!("o:{};", object.name()),
        Shape::List(element) => format!("[{}]", element.key()),
        Shape::Map(key, value) => format!("{{{}{}}}", key.key(), value.key()),
        Shape::Tuple {
            members,
            name,
            fields,
        } => {
            let mut key = String::from("(");
            for member in members {
                key.push_str(member.key());
            }
            key.push(')');
            if let Some(name) = name {
                key.push('<');
                key.push_str(name);
                for field in fields {
                    key.push(',');
                    key.push_str(field);
                }
                key.push('>');
            }
            key
        }
        Shape::Pointer(pointee) => format!("{}*", pointee.key()),
        _ => signature_of(shape).as_str().to_string(),
    }
}

fn signature_of(shape: &Shape) -> Signature {
    match shape {
        Shape::Void => Signature::from_kind(SignatureKind::Void),
        Shape::Int { size, signed } => Signature::from_kind(match (*size, *signed) {
            (0, _) => SignatureKind::Bool,
            (1, true) => SignatureKind::Int8,
            (1, false) => SignatureKind::UInt8,
            (2, true) => SignatureKind::Int16,
            (2, false) => SignatureKind::UInt16,
            (4, true) => SignatureKind::Int32,
            (4, false) => SignatureKind::UInt32,
            (_, true) => SignatureKind::Int64,
            (_, false) => SignatureKind::UInt64,
        }),
        Shape::Float { size: 4 } => Signature::from_kind(SignatureKind::Float),
        Shape::Float { .. } => Signature::from_kind(SignatureKind::Double),
        Shape::String => Signature::from_kind(SignatureKind::String),
        Shape::Raw => Signature::from_kind(SignatureKind::Raw),
        Shape::Dynamic => Signature::from_kind(SignatureKind::Dynamic),
        Shape::Object(_) => Signature::from_kind(SignatureKind::Object),
        Shape::List(element) => Signature::list(element.signature()),
        Shape::Map(key, value) => Signature::map(key.signature(), value.signature()),
        Shape::Tuple {
            members,
            name: Some(name),
            fields,
        } => Signature::annotated_tuple(members.iter().map(|m| m.signature()), name, fields),
        Shape::Tuple { members, .. } => Signature::tuple(members.iter().map(|m| m.signature())),
        Shape::Pointer(pointee) => Signature::pointer_to(pointee.signature()),
    }
}

impl TypeDescriptor {
    pub(crate) fn intern(shape: Shape) -> Self {
        let key: Arc<str> = Arc::from(identity_key(&shape));
        if let Some(existing) = registry().get(&key) {
            return existing.clone();
        }
        registry()
            .entry(Arc::clone(&key))
            .or_insert_with(|| {
                let signature = signature_of(&shape);
                TypeDescriptor(Arc::new(Inner {
                    shape,
                    signature,
                    key,
                }))
            })
            .clone()
    }

    // ===================================================================
    // Constructors
    // ===================================================================

    pub fn void() -> Self {
        Self::intern(Shape::Void)
    }

    pub fn bool() -> Self {
        Self::intern(Shape::Int {
            size: 0,
            signed: false,
        })
    }

    /// Integer of `size` bytes (1, 2, 4 or 8; 0 for bool).
    pub fn int(size: u8, signed: bool) -> Result<Self> {
        if !matches!(size, 0 | 1 | 2 | 4 | 8) {
            return Err(Error::type_mismatch(format!(
                "no integer type of {} bytes",
                size
            )));
        }
        Ok(Self::intern(Shape::Int {
            size,
            signed: signed && size != 0,
        }))
    }

    pub fn int8() -> Self {
        Self::intern(Shape::Int {
            size: 1,
            signed: true,
        })
    }

    pub fn uint8() -> Self {
        Self::intern(Shape::Int {
            size: 1,
            signed: false,
        })
    }

    pub fn int16() -> Self {
        Self::intern(Shape::Int {
            size: 2,
            signed: true,
        })
    }

    pub fn uint16() -> Self {
        Self::intern(Shape::Int {
            size: 2,
            signed: false,
        })
    }

    pub fn int32() -> Self {
        Self::intern(Shape::Int {
            size: 4,
            signed: true,
        })
    }

    pub fn uint32() -> Self {
        Self::intern(Shape::Int {
            size: 4,
            signed: false,
        })
    }

    pub fn int64() -> Self {
        Self::intern(Shape::Int {
            size: 8,
            signed: true,
        })
    }

    pub fn uint64() -> Self {
        Self::intern(Shape::Int {
            size: 8,
            signed: false,
        })
    }

    pub fn float32() -> Self {
        Self::intern(Shape::Float { size: 4 })
    }

    pub fn float64() -> Self {
        Self::intern(Shape::Float { size: 8 })
    }

    pub fn string() -> Self {
        Self::intern(Shape::String)
    }

    pub fn raw() -> Self {
        Self::intern(Shape::Raw)
    }

    pub fn dynamic() -> Self {
        Self::intern(Shape::Dynamic)
    }

    pub fn list(element: &TypeDescriptor) -> Self {
        Self::intern(Shape::List(element.clone()))
    }

    pub fn map(key: &TypeDescriptor, value: &TypeDescriptor) -> Self {
        Self::intern(Shape::Map(key.clone(), value.clone()))
    }

    pub fn tuple(members: &[TypeDescriptor]) -> Self {
        Self::intern(Shape::Tuple {
            members: members.to_vec(),
            name: None,
            fields: Vec::new(),
        })
    }

    /// Struct-like tuple. `fields` is either empty or one name per member.
    pub fn named_tuple(name: &str, members: &[TypeDescriptor], fields: &[&str]) -> Result<Self> {
        if !fields.is_empty() && fields.len() != members.len() {
            return Err(Error::type_mismatch(format!(
                "struct '{}' has {} members but {} field names",
                name,
                members.len(),
                fields.len()
            )));
        }
        Ok(Self::intern(Shape::Tuple {
            members: members.to_vec(),
            name: Some(name.to_string()),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }))
    }

    pub fn object(object: ObjectType) -> Self {
        Self::intern(Shape::Object(object))
    }

    /// Generic object type accepting every object.
    pub fn any_object() -> Self {
        Self::object(ObjectType::any())
    }

    pub fn pointer(pointee: &TypeDescriptor) -> Self {
        Self::intern(Shape::Pointer(pointee.clone()))
    }

    /// Descriptor for a single-type signature.
    ///
    /// `#T` maps to a list of T, `~T` to a map from string to T. Optional
    /// and unknown types have no descriptor.
    pub fn from_signature(signature: &Signature) -> Result<Self> {
        let mut tokens = signature.iter();
        match (tokens.next(), tokens.next()) {
            (Some(token), None) => Self::from_token(&token),
            _ => Err(Error::new(
                ErrorKind::InvalidSignature,
                format!("'{}' is not a single type", signature),
            )),
        }
    }

    /// Parse `text` and build its descriptor.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_signature(&Signature::parse(text)?)
    }

    fn from_token(token: &Token<'_>) -> Result<Self> {
        let children = || -> Result<Vec<TypeDescriptor>> {
            token
                .child_tokens()
                .map(|child| child.and_then(|c| Self::from_token(&c)))
                .collect()
        };
        let base = match token.kind() {
            SignatureKind::Void => Self::void(),
            SignatureKind::Bool => Self::bool(),
            SignatureKind::Int8 => Self::int8(),
            SignatureKind::UInt8 => Self::uint8(),
            SignatureKind::Int16 => Self::int16(),
            SignatureKind::UInt16 => Self::uint16(),
            SignatureKind::Int32 => Self::int32(),
            SignatureKind::UInt32 => Self::uint32(),
            SignatureKind::Int64 => Self::int64(),
            SignatureKind::UInt64 => Self::uint64(),
            SignatureKind::Float => Self::float32(),
            SignatureKind::Double => Self::float64(),
            SignatureKind::String => Self::string(),
            SignatureKind::Raw => Self::raw(),
            SignatureKind::Dynamic => Self::dynamic(),
            SignatureKind::Object => Self::any_object(),
            SignatureKind::List | SignatureKind::VarArgs => match children()?.as_slice() {
                [element] => Self::list(element),
                _ => return Err(bad_arity(token)),
            },
            SignatureKind::KwArgs => match children()?.as_slice() {
                [value] => Self::map(&Self::string(), value),
                _ => return Err(bad_arity(token)),
            },
            SignatureKind::Map => match children()?.as_slice() {
                [key, value] => Self::map(key, value),
                _ => return Err(bad_arity(token)),
            },
            SignatureKind::Tuple => {
                let members = children()?;
                match token.annotation() {
                    Some(annotation) => {
                        let mut parts = annotation.split(',');
                        let name = parts.next().unwrap_or_default();
                        let fields: Vec<&str> = parts.collect();
                        if fields.len() == members.len() {
                            Self::named_tuple(name, &members, &fields)?
                        } else {
                            Self::named_tuple(name, &members, &[])?
                        }
                    }
                    None => Self::tuple(&members),
                }
            }
            SignatureKind::Optional | SignatureKind::Unknown | SignatureKind::None => {
                return Err(Error::type_mismatch(format!(
                    "no type descriptor for signature '{}'",
                    token.as_str()
                )))
            }
        };
        Ok(if token.is_pointer() {
            Self::pointer(&base)
        } else {
            base
        })
    }

    // ===================================================================
    // Accessors
    // ===================================================================

    #[inline]
    pub(crate) fn shape(&self) -> &Shape {
        &self.0.shape
    }

    #[inline]
    pub(crate) fn key(&self) -> &str {
        &self.0.key
    }

    pub fn kind(&self) -> TypeKind {
        match self.0.shape {
            Shape::Void => TypeKind::Void,
            Shape::Int { .. } => TypeKind::Int,
            Shape::Float { .. } => TypeKind::Float,
            Shape::String => TypeKind::String,
            Shape::Raw => TypeKind::Raw,
            Shape::Dynamic => TypeKind::Dynamic,
            Shape::List(_) => TypeKind::List,
            Shape::Map(..) => TypeKind::Map,
            Shape::Tuple { .. } => TypeKind::Tuple,
            Shape::Object(_) => TypeKind::Object,
            Shape::Pointer(_) => TypeKind::Pointer,
        }
    }

    /// Wire signature of this type.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    /// Byte size of numeric types (0 for bool).
    pub fn size(&self) -> Option<usize> {
        match self.0.shape {
            Shape::Int { size, .. } | Shape::Float { size } => Some(size as usize),
            _ => None,
        }
    }

    /// Signedness of integer types.
    pub fn is_signed(&self) -> Option<bool> {
        match self.0.shape {
            Shape::Int { signed, .. } => Some(signed),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.0.shape, Shape::Int { size: 0, .. })
    }

    /// Element type of a list.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.0.shape {
            Shape::List(element) => Some(element),
            _ => None,
        }
    }

    /// Key and value types of a map.
    pub fn key_value(&self) -> Option<(&TypeDescriptor, &TypeDescriptor)> {
        match &self.0.shape {
            Shape::Map(key, value) => Some((key, value)),
            _ => None,
        }
    }

    /// Member types of a tuple.
    pub fn members(&self) -> Option<&[TypeDescriptor]> {
        match &self.0.shape {
            Shape::Tuple { members, .. } => Some(members),
            _ => None,
        }
    }

    /// Struct name of a named tuple.
    pub fn struct_name(&self) -> Option<&str> {
        match &self.0.shape {
            Shape::Tuple { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Field names of a named tuple (empty when unknown).
    pub fn field_names(&self) -> &[String] {
        match &self.0.shape {
            Shape::Tuple { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn pointee(&self) -> Option<&TypeDescriptor> {
        match &self.0.shape {
            Shape::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    pub fn object_type(&self) -> Option<&ObjectType> {
        match &self.0.shape {
            Shape::Object(object) => Some(object),
            _ => None,
        }
    }
}

fn bad_arity(token: &Token<'_>) -> Error {
    Error::new(
        ErrorKind::InvalidSignature,
        format!("wrong element count in '{}'", token.as_str()),
    )
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.key == other.0.key
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.shape {
            Shape::Object(object) if !object.is_any() => {
                write!(f, "TypeDescriptor(object {})", object.name())
            }
            _ => write!(f, "TypeDescriptor({})", self.0.signature),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.shape {
            Shape::Object(object) if !object.is_any() => f.write_str(object.name()),
            _ => write!(f, "{}", self.0.signature),
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact wire-signature grammar.
//!
//! A signature is a sequence of tokens. Atomic tokens are single characters,
//! composites are bracketed and may nest:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `v` | void |
//! | `b` | bool |
//! | `c` `C` | int8 / uint8 |
//! | `w` `W` | int16 / uint16 |
//! | `i` `I` | int32 / uint32 |
//! | `l` `L` | int64 / uint64 |
//! | `f` `d` | float32 / float64 |
//! | `s` | string |
//! | `r` | raw bytes |
//! | `m` | dynamic |
//! | `o` | object |
//! | `X` | unknown |
//! | `[T]` | list of T |
//! | `{KV}` | map from K to V |
//! | `(T1T2...)` | tuple |
//! | `#T` `~T` `+T` | varargs / kwargs / optional |
//!
//! Any token may be followed by an annotation `<Name,field1,field2>` and a
//! pointer marker `*`.
//!
//! # Example
//!
//! ```
//! use anycall::signature::{Signature, SignatureKind};
//!
//! let sig = Signature::parse("i[s]").unwrap();
//! let kinds: Vec<_> = sig.iter().map(|t| t.kind()).collect();
//! assert_eq!(kinds, vec![SignatureKind::Int32, SignatureKind::List]);
//! assert_eq!(sig.to_string(), "i[s]");
//! ```

mod convert;
mod parse;

pub use parse::{Token, Tokens};

/// Deepest nesting accepted by the parser; every bracket and every prefix
/// modifier counts as one level.
pub const MAX_SIGNATURE_DEPTH: usize = 64;

use crate::error::{Error, ErrorKind, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Kind of a signature token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// Not a token (empty signature).
    None,
    Void,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    List,
    Map,
    Tuple,
    Dynamic,
    Raw,
    Object,
    Unknown,
    VarArgs,
    KwArgs,
    Optional,
}

impl SignatureKind {
    /// Kind introduced by a leading character.
    pub fn from_char(c: u8) -> Option<Self> {
        let kind = match c {
            b'v' => Self::Void,
            b'b' => Self::Bool,
            b'c' => Self::Int8,
            b'C' => Self::UInt8,
            b'w' => Self::Int16,
            b'W' => Self::UInt16,
            b'i' => Self::Int32,
            b'I' => Self::UInt32,
            b'l' => Self::Int64,
            b'L' => Self::UInt64,
            b'f' => Self::Float,
            b'd' => Self::Double,
            b's' => Self::String,
            b'[' => Self::List,
            b'{' => Self::Map,
            b'(' => Self::Tuple,
            b'm' => Self::Dynamic,
            b'r' => Self::Raw,
            b'o' => Self::Object,
            b'X' => Self::Unknown,
            b'#' => Self::VarArgs,
            b'~' => Self::KwArgs,
            b'+' => Self::Optional,
            _ => return None,
        };
        Some(kind)
    }

    /// Leading character of the kind (`\0` for `None`).
    pub fn as_char(self) -> char {
        match self {
            Self::None => '\0',
            Self::Void => 'v',
            Self::Bool => 'b',
            Self::Int8 => 'c',
            Self::UInt8 => 'C',
            Self::Int16 => 'w',
            Self::UInt16 => 'W',
            Self::Int32 => 'i',
            Self::UInt32 => 'I',
            Self::Int64 => 'l',
            Self::UInt64 => 'L',
            Self::Float => 'f',
            Self::Double => 'd',
            Self::String => 's',
            Self::List => '[',
            Self::Map => '{',
            Self::Tuple => '(',
            Self::Dynamic => 'm',
            Self::Raw => 'r',
            Self::Object => 'o',
            Self::Unknown => 'X',
            Self::VarArgs => '#',
            Self::KwArgs => '~',
            Self::Optional => '+',
        }
    }

    /// Single-character token without children.
    pub fn is_atomic(self) -> bool {
        !matches!(
            self,
            Self::None
                | Self::List
                | Self::Map
                | Self::Tuple
                | Self::VarArgs
                | Self::KwArgs
                | Self::Optional
        )
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }
}

/// Validated signature text.
///
/// Cheap to clone. Equality and hashing ignore annotations, so
/// `(ii)<Point,x,y>` equals `(ii)`.
#[derive(Clone)]
pub struct Signature {
    text: Arc<str>,
    stripped: Arc<str>,
}

impl Signature {
    /// Parse and validate signature text.
    pub fn parse(text: &str) -> Result<Self> {
        for token in Tokens::new(text) {
            token?;
        }
        Ok(Self::from_validated(text))
    }

    /// Parse text that must hold exactly one type token.
    pub fn parse_type(text: &str) -> Result<Self> {
        let sig = Self::parse(text)?;
        if sig.len() != 1 {
            return Err(Error::new(
                ErrorKind::InvalidSignature,
                format!("'{}' is not a single type", text),
            ));
        }
        Ok(sig)
    }

    pub(crate) fn from_validated(text: &str) -> Self {
        let stripped = parse::strip_annotations(text);
        Self {
            text: Arc::from(text),
            stripped: Arc::from(stripped.as_str()),
        }
    }

    /// Signature with no tokens.
    pub fn empty() -> Self {
        Self::from_validated("")
    }

    /// Atomic single-token signature. Composite kinds give an empty signature.
    pub fn from_kind(kind: SignatureKind) -> Self {
        if !kind.is_atomic() {
            return Self::empty();
        }
        let mut buf = [0u8; 4];
        Self::from_validated(kind.as_char().encode_utf8(&mut buf))
    }

    /// `[T]`
    pub fn list(element: &Signature) -> Self {
        Self::from_validated(&format!("[{}]", element.text))
    }

    /// `{KV}`
    pub fn map(key: &Signature, value: &Signature) -> Self {
        Self::from_validated(&format!("{{{}{}}}", key.text, value.text))
    }

    /// `(T1T2...)`
    pub fn tuple<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a Signature>,
    {
        let mut text = String::from("(");
        for member in members {
            text.push_str(&member.text);
        }
        text.push(')');
        Self::from_validated(&text)
    }

    /// `(T1T2...)<Name,f1,f2>`
    pub fn annotated_tuple<'a, I>(members: I, name: &str, fields: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Signature>,
    {
        let base = Self::tuple(members);
        let mut text = base.text.to_string();
        text.push('<');
        text.push_str(name);
        for field in fields {
            text.push(',');
            text.push_str(field);
        }
        text.push('>');
        Self::from_validated(&text)
    }

    /// Same signature followed by a pointer marker.
    pub fn pointer_to(pointee: &Signature) -> Self {
        Self::from_validated(&format!("{}*", pointee.text))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate top-level tokens.
    pub fn iter(&self) -> impl Iterator<Item = Token<'_>> + '_ {
        // text was validated at construction, errors cannot occur
        Tokens::new(&self.text).filter_map(|t| t.ok())
    }

    /// First top-level token.
    pub fn first(&self) -> Option<Token<'_>> {
        self.iter().next()
    }

    /// Number of top-level tokens.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Kind of a single-token signature; `None` if empty or multi-token.
    pub fn kind(&self) -> SignatureKind {
        let mut tokens = self.iter();
        match (tokens.next(), tokens.next()) {
            (Some(token), None) => token.kind(),
            _ => SignatureKind::None,
        }
    }

    /// Children of the first token.
    pub fn children(&self) -> Vec<Signature> {
        self.first()
            .map(|t| t.child_tokens().filter_map(|c| c.ok()).map(|c| c.to_signature()).collect())
            .unwrap_or_default()
    }

    /// Annotation of the first token.
    pub fn annotation(&self) -> Option<&str> {
        self.first().and_then(|t| t.annotation())
    }

    /// Signature text with every annotation removed.
    pub fn without_annotations(&self) -> Signature {
        Self::from_validated(&self.stripped)
    }

    /// Signature of each top-level token.
    pub fn split(&self) -> Vec<Signature> {
        self.iter().map(|t| t.to_signature()).collect()
    }

    /// Heuristic convertibility score in `[0, 1]`; `0` means not convertible.
    pub fn is_convertible_to(&self, target: &Signature) -> f32 {
        convert::score_sequence(self, target)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.stripped == other.stripped
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stripped.hash(state);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:?})", &*self.text)
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Signature::parse(&text).map_err(serde::de::Error::custom)
    }
}

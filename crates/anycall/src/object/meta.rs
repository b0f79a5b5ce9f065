// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member registry of an object type.
//!
//! Methods, signals and properties share one dense id space: the id of a
//! member is its index. A property's change signal uses the property id.

use crate::error::{Error, ErrorKind, Result};
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaMethod {
    pub id: u32,
    pub name: String,
    /// Parameter tuple, e.g. `(ii)`.
    pub parameters: Signature,
    pub returns: Signature,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSignal {
    pub id: u32,
    pub name: String,
    pub parameters: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaProperty {
    pub id: u32,
    pub name: String,
    /// Type of the property value.
    pub signature: Signature,
}

/// One registered member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetaMember {
    Method(MetaMethod),
    Signal(MetaSignal),
    Property(MetaProperty),
}

impl MetaMember {
    pub fn id(&self) -> u32 {
        match self {
            MetaMember::Method(m) => m.id,
            MetaMember::Signal(s) => s.id,
            MetaMember::Property(p) => p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MetaMember::Method(m) => &m.name,
            MetaMember::Signal(s) => &s.name,
            MetaMember::Property(p) => &p.name,
        }
    }

    /// Lookup key: `name::signature`.
    fn key(&self) -> String {
        match self {
            MetaMember::Method(m) => member_key(&m.name, &m.parameters),
            MetaMember::Signal(s) => member_key(&s.name, &s.parameters),
            MetaMember::Property(p) => member_key(&p.name, &p.signature),
        }
    }
}

fn member_key(name: &str, signature: &Signature) -> String {
    format!("{}::{}", name, signature.without_annotations())
}

/// Member registry. Read-only once built; ids never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "MetaObjectRepr", into = "MetaObjectRepr")]
pub struct MetaObject {
    members: Vec<MetaMember>,
    description: String,
    by_key: HashMap<String, u32>,
}

#[derive(Serialize, Deserialize)]
struct MetaObjectRepr {
    #[serde(default)]
    description: String,
    members: Vec<MetaMember>,
}

impl From<MetaObjectRepr> for MetaObject {
    fn from(repr: MetaObjectRepr) -> Self {
        // ids are positions; renumber anything that came in out of order
        let members = repr
            .members
            .into_iter()
            .enumerate()
            .map(|(index, member)| renumber(member, index as u32))
            .collect();
        Self::from_members(members, repr.description)
    }
}

impl From<MetaObject> for MetaObjectRepr {
    fn from(meta: MetaObject) -> Self {
        Self {
            description: meta.description,
            members: meta.members,
        }
    }
}

fn renumber(member: MetaMember, id: u32) -> MetaMember {
    match member {
        MetaMember::Method(m) => MetaMember::Method(MetaMethod { id, ..m }),
        MetaMember::Signal(s) => MetaMember::Signal(MetaSignal { id, ..s }),
        MetaMember::Property(p) => MetaMember::Property(MetaProperty { id, ..p }),
    }
}

impl PartialEq for MetaObject {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members && self.description == other.description
    }
}

impl MetaObject {
    fn from_members(members: Vec<MetaMember>, description: String) -> Self {
        let by_key = members.iter().map(|m| (m.key(), m.id())).collect();
        Self {
            members,
            description,
            by_key,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[MetaMember] {
        &self.members
    }

    pub fn member(&self, id: u32) -> Option<&MetaMember> {
        self.members.get(id as usize)
    }

    pub fn method(&self, id: u32) -> Option<&MetaMethod> {
        match self.member(id)? {
            MetaMember::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn signal(&self, id: u32) -> Option<&MetaSignal> {
        match self.member(id)? {
            MetaMember::Signal(s) => Some(s),
            _ => None,
        }
    }

    pub fn property(&self, id: u32) -> Option<&MetaProperty> {
        match self.member(id)? {
            MetaMember::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MetaMethod> {
        self.members.iter().filter_map(|m| match m {
            MetaMember::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn signals(&self) -> impl Iterator<Item = &MetaSignal> {
        self.members.iter().filter_map(|m| match m {
            MetaMember::Signal(s) => Some(s),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &MetaProperty> {
        self.members.iter().filter_map(|m| match m {
            MetaMember::Property(p) => Some(p),
            _ => None,
        })
    }

    /// Id of the method `name` with exactly `parameters`.
    pub fn method_id(&self, name: &str, parameters: &Signature) -> Option<u32> {
        let id = *self.by_key.get(&member_key(name, parameters))?;
        self.method(id).map(|m| m.id)
    }

    /// Id of the first signal called `name`.
    pub fn signal_id(&self, name: &str) -> Option<u32> {
        self.signals().find(|s| s.name == name).map(|s| s.id)
    }

    /// Id of the property called `name`.
    pub fn property_id(&self, name: &str) -> Option<u32> {
        self.properties().find(|p| p.name == name).map(|p| p.id)
    }

    /// All overloads of `name`.
    pub fn methods_named(&self, name: &str) -> Vec<&MetaMethod> {
        self.methods().filter(|m| m.name == name).collect()
    }

    /// Best overload of `name` for arguments of signature `arguments`.
    ///
    /// An exact match wins; otherwise the overload with the highest
    /// convertibility score. No overload, or none convertible, is
    /// `MethodNotFound`.
    pub fn find_method(&self, name: &str, arguments: &Signature) -> Result<u32> {
        if let Some(id) = self.method_id(name, arguments) {
            return Ok(id);
        }
        let candidates = self.methods_named(name);
        if candidates.is_empty() {
            return Err(Error::new(
                ErrorKind::MethodNotFound,
                format!("Can't find method: {}", name),
            ));
        }
        let mut best: Option<(f32, u32)> = None;
        for method in candidates {
            let score = arguments.is_convertible_to(&method.parameters);
            if score > 0.0 && best.map_or(true, |(b, _)| score > b) {
                best = Some((score, method.id));
            }
        }
        best.map(|(_, id)| id).ok_or_else(|| {
            Error::new(
                ErrorKind::MethodNotFound,
                format!(
                    "no overload of '{}' accepts arguments {}",
                    name, arguments
                ),
            )
        })
    }
}

// =======================================================================
// Builder
// =======================================================================

/// Incrementally assigns ids to members.
#[derive(Debug, Default)]
pub struct MetaObjectBuilder {
    members: Vec<MetaMember>,
    by_key: HashMap<String, u32>,
    description: String,
}

impl MetaObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    fn push(&mut self, member: MetaMember) -> Result<u32> {
        let key = member.key();
        if self.by_key.contains_key(&key) {
            return Err(Error::new(
                ErrorKind::InvalidSignature,
                format!("member '{}' already registered", key),
            ));
        }
        let id = member.id();
        self.by_key.insert(key, id);
        self.members.push(member);
        Ok(id)
    }

    fn next_id(&self) -> u32 {
        self.members.len() as u32
    }

    /// Register a method; `parameters` is the argument tuple.
    pub fn add_method(
        &mut self,
        name: &str,
        parameters: Signature,
        returns: Signature,
        description: &str,
    ) -> Result<u32> {
        let id = self.next_id();
        self.push(MetaMember::Method(MetaMethod {
            id,
            name: name.to_string(),
            parameters,
            returns,
            description: description.to_string(),
        }))
    }

    pub fn add_signal(&mut self, name: &str, parameters: Signature) -> Result<u32> {
        let id = self.next_id();
        self.push(MetaMember::Signal(MetaSignal {
            id,
            name: name.to_string(),
            parameters,
        }))
    }

    pub fn add_property(&mut self, name: &str, signature: Signature) -> Result<u32> {
        let id = self.next_id();
        self.push(MetaMember::Property(MetaProperty {
            id,
            name: name.to_string(),
            signature,
        }))
    }

    pub fn build(self) -> MetaObject {
        MetaObject {
            members: self.members,
            description: self.description,
            by_key: self.by_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(text: &str) -> Signature {
        Signature::parse(text).expect("valid signature")
    }

    fn sample() -> MetaObject {
        let mut builder = MetaObjectBuilder::new().description("calculator");
        builder
            .add_method("add", sig("(ii)"), sig("i"), "sum")
            .expect("add");
        builder
            .add_method("add", sig("(dd)"), sig("d"), "")
            .expect("overload");
        builder.add_signal("changed", sig("(i)")).expect("signal");
        builder.add_property("total", sig("l")).expect("property");
        builder.build()
    }

    #[test]
    fn test_dense_ids_shared_by_all_members() {
        let meta = sample();
        assert_eq!(meta.len(), 4);
        let ids: Vec<u32> = meta.members().iter().map(MetaMember::id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(meta.method(0).map(|m| m.name.as_str()), Some("add"));
        assert!(meta.method(2).is_none());
        assert_eq!(meta.signal(2).map(|s| s.name.as_str()), Some("changed"));
        assert_eq!(meta.property_id("total"), Some(3));
        assert_eq!(meta.signal_id("changed"), Some(2));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut builder = MetaObjectBuilder::new();
        builder
            .add_method("f", sig("(i)"), sig("v"), "")
            .expect("first");
        assert!(builder.add_method("f", sig("(i)"), sig("i"), "").is_err());
        assert!(builder.add_method("f", sig("(s)"), sig("v"), "").is_ok());
    }

    #[test]
    fn test_overload_resolution() {
        let meta = sample();
        assert_eq!(meta.method_id("add", &sig("(ii)")), Some(0));
        assert_eq!(meta.find_method("add", &sig("(dd)")).expect("exact"), 1);
        // int8 pair converts better to int32 than to double
        assert_eq!(meta.find_method("add", &sig("(cc)")).expect("scored"), 0);
        assert_eq!(meta.find_method("add", &sig("(ff)")).expect("scored"), 1);
        let err = meta.find_method("add", &sig("(s)")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MethodNotFound);
        assert!(meta.find_method("nope", &sig("()")).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let meta = sample();
        let text = serde_json::to_string(&meta).expect("serializable");
        assert!(text.contains(r#""kind":"method""#), "{}", text);
        let back: MetaObject = serde_json::from_str(&text).expect("deserializable");
        assert_eq!(back, meta);
        assert_eq!(back.method_id("add", &sig("(dd)")), Some(1));
        assert_eq!(back.description(), "calculator");
    }
}

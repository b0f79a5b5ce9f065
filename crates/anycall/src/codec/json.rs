// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON text encoding.
//!
//! Encoding never fails: kinds with no JSON form (raw buffers, objects,
//! pointers) become the string `"Error: no serialization for <kind>"`.
//! Decoding produces a dynamic value.

use crate::config::RuntimeConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{TypeDescriptor, TypeKind, Value, ValueRef};
use serde_json::{Map, Number, Value as Json};

/// Encode with the configured pretty-print setting.
pub fn to_json(value: &Value) -> String {
    to_json_with(value.view(), RuntimeConfig::global().json_pretty())
}

/// Encode `value`, compact or indented.
pub fn to_json_with(value: ValueRef<'_>, pretty: bool) -> String {
    let json = to_json_value(value);
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    // serializing a serde_json::Value into a String cannot fail
    text.unwrap_or_default()
}

/// Build the `serde_json` tree for `value`.
pub fn to_json_value(value: ValueRef<'_>) -> Json {
    match value.kind() {
        TypeKind::Void => Json::Null,
        TypeKind::Int => {
            if let Some(b) = value.as_bool() {
                Json::Bool(b)
            } else if let Some(v) = value.as_i64() {
                Json::Number(Number::from(v))
            } else {
                value
                    .as_u64()
                    .map(|v| Json::Number(Number::from(v)))
                    .unwrap_or(Json::Null)
            }
        }
        TypeKind::Float => value
            .as_f64()
            .and_then(Number::from_f64)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        TypeKind::String => Json::String(value.as_str().unwrap_or_default().to_string()),
        TypeKind::List => Json::Array(value.elements().into_iter().map(to_json_value).collect()),
        TypeKind::Map => map_to_json(value),
        TypeKind::Tuple => {
            let fields = value.descriptor().field_names();
            let members = value.elements();
            if fields.is_empty() {
                Json::Array(members.into_iter().map(to_json_value).collect())
            } else {
                let object: Map<String, Json> = fields
                    .iter()
                    .cloned()
                    .zip(members.into_iter().map(to_json_value))
                    .collect();
                Json::Object(object)
            }
        }
        TypeKind::Dynamic => match value.dynamic_inner() {
            Some(inner) => to_json_value(inner),
            None => Json::Null,
        },
        kind @ (TypeKind::Raw | TypeKind::Object | TypeKind::Pointer) => {
            let label = match kind {
                TypeKind::Raw => "raw",
                TypeKind::Object => "object",
                _ => "pointer",
            };
            log::error!("[codec] no JSON serialization for {}", value.descriptor());
            Json::String(format!("Error: no serialization for {}", label))
        }
    }
}

/// String-keyed maps become objects, other maps arrays of `[key, value]`.
fn map_to_json(value: ValueRef<'_>) -> Json {
    let entries = value.entries();
    let string_keys = entries
        .iter()
        .all(|(k, _)| string_like(*k).is_some());
    if string_keys {
        let object: Map<String, Json> = entries
            .into_iter()
            .filter_map(|(k, v)| Some((string_like(k)?.to_string(), to_json_value(v))))
            .collect();
        Json::Object(object)
    } else {
        Json::Array(
            entries
                .into_iter()
                .map(|(k, v)| Json::Array(vec![to_json_value(k), to_json_value(v)]))
                .collect(),
        )
    }
}

fn string_like(value: ValueRef<'_>) -> Option<&str> {
    match value.dynamic_inner() {
        Some(inner) => inner.as_str(),
        None => value.as_str(),
    }
}

// =======================================================================
// Decoding
// =======================================================================

/// Parse JSON text into a dynamic value.
///
/// Integers map to int64 (uint64 above `i64::MAX`), other numbers to
/// float64, arrays to lists of dynamic, objects to string-to-dynamic maps,
/// `null` to void.
pub fn from_json(text: &str) -> Result<Value> {
    let json: Json = serde_json::from_str(text).map_err(|e| {
        Error::new(
            ErrorKind::DeserializationFailure,
            format!("invalid JSON at line {} column {}: {}", e.line(), e.column(), e),
        )
    })?;
    Ok(Value::dynamic(from_json_value(&json)))
}

/// Convert a `serde_json` tree into a value.
pub fn from_json_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::void(),
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::from(v)
            } else if let Some(v) = n.as_u64() {
                Value::from(v)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => {
            let items: Vec<Value> = items
                .iter()
                .map(|item| Value::dynamic(from_json_value(item)))
                .collect();
            dynamic_list(items)
        }
        Json::Object(fields) => {
            let entries: Vec<(Value, Value)> = fields
                .iter()
                .map(|(k, v)| (Value::from(k.as_str()), Value::dynamic(from_json_value(v))))
                .collect();
            dynamic_map(entries)
        }
    }
}

/// List of dynamic from already-wrapped items.
fn dynamic_list(items: Vec<Value>) -> Value {
    Value::list(&TypeDescriptor::dynamic(), items).unwrap_or_else(|_| Value::void())
}

/// Map string to dynamic from already-wrapped entries.
fn dynamic_map(entries: Vec<(Value, Value)>) -> Value {
    Value::map(&TypeDescriptor::string(), &TypeDescriptor::dynamic(), entries)
        .unwrap_or_else(|_| Value::void())
}

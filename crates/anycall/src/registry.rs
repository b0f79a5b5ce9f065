// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named service registry.
//!
//! Process-wide table from service name to object handle. Handles may be
//! local objects or proxies; callers use them the same way.

use crate::object::AnyObject;
use std::collections::BTreeMap;
use std::sync::RwLock;

static SERVICE_REGISTRY: RwLock<BTreeMap<String, AnyObject>> = RwLock::new(BTreeMap::new());

/// Register `object` under `name`. Returns `false` (and keeps the existing
/// entry) if the name is taken.
pub fn register_service(name: &str, object: AnyObject) -> bool {
    let Ok(mut registry) = SERVICE_REGISTRY.write() else {
        return false;
    };
    if registry.contains_key(name) {
        log::debug!("[registry] service '{}' already registered", name);
        return false;
    }
    log::debug!("[registry] registered service '{}'", name);
    registry.insert(name.to_string(), object);
    true
}

/// Remove `name`; returns the handle it held.
pub fn unregister_service(name: &str) -> Option<AnyObject> {
    let removed = SERVICE_REGISTRY.write().ok()?.remove(name);
    if removed.is_some() {
        log::debug!("[registry] unregistered service '{}'", name);
    }
    removed
}

pub fn lookup_service(name: &str) -> Option<AnyObject> {
    SERVICE_REGISTRY.read().ok()?.get(name).cloned()
}

/// Registered names, sorted.
pub fn list_services() -> Vec<String> {
    SERVICE_REGISTRY
        .read()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::AnyFunction;
    use crate::object::ObjectBuilder;
    use crate::types::Value;

    fn echo() -> AnyObject {
        ObjectBuilder::new("Echo")
            .advertise_method("echo", AnyFunction::new(|s: String| s))
            .build()
            .expect("valid object")
            .into()
    }

    #[test]
    fn test_register_lookup_unregister() {
        unregister_service("test_registry_echo");

        let object = echo();
        assert!(register_service("test_registry_echo", object.clone()));
        assert!(list_services().iter().any(|s| s == "test_registry_echo"));

        let found = lookup_service("test_registry_echo").expect("registered");
        assert!(found.same_object(&object));
        let reply = found.call("echo", &[Value::from("ping")]);
        assert_eq!(reply.value(None).expect("echo").as_str(), Some("ping"));

        assert!(unregister_service("test_registry_echo").is_some());
        assert!(lookup_service("test_registry_echo").is_none());
        assert!(unregister_service("test_registry_echo").is_none());
    }

    #[test]
    fn test_no_duplicates() {
        unregister_service("test_registry_dup");

        let first = echo();
        assert!(register_service("test_registry_dup", first.clone()));
        assert!(!register_service("test_registry_dup", echo()));

        let kept = lookup_service("test_registry_dup").expect("registered");
        assert!(kept.same_object(&first));
        let count = list_services()
            .iter()
            .filter(|s| *s == "test_registry_dup")
            .count();
        assert_eq!(count, 1);

        unregister_service("test_registry_dup");
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time defaults (`DEFAULT_*` constants)
//! - **Level 2 (Dynamic)**: `RuntimeConfig` for runtime knobs and user-land keys
//!
//! # Performance
//!
//! - **Atomic swap**: `ArcSwap` for the typed settings (readers never lock)
//! - **Lock-free map**: `DashMap` for user-land keys
//!
//! # Example
//!
//! ```
//! use anycall::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::new();
//! config.update(|s| s.worker_threads = 2);
//! assert_eq!(config.worker_threads(), 2);
//!
//! config.set_user("app.service_name", "calculator");
//! assert_eq!(config.get_user_string("app.service_name").as_deref(), Some("calculator"));
//! ```

use crate::future::CallbackPolicy;
use crate::object::MetaCallType;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

// =======================================================================
// Static Defaults
// =======================================================================

/// Worker threads of the default event loop.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Default bound for blocking waits on a remote call (milliseconds).
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// Environment override for [`RuntimeSettings::worker_threads`].
pub const ENV_WORKER_THREADS: &str = "ANYCALL_WORKER_THREADS";

/// Environment override for [`RuntimeSettings::call_timeout_ms`].
pub const ENV_CALL_TIMEOUT_MS: &str = "ANYCALL_CALL_TIMEOUT_MS";

/// When set (any value), structs of different shape are compared by
/// annotation presence only, not by name.
pub const ENV_IGNORE_STRUCT_NAME: &str = "ANYCALL_IGNORE_STRUCT_NAME";

// =======================================================================
// Typed Settings
// =======================================================================

/// Typed runtime knobs. Missing YAML fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Worker threads of the default event loop (read once, at first use).
    pub worker_threads: usize,
    /// Callback delivery of promises created without an explicit policy.
    pub callback_policy: CallbackPolicy,
    /// Call policy used by `AnyObject::call`.
    pub call_policy: MetaCallType,
    /// Bound for blocking waits on remote replies.
    pub call_timeout_ms: u64,
    /// Same-named struct matching requires identical names.
    pub struct_names_strict: bool,
    /// Pretty-print JSON by default.
    pub json_pretty: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            callback_policy: CallbackPolicy::Sync,
            call_policy: MetaCallType::Auto,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            struct_names_strict: true,
            json_pretty: false,
        }
    }
}

// =======================================================================
// Runtime Configuration
// =======================================================================

/// Shared runtime configuration (thread-safe, lock-free reads).
///
/// Clone is an `Arc` increment; every clone sees the same state.
#[derive(Clone)]
pub struct RuntimeConfig {
    settings: Arc<ArcSwap<RuntimeSettings>>,
    /// User-land key/value store (`user.*`, `app.*`).
    user: Arc<DashMap<Arc<str>, Arc<str>>>,
}

static GLOBAL: OnceLock<RuntimeConfig> = OnceLock::new();

fn is_user_key(key: &str) -> bool {
    key.starts_with("user.") || key.starts_with("app.")
}

impl RuntimeConfig {
    /// New config holding the defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(RuntimeSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: RuntimeSettings) -> Self {
        Self {
            settings: Arc::new(ArcSwap::new(Arc::new(settings))),
            user: Arc::new(DashMap::new()),
        }
    }

    /// Process-wide configuration, initialised from the defaults plus
    /// environment overrides on first access.
    pub fn global() -> &'static RuntimeConfig {
        GLOBAL.get_or_init(|| {
            let config = RuntimeConfig::new();
            config.apply_env();
            config
        })
    }

    // ===================================================================
    // Typed Settings (Atomic Swap)
    // ===================================================================

    /// Snapshot of the current settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> Arc<RuntimeSettings> {
        self.settings.load_full()
    }

    /// Replace all settings atomically.
    pub fn set_settings(&self, settings: RuntimeSettings) {
        self.settings.store(Arc::new(settings));
    }

    /// Copy-modify-swap of the settings.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&mut RuntimeSettings),
    {
        self.settings.rcu(|current| {
            let mut next = RuntimeSettings::clone(current);
            f(&mut next);
            next
        });
    }

    #[inline]
    pub fn worker_threads(&self) -> usize {
        self.settings.load().worker_threads.max(1)
    }

    #[inline]
    pub fn callback_policy(&self) -> CallbackPolicy {
        self.settings.load().callback_policy
    }

    #[inline]
    pub fn call_policy(&self) -> MetaCallType {
        self.settings.load().call_policy
    }

    #[inline]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.load().call_timeout_ms)
    }

    #[inline]
    pub fn struct_names_strict(&self) -> bool {
        self.settings.load().struct_names_strict
    }

    #[inline]
    pub fn json_pretty(&self) -> bool {
        self.settings.load().json_pretty
    }

    /// Apply `ANYCALL_*` environment overrides. Unparsable values are logged
    /// and ignored.
    pub fn apply_env(&self) {
        let workers = std::env::var(ENV_WORKER_THREADS).ok();
        let timeout = std::env::var(ENV_CALL_TIMEOUT_MS).ok();
        let ignore_names = std::env::var_os(ENV_IGNORE_STRUCT_NAME).is_some();

        let workers = workers.and_then(|v| match v.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                log::warn!("[config] ignoring {}='{}'", ENV_WORKER_THREADS, v);
                None
            }
        });
        let timeout = timeout.and_then(|v| match v.parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                log::warn!("[config] ignoring {}='{}'", ENV_CALL_TIMEOUT_MS, v);
                None
            }
        });

        self.update(|s| {
            if let Some(n) = workers {
                s.worker_threads = n;
            }
            if let Some(ms) = timeout {
                s.call_timeout_ms = ms;
            }
            if ignore_names {
                s.struct_names_strict = false;
            }
        });
    }

    // ===================================================================
    // Public User-Land API
    // ===================================================================

    /// Set a user-land key.
    ///
    /// Keys must start with `user.` or `app.`; anything else is logged and
    /// skipped.
    #[inline]
    pub fn set_user(&self, key: &str, value: &str) {
        if !is_user_key(key) {
            log::error!(
                "[config] User-land keys must start with 'user.' or 'app.', got: '{}'. Skipping.",
                key
            );
            return;
        }
        self.user.insert(Arc::from(key), Arc::from(value));
    }

    #[inline]
    #[must_use]
    pub fn get_user(&self, key: &str) -> Option<Arc<str>> {
        if !is_user_key(key) {
            log::warn!(
                "[config] get_user() called with non-user key '{}'. Returns None.",
                key
            );
            return None;
        }
        self.user.get(key).map(|v| Arc::clone(&v))
    }

    #[inline]
    #[must_use]
    pub fn get_user_string(&self, key: &str) -> Option<String> {
        self.get_user(key).map(|v| v.to_string())
    }

    #[inline]
    pub fn remove_user(&self, key: &str) -> Option<Arc<str>> {
        if !is_user_key(key) {
            return None;
        }
        self.user.remove(key).map(|(_, v)| v)
    }

    #[inline]
    #[must_use]
    pub fn contains_user(&self, key: &str) -> bool {
        is_user_key(key) && self.user.contains_key(key)
    }

    /// All user-land entries whose key starts with `prefix`.
    #[must_use]
    pub fn search_user_prefix(&self, prefix: &str) -> Vec<(Arc<str>, Arc<str>)> {
        self.user
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (Arc::clone(entry.key()), Arc::clone(entry.value())))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.user.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_empty()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =======================================================================
// YAML Loader
// =======================================================================

/// Root of a YAML configuration file.
///
/// ```yaml
/// settings:
///   worker_threads: 8
///   callback_policy: async
///   call_timeout_ms: 5000
/// user:
///   app.service_name: calculator
/// ```
#[cfg(feature = "yaml-config")]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct YamlConfigDocument {
    pub settings: RuntimeSettings,
    pub user: std::collections::HashMap<String, String>,
}

#[cfg(feature = "yaml-config")]
impl RuntimeConfig {
    /// Build a config from YAML text.
    pub fn from_yaml_str(yaml_content: &str) -> crate::Result<Self> {
        let doc: YamlConfigDocument = serde_yaml::from_str(yaml_content).map_err(|e| {
            crate::Error::new(
                crate::ErrorKind::DeserializationFailure,
                format!("Failed to parse YAML: {}", e),
            )
        })?;
        let config = Self::with_settings(doc.settings);
        for (key, value) in &doc.user {
            config.set_user(key, value);
        }
        Ok(config)
    }

    /// Build a config from a YAML file.
    pub fn load_yaml_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let yaml_content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::new(
                crate::ErrorKind::DeserializationFailure,
                format!("Failed to read YAML file: {}", e),
            )
        })?;
        Self::from_yaml_str(&yaml_content)
    }
}

// =======================================================================
// Tests
// =======================================================================

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Objects and dynamic dispatch.
//!
//! An object exposes methods, signals and properties through its
//! [`MetaObject`], addressed by dense integer ids. [`AnyObject`] is the
//! handle callers hold: either a local [`DynamicObject`] or a
//! [`RemoteObject`] proxy reached through a message channel. Both answer
//! the same `meta_call` / `meta_emit` / `connect` / `disconnect` surface.
//!
//! ```
//! use anycall::function::AnyFunction;
//! use anycall::object::{AnyObject, MetaCallType, ObjectBuilder};
//! use anycall::types::Value;
//!
//! let object: AnyObject = ObjectBuilder::new("Calculator")
//!     .advertise_method("add", AnyFunction::new(|a: i32, b: i32| a + b))
//!     .build()
//!     .unwrap()
//!     .into();
//! let id = object.meta_object().methods_named("add")[0].id;
//! let sum = object.meta_call(id, &[Value::from(2i32), Value::from(3i32)], MetaCallType::Direct);
//! assert_eq!(sum.value(None).unwrap(), Value::from(5i32));
//! ```

mod dynamic;
mod meta;
mod proxy;

pub use dynamic::{DynamicObject, ObjectBuilder};
pub use meta::{MetaMember, MetaMethod, MetaObject, MetaObjectBuilder, MetaProperty, MetaSignal};
pub use proxy::RemoteObject;

use crate::config::RuntimeConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::future::Future;
use crate::signal::{SignalLink, SignalSubscriber};
use crate::signature::Signature;
use crate::types::{ObjectType, Value};
use serde::Deserialize;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Where a dispatched call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaCallType {
    /// Inline when already on the object's context, queued otherwise.
    #[default]
    Auto,
    /// Always on the calling thread.
    Direct,
    /// Always scheduled on the object's context.
    Queued,
}

/// Thread affinity of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectThreadingModel {
    /// Calls are serialized on a strand.
    SingleThread,
    /// Calls may run concurrently.
    #[default]
    MultiThread,
}

// =======================================================================
// Call metrics
// =======================================================================

/// Per-object dispatch counters.
#[derive(Debug, Default)]
pub struct CallMetrics {
    calls: AtomicU64,
    queued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`CallMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallMetricsSnapshot {
    /// Calls accepted by `meta_call`, queued or not.
    pub calls: u64,
    /// Calls scheduled on an execution context.
    pub queued: u64,
    pub completed: u64,
    /// Calls that finished with an error, lookup failures included.
    pub failed: u64,
}

impl CallMetrics {
    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, ok: bool) {
        if ok {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> CallMetricsSnapshot {
        CallMetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// =======================================================================
// AnyObject
// =======================================================================

/// Handle to a local or remote object. Cheap to clone.
#[derive(Clone)]
pub enum AnyObject {
    Local(Arc<DynamicObject>),
    Proxy(Arc<RemoteObject>),
}

impl AnyObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            AnyObject::Local(o) => o.object_type().clone(),
            AnyObject::Proxy(o) => o.object_type().clone(),
        }
    }

    /// Whether both handles designate the same object.
    pub fn same_object(&self, other: &AnyObject) -> bool {
        match (self, other) {
            (AnyObject::Local(a), AnyObject::Local(b)) => Arc::ptr_eq(a, b),
            (AnyObject::Proxy(a), AnyObject::Proxy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AnyObject::Local(_))
    }

    /// Native state attached to a local object, if it has type `T`.
    pub fn native<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            AnyObject::Local(o) => o.native::<T>(),
            AnyObject::Proxy(_) => None,
        }
    }

    pub fn meta_object(&self) -> &MetaObject {
        match self {
            AnyObject::Local(o) => o.meta_object(),
            AnyObject::Proxy(o) => o.meta_object(),
        }
    }

    /// Call method `method_id`. The outcome, errors included, is in the
    /// returned future.
    pub fn meta_call(&self, method_id: u32, args: &[Value], call_type: MetaCallType) -> Future {
        self.meta_call_expecting(method_id, args, call_type, None)
    }

    /// Like [`meta_call`](Self::meta_call), failing with `TypeMismatch`
    /// unless the method's return type converts to `returns`.
    pub fn meta_call_expecting(
        &self,
        method_id: u32,
        args: &[Value],
        call_type: MetaCallType,
        returns: Option<&Signature>,
    ) -> Future {
        match self {
            AnyObject::Local(o) => o.meta_call_expecting(method_id, args, call_type, returns),
            AnyObject::Proxy(o) => o.meta_call_expecting(method_id, args, call_type, returns),
        }
    }

    /// Trigger signal `signal_id`; a method id is called instead.
    pub fn meta_emit(&self, signal_id: u32, args: &[Value]) -> Result<()> {
        match self {
            AnyObject::Local(o) => o.meta_emit(signal_id, args),
            AnyObject::Proxy(o) => o.meta_emit(signal_id, args),
        }
    }

    /// Call the overload of `name` that best fits `args`, with the
    /// configured call policy.
    pub fn call(&self, name: &str, args: &[Value]) -> Future {
        let arguments = crate::codec::args_signature(args);
        match self.meta_object().find_method(name, &arguments) {
            Ok(id) => self.meta_call(id, args, RuntimeConfig::global().call_policy()),
            Err(e) => Future::from_error(e),
        }
    }

    /// [`call`](Self::call), then block for the outcome. Gives up with
    /// `Timeout` after the configured call timeout.
    pub fn call_blocking(&self, name: &str, args: &[Value]) -> Result<Value> {
        let timeout = RuntimeConfig::global().call_timeout();
        self.call(name, args).value(Some(timeout))
    }

    pub fn connect(&self, signal_id: u32, subscriber: SignalSubscriber) -> Result<SignalLink> {
        match self {
            AnyObject::Local(o) => o.connect(signal_id, subscriber),
            AnyObject::Proxy(o) => o.connect(signal_id, subscriber),
        }
    }

    /// Connect to the signal called `name`.
    pub fn connect_named(&self, name: &str, subscriber: SignalSubscriber) -> Result<SignalLink> {
        let meta = self.meta_object();
        let id = meta
            .signal_id(name)
            .or_else(|| meta.property_id(name))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::SignalNotFound,
                    format!("Can't find signal: {}", name),
                )
            })?;
        self.connect(id, subscriber)
    }

    /// Remove a subscription. `Ok(false)` if the link was not connected.
    pub fn disconnect(&self, link: SignalLink) -> Result<bool> {
        match self {
            AnyObject::Local(o) => o.disconnect(link),
            AnyObject::Proxy(o) => o.disconnect(link),
        }
    }

    pub fn meta_property(&self, property_id: u32) -> Future {
        match self {
            AnyObject::Local(o) => Future::from_result(o.meta_property(property_id)),
            AnyObject::Proxy(o) => o.meta_property(property_id),
        }
    }

    pub fn meta_set_property(&self, property_id: u32, value: Value) -> Future {
        match self {
            AnyObject::Local(o) => Future::from_result(
                o.meta_set_property(property_id, value).map(|()| Value::void()),
            ),
            AnyObject::Proxy(o) => o.meta_set_property(property_id, value),
        }
    }

    pub fn downgrade(&self) -> WeakObject {
        match self {
            AnyObject::Local(o) => WeakObject::Local(Arc::downgrade(o)),
            AnyObject::Proxy(o) => WeakObject::Proxy(Arc::downgrade(o)),
        }
    }
}

impl From<Arc<DynamicObject>> for AnyObject {
    fn from(object: Arc<DynamicObject>) -> Self {
        AnyObject::Local(object)
    }
}

impl From<Arc<RemoteObject>> for AnyObject {
    fn from(object: Arc<RemoteObject>) -> Self {
        AnyObject::Proxy(object)
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyObject::Local(o) => write!(f, "AnyObject::Local({})", o.object_type().name()),
            AnyObject::Proxy(o) => write!(f, "AnyObject::Proxy({})", o.object_type().name()),
        }
    }
}

/// Non-owning object handle, used by signal subscribers.
#[derive(Clone)]
pub enum WeakObject {
    Local(Weak<DynamicObject>),
    Proxy(Weak<RemoteObject>),
}

impl WeakObject {
    pub fn upgrade(&self) -> Option<AnyObject> {
        match self {
            WeakObject::Local(w) => w.upgrade().map(AnyObject::Local),
            WeakObject::Proxy(w) => w.upgrade().map(AnyObject::Proxy),
        }
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &self.upgrade().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;

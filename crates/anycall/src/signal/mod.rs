// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish/subscribe channels keyed by signal id.
//!
//! `trigger` takes a snapshot of the subscriber list under a short lock and
//! invokes the snapshot outside of it. A subscriber connected or removed
//! while a trigger is in flight may or may not see that trigger: delivery is
//! representative, not linearizable. Each snapshot is delivered in
//! connection order; concurrent triggers are not ordered with each other.
//!
//! ```
//! use anycall::signal::{SignalBus, SignalSubscriber};
//! use anycall::types::Value;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! let bus = SignalBus::new(2);
//! let seen = Arc::new(AtomicI64::new(0));
//! let sink = Arc::clone(&seen);
//! let link = bus.connect(SignalSubscriber::callback(move |args| {
//!     sink.store(args[0].as_i64().unwrap_or(0), Ordering::SeqCst);
//! }));
//! bus.trigger(&[Value::from(7i32)]);
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! assert!(bus.disconnect(link));
//! ```

mod proxy;

pub use proxy::ProxySignal;

use crate::exec::{default_context, ExecutionContext};
use crate::function::AnyFunction;
use crate::object::{AnyObject, MetaCallType, WeakObject};
use crate::types::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

/// Subscription handle: `(signal id << 32) | sequence`.
pub type SignalLink = u64;

/// Link value that never designates a subscription.
pub const INVALID_SIGNAL_LINK: SignalLink = u64::MAX;

/// Receiver of raw signal arguments.
pub type SignalSink = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Signal id encoded in `link`.
#[inline]
pub fn link_signal_id(link: SignalLink) -> u32 {
    (link >> 32) as u32
}

#[derive(Clone)]
enum Target {
    Callback(SignalSink),
    Function(AnyFunction),
    /// Held weakly; skipped once the object is gone.
    Method { object: WeakObject, method_id: u32 },
}

/// One subscriber plus the policy it is invoked with.
#[derive(Clone)]
pub struct SignalSubscriber {
    target: Target,
    call_type: MetaCallType,
}

impl SignalSubscriber {
    /// Closure receiving the signal arguments.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self::from_sink(Arc::new(f))
    }

    pub fn from_sink(sink: SignalSink) -> Self {
        Self {
            target: Target::Callback(sink),
            call_type: MetaCallType::Auto,
        }
    }

    /// Type-erased function; arguments are converted to its parameters.
    pub fn function(function: AnyFunction) -> Self {
        Self {
            target: Target::Function(function),
            call_type: MetaCallType::Auto,
        }
    }

    /// Method `method_id` of `object`, invoked through `meta_call`.
    pub fn method(object: &AnyObject, method_id: u32) -> Self {
        Self {
            target: Target::Method {
                object: object.downgrade(),
                method_id,
            },
            call_type: MetaCallType::Auto,
        }
    }

    #[must_use]
    pub fn with_call_type(mut self, call_type: MetaCallType) -> Self {
        self.call_type = call_type;
        self
    }

    pub fn call_type(&self) -> MetaCallType {
        self.call_type
    }

    fn invoke(&self, signal_id: u32, args: &[Value]) {
        match &self.target {
            Target::Method { object, method_id } => {
                let Some(object) = object.upgrade() else {
                    log::trace!("[signal] {}: subscriber object is gone", signal_id);
                    return;
                };
                let method_id = *method_id;
                object
                    .meta_call(method_id, args, self.call_type)
                    .connect(move |done| {
                        if let Some(e) = done.error() {
                            log::warn!(
                                "[signal] {}: subscriber method {} failed: {}",
                                signal_id,
                                method_id,
                                e
                            );
                        }
                    });
            }
            Target::Callback(_) | Target::Function(_) => match self.call_type {
                MetaCallType::Queued => {
                    let this = self.clone();
                    let args = args.to_vec();
                    default_context().post(Box::new(move || this.run(signal_id, &args)));
                }
                MetaCallType::Direct | MetaCallType::Auto => self.run(signal_id, args),
            },
        }
    }

    fn run(&self, signal_id: u32, args: &[Value]) {
        match &self.target {
            Target::Callback(sink) => sink(args),
            Target::Function(function) => {
                if let Err(e) = function.call(args) {
                    log::warn!("[signal] {}: subscriber failed: {}", signal_id, e);
                }
            }
            // routed through meta_call by invoke
            Target::Method { .. } => {}
        }
    }
}

impl fmt::Debug for SignalSubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.target {
            Target::Callback(_) => "callback",
            Target::Function(_) => "function",
            Target::Method { .. } => "method",
        };
        f.debug_struct("SignalSubscriber")
            .field("target", &kind)
            .field("call_type", &self.call_type)
            .finish()
    }
}

// =======================================================================
// SignalBus
// =======================================================================

type SubscribersHook = Arc<dyn Fn(bool) + Send + Sync>;

struct Inner {
    signal_id: u32,
    next_seq: AtomicU32,
    subscribers: Mutex<Vec<(SignalLink, SignalSubscriber)>>,
    on_subscribers: Mutex<Option<SubscribersHook>>,
    /// Presence last reported to the hook. Held while the hook runs, so
    /// edges are delivered one at a time and in order.
    reported: Mutex<bool>,
}

/// Subscriber list of one signal. Cheap to clone; clones share the list.
#[derive(Clone)]
pub struct SignalBus {
    inner: Arc<Inner>,
}

impl SignalBus {
    pub fn new(signal_id: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                signal_id,
                next_seq: AtomicU32::new(1),
                subscribers: Mutex::new(Vec::new()),
                on_subscribers: Mutex::new(None),
                reported: Mutex::new(false),
            }),
        }
    }

    #[inline]
    pub fn signal_id(&self) -> u32 {
        self.inner.signal_id
    }

    /// Add `subscriber`; returns its link.
    pub fn connect(&self, subscriber: SignalSubscriber) -> SignalLink {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let link = (u64::from(self.inner.signal_id) << 32) | u64::from(seq);
        self.inner.subscribers.lock().push((link, subscriber));
        log::trace!("[signal] {}: connected link {:#x}", self.inner.signal_id, link);
        self.sync_subscribers();
        link
    }

    /// Remove the subscriber behind `link`. `false` if it was not connected.
    pub fn disconnect(&self, link: SignalLink) -> bool {
        let removed = {
            let mut subscribers = self.inner.subscribers.lock();
            let before = subscribers.len();
            subscribers.retain(|(l, _)| *l != link);
            subscribers.len() < before
        };
        if removed {
            log::trace!("[signal] {}: disconnected link {:#x}", self.inner.signal_id, link);
            self.sync_subscribers();
        }
        removed
    }

    pub fn disconnect_all(&self) {
        self.inner.subscribers.lock().clear();
        self.sync_subscribers();
    }

    /// Invoke every subscriber with `args`.
    pub fn trigger(&self, args: &[Value]) {
        let snapshot: Vec<SignalSubscriber> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        log::trace!(
            "[signal] {}: trigger to {} subscriber(s)",
            self.inner.signal_id,
            snapshot.len()
        );
        for subscriber in &snapshot {
            subscriber.invoke(self.inner.signal_id, args);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Install a hook called with `true` on the first subscription and
    /// `false` when the last one goes away. Calls never overlap and always
    /// alternate. The hook must not connect to or disconnect from this bus.
    pub fn set_on_subscribers<F>(&self, hook: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        *self.inner.on_subscribers.lock() = Some(Arc::new(hook));
    }

    /// Report the current presence to the hook if it differs from the last
    /// report. The edge is decided and delivered under `reported`, so a
    /// racing connect and disconnect settle on the final subscriber count.
    fn sync_subscribers(&self) {
        let mut reported = self.inner.reported.lock();
        let present = self.has_subscribers();
        if *reported == present {
            return;
        }
        *reported = present;
        let hook = self.inner.on_subscribers.lock().clone();
        if let Some(hook) = hook {
            hook(present);
        }
    }

    pub fn downgrade(&self) -> WeakSignalBus {
        WeakSignalBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("signal_id", &self.inner.signal_id)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Non-owning bus handle.
#[derive(Clone)]
pub struct WeakSignalBus {
    inner: Weak<Inner>,
}

impl WeakSignalBus {
    pub fn upgrade(&self) -> Option<SignalBus> {
        self.inner.upgrade().map(|inner| SignalBus { inner })
    }
}

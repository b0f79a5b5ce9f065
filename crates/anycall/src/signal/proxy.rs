// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local relay for a signal that lives elsewhere.

use super::{SignalBus, SignalLink, SignalSink, SignalSubscriber};
use crate::error::Result;
use crate::object::AnyObject;
use crate::types::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Subscribe = dyn Fn(SignalSink) -> Result<SignalLink> + Send + Sync;
type Unsubscribe = dyn Fn(SignalLink) -> Result<()> + Send + Sync;

struct Upstream {
    subscribe: Box<Subscribe>,
    unsubscribe: Box<Unsubscribe>,
    link: Mutex<Option<SignalLink>>,
}

impl Upstream {
    fn attach(&self, sink: SignalSink) {
        let mut link = self.link.lock();
        if link.is_some() {
            return;
        }
        match (self.subscribe)(sink) {
            Ok(l) => *link = Some(l),
            Err(e) => log::warn!("[signal] upstream subscribe failed: {}", e),
        }
    }

    fn detach(&self) {
        let Some(l) = self.link.lock().take() else {
            return;
        };
        if let Err(e) = (self.unsubscribe)(l) {
            log::warn!("[signal] upstream unsubscribe failed: {}", e);
        }
    }
}

/// A [`SignalBus`] fed by an upstream signal.
///
/// The upstream subscription exists only while the local bus has
/// subscribers: it is made on the first local `connect` and dropped on the
/// last `disconnect` (and when the proxy is dropped).
pub struct ProxySignal {
    bus: SignalBus,
    upstream: Arc<Upstream>,
}

impl ProxySignal {
    /// Relay whose upstream is reached through `subscribe`/`unsubscribe`.
    /// `subscribe` receives the sink that re-triggers the local bus.
    pub fn new<S, U>(signal_id: u32, subscribe: S, unsubscribe: U) -> Self
    where
        S: Fn(SignalSink) -> Result<SignalLink> + Send + Sync + 'static,
        U: Fn(SignalLink) -> Result<()> + Send + Sync + 'static,
    {
        let bus = SignalBus::new(signal_id);
        let upstream = Arc::new(Upstream {
            subscribe: Box::new(subscribe),
            unsubscribe: Box::new(unsubscribe),
            link: Mutex::new(None),
        });
        let weak_bus = bus.downgrade();
        let hook_upstream = Arc::downgrade(&upstream);
        bus.set_on_subscribers(move |present| {
            let Some(upstream) = hook_upstream.upgrade() else {
                return;
            };
            if present {
                let relay = weak_bus.clone();
                upstream.attach(Arc::new(move |args: &[Value]| {
                    if let Some(bus) = relay.upgrade() {
                        bus.trigger(args);
                    }
                }));
            } else {
                upstream.detach();
            }
        });
        Self { bus, upstream }
    }

    /// Relay signal `signal_id` of `object`.
    pub fn for_object(object: &AnyObject, signal_id: u32) -> Self {
        let source = object.downgrade();
        let target = object.downgrade();
        Self::new(
            signal_id,
            move |sink| match source.upgrade() {
                Some(object) => object.connect(signal_id, SignalSubscriber::from_sink(sink)),
                None => Err(crate::error::Error::signal_not_found(signal_id)),
            },
            move |link| {
                if let Some(object) = target.upgrade() {
                    object.disconnect(link)?;
                }
                Ok(())
            },
        )
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn connect(&self, subscriber: SignalSubscriber) -> SignalLink {
        self.bus.connect(subscriber)
    }

    pub fn disconnect(&self, link: SignalLink) -> bool {
        self.bus.disconnect(link)
    }

    /// Whether the upstream subscription is currently held.
    pub fn is_relaying(&self) -> bool {
        self.upstream.link.lock().is_some()
    }
}

impl Drop for ProxySignal {
    fn drop(&mut self) {
        self.upstream.detach();
    }
}

impl fmt::Debug for ProxySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySignal")
            .field("bus", &self.bus)
            .field("relaying", &self.is_relaying())
            .finish()
    }
}

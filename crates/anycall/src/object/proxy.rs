// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client-side stand-in for an object behind a [`MessageChannel`].

use super::meta::MetaObject;
use super::MetaCallType;
use crate::error::{Error, ErrorKind, Result};
use crate::future::{Future, Promise};
use crate::remote::{encode_dynamic, CallReply, CallRequest, MessageChannel};
use crate::signal::{link_signal_id, ProxySignal, SignalLink, SignalSubscriber};
use crate::signature::Signature;
use crate::types::{ObjectType, Value};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Proxy object. Calls are encoded and sent over the channel; signals are
/// relayed through one [`ProxySignal`] per signal id, subscribed upstream
/// only while local subscribers exist.
pub struct RemoteObject {
    object_type: ObjectType,
    meta: MetaObject,
    channel: Arc<dyn MessageChannel>,
    signals: DashMap<u32, Arc<ProxySignal>>,
}

impl RemoteObject {
    /// Fetch the member table and build the proxy.
    pub fn open(channel: Arc<dyn MessageChannel>) -> Result<Arc<Self>> {
        let meta = channel.meta_object()?;
        log::debug!(
            "[remote] opened proxy for '{}' ({} members)",
            channel.object_name(),
            meta.len()
        );
        Ok(Arc::new(Self {
            object_type: ObjectType::new(channel.object_name()),
            meta,
            channel,
            signals: DashMap::new(),
        }))
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn meta_object(&self) -> &MetaObject {
        &self.meta
    }

    pub fn channel(&self) -> &Arc<dyn MessageChannel> {
        &self.channel
    }

    /// Send a call. `call_type` applies on the serving side, where the
    /// object lives; the request itself is always sent right away.
    pub fn meta_call_expecting(
        &self,
        method_id: u32,
        args: &[Value],
        _call_type: MetaCallType,
        returns: Option<&Signature>,
    ) -> Future {
        let Some(method) = self.meta.method(method_id) else {
            return Future::from_error(Error::method_not_found(method_id));
        };
        if let Some(expected) = returns {
            if method.returns.is_convertible_to(expected) == 0.0 {
                return Future::from_error(Error::type_mismatch(format!(
                    "method {} returns {}, caller expects {}",
                    method_id, method.returns, expected
                )));
            }
        }
        match CallRequest::new(method_id, args) {
            Ok(request) => resolve_reply(self.channel.call(request)),
            Err(e) => Future::from_error(e),
        }
    }

    pub fn meta_emit(&self, signal_id: u32, args: &[Value]) -> Result<()> {
        if self.meta.method(signal_id).is_some() {
            log::debug!(
                "[remote] {}: meta_emit on method {}, calling it",
                self.object_type.name(),
                signal_id
            );
            let name = self.object_type.name().to_string();
            self.meta_call_expecting(signal_id, args, MetaCallType::Auto, None)
                .connect(move |done| {
                    if let Some(e) = done.error() {
                        log::warn!("[remote] {}: emit of method {} failed: {}", name, signal_id, e);
                    }
                });
            return Ok(());
        }
        if !self.has_signal(signal_id) {
            log::error!(
                "[remote] {}: meta_emit: no such event {}",
                self.object_type.name(),
                signal_id
            );
            return Err(Error::signal_not_found(signal_id));
        }
        self.channel.post(CallRequest::new(signal_id, args)?)
    }

    fn has_signal(&self, signal_id: u32) -> bool {
        self.meta.signal(signal_id).is_some() || self.meta.property(signal_id).is_some()
    }

    fn proxy_signal(&self, signal_id: u32) -> Arc<ProxySignal> {
        let entry = self.signals.entry(signal_id).or_insert_with(|| {
            let subscribe = Arc::clone(&self.channel);
            let unsubscribe = Arc::clone(&self.channel);
            Arc::new(ProxySignal::new(
                signal_id,
                move |sink| subscribe.subscribe(signal_id, sink),
                move |link| unsubscribe.unsubscribe(link),
            ))
        });
        Arc::clone(entry.value())
    }

    pub fn connect(&self, signal_id: u32, subscriber: SignalSubscriber) -> Result<SignalLink> {
        if !self.has_signal(signal_id) {
            return Err(Error::signal_not_found(signal_id));
        }
        // entry guard is released before the upstream subscription happens
        let proxy = self.proxy_signal(signal_id);
        Ok(proxy.connect(subscriber))
    }

    pub fn disconnect(&self, link: SignalLink) -> Result<bool> {
        let signal_id = link_signal_id(link);
        if !self.has_signal(signal_id) {
            return Err(Error::signal_not_found(signal_id));
        }
        let proxy = self.signals.get(&signal_id).map(|p| Arc::clone(p.value()));
        Ok(proxy.is_some_and(|p| p.disconnect(link)))
    }

    pub fn meta_property(&self, property_id: u32) -> Future {
        if self.meta.property(property_id).is_none() {
            return Future::from_error(Error::property_not_found(property_id));
        }
        resolve_reply(self.channel.property(property_id))
    }

    pub fn meta_set_property(&self, property_id: u32, value: Value) -> Future {
        if self.meta.property(property_id).is_none() {
            return Future::from_error(Error::property_not_found(property_id));
        }
        match encode_dynamic(value) {
            Ok(payload) => resolve_reply(self.channel.set_property(property_id, payload)),
            Err(e) => Future::from_error(e),
        }
    }
}

/// Future of the decoded outcome carried by a reply future. Canceling it
/// cancels the transport future.
fn resolve_reply(reply: Future) -> Future {
    let promise = Promise::new();
    let result = promise.future();
    let upstream = reply.clone();
    promise.set_on_cancel(move |_| {
        if let Err(e) = upstream.cancel() {
            log::debug!("[remote] reply not cancelable: {}", e);
        }
    });
    reply.connect(move |done| {
        let outcome = done
            .value(Some(Duration::ZERO))
            .and_then(|value| value.to::<CallReply>())
            .and_then(CallReply::into_result);
        let _ = match outcome {
            Ok(value) => promise.set_value(value),
            Err(e) if e.kind() == ErrorKind::Canceled => promise.set_canceled(),
            Err(e) => promise.set_error(e),
        };
    });
    result
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("type", &self.object_type.name())
            .field("members", &self.meta.len())
            .field("relayed_signals", &self.signals.len())
            .finish()
    }
}

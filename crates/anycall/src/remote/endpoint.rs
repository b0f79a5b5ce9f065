// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server side of the call boundary.

use super::types::{CallReply, CallRequest};
use crate::codec;
use crate::error::{Error, ErrorKind, Result};
use crate::future::Future;
use crate::object::{AnyObject, MetaCallType, MetaObject};
use crate::signal::{SignalLink, SignalSubscriber};
use crate::types::{IntoValue, TypeDescriptor, Value};
use std::sync::Arc;

/// Receives encoded signal events for one subscription.
pub type EventForwarder = Arc<dyn Fn(CallRequest) + Send + Sync>;

/// Exposes a local object to a transport.
///
/// Every answer is a future resolving to a [`CallReply`] value; failures
/// travel inside the reply, so the future itself only fails if the reply
/// cannot be built.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    name: String,
    object: AnyObject,
}

impl ServiceEndpoint {
    pub fn new(name: &str, object: AnyObject) -> Self {
        Self {
            name: name.to_string(),
            object,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &AnyObject {
        &self.object
    }

    pub fn meta_object(&self) -> MetaObject {
        self.object.meta_object().clone()
    }

    /// JSON document describing the object's members.
    pub fn export_meta_object(&self) -> Result<String> {
        serde_json::to_string(self.object.meta_object())
            .map_err(|e| Error::new(ErrorKind::SerializationFailure, e.to_string()))
    }

    pub fn handle_call(&self, request: &CallRequest) -> Future {
        let args = match request.arguments() {
            Ok(args) => args,
            Err(e) => {
                log::debug!("[remote] {}: undecodable call {}: {}", self.name, request.method_id, e);
                return Future::ready(CallReply::failure(&e).into_value());
            }
        };
        log::trace!(
            "[remote] {}: call {} {}",
            self.name,
            request.method_id,
            request.signature
        );
        reply_to(self.object.meta_call(request.method_id, &args, MetaCallType::Auto))
    }

    /// Emit a signal (or fall back to a call) without waiting for a reply.
    pub fn handle_post(&self, request: &CallRequest) -> Result<()> {
        let args = request.arguments()?;
        self.object.meta_emit(request.method_id, &args)
    }

    /// Forward every trigger of `signal_id` to `forward` as an encoded event.
    pub fn subscribe(&self, signal_id: u32, forward: EventForwarder) -> Result<SignalLink> {
        let name = self.name.clone();
        let link = self.object.connect(
            signal_id,
            SignalSubscriber::callback(move |args| match CallRequest::new(signal_id, args) {
                Ok(event) => forward(event),
                Err(e) => log::warn!("[remote] {}: cannot encode signal {}: {}", name, signal_id, e),
            }),
        )?;
        log::debug!("[remote] {}: subscribed to signal {}", self.name, signal_id);
        Ok(link)
    }

    pub fn unsubscribe(&self, link: SignalLink) -> Result<bool> {
        self.object.disconnect(link)
    }

    pub fn property(&self, property_id: u32) -> Future {
        reply_to(self.object.meta_property(property_id))
    }

    /// `payload` is a dynamic-encoded value.
    pub fn set_property(&self, property_id: u32, payload: &[u8]) -> Future {
        let value = match codec::decode(&TypeDescriptor::dynamic(), payload) {
            Ok(value) => value,
            Err(e) => return Future::ready(CallReply::failure(&e).into_value()),
        };
        let value = match value.dynamic_inner() {
            Some(inner) => inner.to_owned(),
            None => value,
        };
        reply_to(self.object.meta_set_property(property_id, value))
    }
}

fn reply_to(outcome: Future) -> Future {
    outcome.then(|done| Ok(CallReply::from_outcome(done).into_value()))
}

/// Dynamic-encoded payload of `value`, as sent by `set_property`.
pub(crate) fn encode_dynamic(value: Value) -> Result<Vec<u8>> {
    codec::encode(&Value::dynamic(value))
}

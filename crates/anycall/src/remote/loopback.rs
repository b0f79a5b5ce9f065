// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process channel that still goes through the wire encodings.

use super::endpoint::ServiceEndpoint;
use super::types::{CallReply, CallRequest};
use super::MessageChannel;
use crate::error::{Error, ErrorKind, Result};
use crate::future::Future;
use crate::object::MetaObject;
use crate::signal::{SignalLink, SignalSink};
use crate::types::IntoValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Client channel bound directly to a [`ServiceEndpoint`].
///
/// Requests, replies and signal events are framed to bytes and parsed back,
/// and the member table is exchanged as JSON, so a [`RemoteObject`] over
/// this channel sees exactly what a networked peer would.
///
/// [`RemoteObject`]: crate::object::RemoteObject
#[derive(Debug)]
pub struct LoopbackChannel {
    endpoint: Arc<ServiceEndpoint>,
    frames: AtomicU64,
}

impl LoopbackChannel {
    pub fn new(endpoint: Arc<ServiceEndpoint>) -> Self {
        Self {
            endpoint,
            frames: AtomicU64::new(0),
        }
    }

    /// Frames sent in either direction so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn carry_request(&self, request: &CallRequest) -> Result<CallRequest> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        CallRequest::from_bytes(&request.to_bytes()?)
    }

    fn carry_reply(reply: Future) -> Future {
        reply.and_then(|value| {
            let reply: CallReply = value.to()?;
            Ok(CallReply::from_bytes(&reply.to_bytes()?)?.into_value())
        })
    }
}

impl MessageChannel for LoopbackChannel {
    fn object_name(&self) -> &str {
        self.endpoint.name()
    }

    fn meta_object(&self) -> Result<MetaObject> {
        let document = self.endpoint.export_meta_object()?;
        serde_json::from_str(&document)
            .map_err(|e| Error::new(ErrorKind::Transport, format!("bad member table: {}", e)))
    }

    fn call(&self, request: CallRequest) -> Future {
        match self.carry_request(&request) {
            Ok(request) => Self::carry_reply(self.endpoint.handle_call(&request)),
            Err(e) => Future::from_error(e),
        }
    }

    fn post(&self, request: CallRequest) -> Result<()> {
        let request = self.carry_request(&request)?;
        self.endpoint.handle_post(&request)
    }

    fn subscribe(&self, signal_id: u32, sink: SignalSink) -> Result<SignalLink> {
        self.endpoint.subscribe(
            signal_id,
            Arc::new(move |event: CallRequest| {
                let parsed = event
                    .to_bytes()
                    .and_then(|bytes| CallRequest::from_bytes(&bytes))
                    .and_then(|event| event.arguments());
                match parsed {
                    Ok(args) => sink(&args),
                    Err(e) => log::warn!("[remote] dropped signal {} event: {}", signal_id, e),
                }
            }),
        )
    }

    fn unsubscribe(&self, link: SignalLink) -> Result<()> {
        self.endpoint.unsubscribe(link).map(|_| ())
    }

    fn property(&self, property_id: u32) -> Future {
        Self::carry_reply(self.endpoint.property(property_id))
    }

    fn set_property(&self, property_id: u32, payload: Vec<u8>) -> Future {
        self.frames.fetch_add(1, Ordering::Relaxed);
        Self::carry_reply(self.endpoint.set_property(property_id, &payload))
    }
}

impl From<ServiceEndpoint> for LoopbackChannel {
    fn from(endpoint: ServiceEndpoint) -> Self {
        Self::new(Arc::new(endpoint))
    }
}

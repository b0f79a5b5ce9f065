// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call boundary between the dispatch layer and a transport.
//!
//! # Overview
//!
//! - A transport hands the server side `(method id, signature, bytes)` as a
//!   [`CallRequest`] and gets back `(status, bytes)` as a [`CallReply`].
//! - [`ServiceEndpoint`] answers requests against a local object.
//! - [`MessageChannel`] is what a client proxy talks to;
//!   [`RemoteObject`](crate::object::RemoteObject) turns one back into an
//!   [`AnyObject`](crate::object::AnyObject).
//! - [`LoopbackChannel`] connects the two in-process.
//!
//! Framing on a real socket is left to the transport.
//!
//! # Example
//!
//! ```
//! use anycall::function::AnyFunction;
//! use anycall::object::{AnyObject, ObjectBuilder, RemoteObject};
//! use anycall::remote::{LoopbackChannel, ServiceEndpoint};
//! use anycall::types::Value;
//! use std::sync::Arc;
//!
//! let local: AnyObject = ObjectBuilder::new("Echo")
//!     .advertise_method("echo", AnyFunction::new(|s: String| s))
//!     .build()
//!     .unwrap()
//!     .into();
//! let channel = Arc::new(LoopbackChannel::from(ServiceEndpoint::new("echo", local)));
//! let remote: AnyObject = RemoteObject::open(channel).unwrap().into();
//! let reply = remote.call("echo", &[Value::from("hi")]);
//! assert_eq!(reply.value(None).unwrap().as_str(), Some("hi"));
//! ```

mod endpoint;
mod loopback;
mod types;

pub use endpoint::{EventForwarder, ServiceEndpoint};
pub use loopback::LoopbackChannel;
pub use types::{CallReply, CallRequest, CallStatus};

pub(crate) use endpoint::encode_dynamic;

use crate::error::Result;
use crate::future::Future;
use crate::object::MetaObject;
use crate::signal::{SignalLink, SignalSink};

/// Client side of a connection to one remote object.
///
/// Futures returned by `call`, `property` and `set_property` resolve to a
/// [`CallReply`] value; they fail only on transport errors.
pub trait MessageChannel: Send + Sync {
    /// Name the peer registered the object under.
    fn object_name(&self) -> &str;

    /// Member table of the remote object.
    fn meta_object(&self) -> Result<MetaObject>;

    fn call(&self, request: CallRequest) -> Future;

    /// Fire-and-forget emit.
    fn post(&self, request: CallRequest) -> Result<()>;

    /// Have `sink` receive the decoded arguments of every trigger.
    fn subscribe(&self, signal_id: u32, sink: SignalSink) -> Result<SignalLink>;

    fn unsubscribe(&self, link: SignalLink) -> Result<()>;

    fn property(&self, property_id: u32) -> Future;

    /// `payload` holds the new value, dynamic-encoded.
    fn set_property(&self, property_id: u32, payload: Vec<u8>) -> Future;
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # anycall - type-erased remote-call runtime
//!
//! Callers invoke named methods on local or remote objects with dynamically
//! typed arguments and get back an asynchronously resolved result.
//!
//! ## Quick Start
//!
//! ```rust
//! use anycall::{AnyFunction, AnyObject, ObjectBuilder, Result, Value};
//!
//! fn main() -> Result<()> {
//!     let calculator: AnyObject = ObjectBuilder::new("Calculator")
//!         .advertise_method("add", AnyFunction::new(|a: i32, b: i32| a + b))
//!         .advertise_signal("computed", "(i)")
//!         .build()?
//!         .into();
//!
//!     let sum = calculator.call("add", &[Value::from(2i32), Value::from(3i32)]);
//!     assert_eq!(sum.value(None)?, Value::from(5i32));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                      Registry / Call boundary                       |
//! |   register_service | ServiceEndpoint | MessageChannel | RemoteObject|
//! +---------------------------------------------------------------------+
//! |                          Dispatch Layer                             |
//! |   MetaObject | DynamicObject | AnyObject | SignalBus | call policy  |
//! +---------------------------------------------------------------------+
//! |                       Async + Execution                             |
//! |   Promise / Future / FutureBarrier | EventLoop | Strand             |
//! +---------------------------------------------------------------------+
//! |                          Type Layer                                 |
//! |   Signature | TypeDescriptor | Value / ValueRef | AnyFunction | codec|
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Value`] | Type-erased value: descriptor plus storage |
//! | [`Signature`] | Compact textual type description used on the wire |
//! | [`AnyFunction`] | Closure with declared parameter and return types |
//! | [`AnyObject`] | Local or remote object handle |
//! | [`Future`] / [`Promise`] | Asynchronous result of every call |
//! | [`SignalBus`] | Publish/subscribe channel of one signal |
//!
//! ## Modules Overview
//!
//! - [`types`] - descriptors, values, conversion
//! - [`signature`] - signature grammar
//! - [`codec`] - binary and JSON encodings
//! - [`object`] - member tables and dispatch
//! - [`future`] - promises, futures, barriers
//! - [`remote`] - call boundary and loopback channel

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Binary and JSON value encodings.
pub mod codec;
/// Runtime configuration (defaults, typed settings, user keys, YAML loader).
pub mod config;
/// Error taxonomy shared by every layer.
pub mod error;
/// Execution contexts: event loops and strands.
pub mod exec;
/// Type-erased callables.
pub mod function;
/// Promise/Future asynchronous results and barriers.
pub mod future;
/// Member tables, dynamic objects and dispatch.
pub mod object;
/// Process-wide named service table.
pub mod registry;
/// Call boundary between dispatch and transport.
pub mod remote;
/// Signal buses and relays.
pub mod signal;
/// Wire signature grammar.
pub mod signature;
/// Type descriptors and type-erased values.
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use function::AnyFunction;
pub use future::{Future, FutureBarrier, FutureState, Promise};
pub use object::{AnyObject, MetaCallType, MetaObject, ObjectBuilder};
pub use signal::{SignalBus, SignalLink, SignalSubscriber};
pub use signature::Signature;
pub use types::{TypeDescriptor, Value, ValueRef};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

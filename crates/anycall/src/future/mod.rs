// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Asynchronous results.
//!
//! A [`Promise`] is the single writer of a shared state; any number of
//! [`Future`] handles read it. The state leaves `Running` exactly once.
//! Callbacks connected before completion run when it happens; callbacks
//! connected afterwards run immediately. Either way each runs once, on the
//! completing thread ([`CallbackPolicy::Sync`]) or on the default event
//! loop ([`CallbackPolicy::Async`]).
//!
//! ```
//! use anycall::future::{FutureState, Promise};
//! use anycall::types::Value;
//!
//! let promise = Promise::new();
//! let future = promise.future();
//! promise.set_value(Value::from(42i32)).unwrap();
//! assert_eq!(future.wait(None), FutureState::FinishedWithValue);
//! assert!(promise.set_value(Value::from(1i32)).is_err());
//! ```

mod barrier;

pub use barrier::{wait_for_all, FutureBarrier};

use crate::config::RuntimeConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::exec::{default_context, ExecutionContext as _};
use crate::types::Value;
use parking_lot::{Condvar, Mutex};
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State of an asynchronous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FutureState {
    Running,
    FinishedWithValue,
    FinishedWithError,
    Canceled,
}

impl FutureState {
    #[inline]
    pub fn is_finished(self) -> bool {
        self != FutureState::Running
    }
}

/// Where completion callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackPolicy {
    /// On the thread that completes the promise (or connects late).
    #[default]
    Sync,
    /// Posted to the default event loop.
    Async,
}

type Callback = Box<dyn FnOnce(&Future) + Send + 'static>;
type CancelHandler = Arc<dyn Fn(&Promise) + Send + Sync + 'static>;

enum Outcome {
    Pending,
    Value(Value),
    Error(Error),
    Canceled,
}

struct State {
    outcome: Outcome,
    callbacks: Vec<Callback>,
    on_cancel: Option<CancelHandler>,
    cancel_requested: bool,
}

impl State {
    fn state(&self) -> FutureState {
        match self.outcome {
            Outcome::Pending => FutureState::Running,
            Outcome::Value(_) => FutureState::FinishedWithValue,
            Outcome::Error(_) => FutureState::FinishedWithError,
            Outcome::Canceled => FutureState::Canceled,
        }
    }
}

struct Shared {
    state: Mutex<State>,
    done: Condvar,
    policy: CallbackPolicy,
    /// Live `Promise` handles.
    writers: AtomicUsize,
}

impl Shared {
    fn new(policy: CallbackPolicy) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                outcome: Outcome::Pending,
                callbacks: Vec::new(),
                on_cancel: None,
                cancel_requested: false,
            }),
            done: Condvar::new(),
            policy,
            writers: AtomicUsize::new(0),
        })
    }

    fn complete(self: &Arc<Self>, outcome: Outcome) -> Result<()> {
        let callbacks = {
            let mut state = self.state.lock();
            if !matches!(state.outcome, Outcome::Pending) {
                return Err(Error::new(
                    ErrorKind::AlreadyCompleted,
                    format!("promise already finished ({:?})", state.state()),
                ));
            }
            state.outcome = outcome;
            state.on_cancel = None;
            self.done.notify_all();
            std::mem::take(&mut state.callbacks)
        };
        let future = Future {
            shared: Arc::clone(self),
        };
        for callback in callbacks {
            future.dispatch(callback);
        }
        Ok(())
    }
}

// =======================================================================
// Promise
// =======================================================================

/// Writing end of an asynchronous result.
///
/// Clones share the same state. Dropping the last clone while the state is
/// still running completes it with `BrokenPromise`.
pub struct Promise {
    shared: Arc<Shared>,
}

impl Promise {
    /// Promise using the configured callback policy.
    pub fn new() -> Self {
        Self::with_policy(RuntimeConfig::global().callback_policy())
    }

    pub fn with_policy(policy: CallbackPolicy) -> Self {
        Self::attach(Shared::new(policy))
    }

    fn attach(shared: Arc<Shared>) -> Self {
        shared.writers.fetch_add(1, Ordering::AcqRel);
        Self { shared }
    }

    /// Reading handle on this promise's state.
    pub fn future(&self) -> Future {
        Future {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        self.shared.complete(Outcome::Value(value))
    }

    pub fn set_error(&self, error: Error) -> Result<()> {
        self.shared.complete(Outcome::Error(error))
    }

    pub fn set_canceled(&self) -> Result<()> {
        self.shared.complete(Outcome::Canceled)
    }

    /// Complete from a `Result`.
    pub fn set_result(&self, result: Result<Value>) -> Result<()> {
        match result {
            Ok(value) => self.set_value(value),
            Err(error) => self.set_error(error),
        }
    }

    /// Install the handler run when a reader cancels. The handler decides
    /// how and when the promise completes.
    pub fn set_on_cancel<F>(&self, handler: F)
    where
        F: Fn(&Promise) + Send + Sync + 'static,
    {
        self.shared.state.lock().on_cancel = Some(Arc::new(handler));
    }

    /// Whether a reader asked for cancellation.
    pub fn is_cancel_requested(&self) -> bool {
        self.shared.state.lock().cancel_requested
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Promise {
    fn clone(&self) -> Self {
        Self::attach(Arc::clone(&self.shared))
    }
}

impl Drop for Promise {
    fn drop(&mut self) {
        if self.shared.writers.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let running = matches!(self.shared.state.lock().outcome, Outcome::Pending);
        if running {
            log::warn!("[future] promise dropped before completion");
            let _ = self.shared.complete(Outcome::Error(Error::new(
                ErrorKind::BrokenPromise,
                "promise dropped before completion",
            )));
        }
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.future().state())
            .finish()
    }
}

// =======================================================================
// Future
// =======================================================================

/// Reading end of an asynchronous result. Cheap to clone.
#[derive(Clone)]
pub struct Future {
    shared: Arc<Shared>,
}

impl Future {
    /// Already finished with `value`.
    pub fn ready(value: Value) -> Self {
        let promise = Promise::with_policy(CallbackPolicy::Sync);
        let _ = promise.set_value(value);
        promise.future()
    }

    /// Already finished with `error`.
    pub fn from_error(error: Error) -> Self {
        let promise = Promise::with_policy(CallbackPolicy::Sync);
        let _ = promise.set_error(error);
        promise.future()
    }

    /// Already finished from `result`.
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::ready(value),
            Err(error) => Self::from_error(error),
        }
    }

    pub fn state(&self) -> FutureState {
        self.shared.state.lock().state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == FutureState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    pub fn has_value(&self) -> bool {
        self.state() == FutureState::FinishedWithValue
    }

    pub fn has_error(&self) -> bool {
        self.state() == FutureState::FinishedWithError
    }

    pub fn is_canceled(&self) -> bool {
        self.state() == FutureState::Canceled
    }

    /// Whether a cancel handler is installed.
    pub fn is_cancelable(&self) -> bool {
        self.shared.state.lock().on_cancel.is_some()
    }

    /// Block until finished or until `timeout` elapses (`None` waits
    /// forever). Returns the state reached.
    pub fn wait(&self, timeout: Option<Duration>) -> FutureState {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        while matches!(state.outcome, Outcome::Pending) {
            match deadline {
                Some(deadline) => {
                    if self.shared.done.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.shared.done.wait(&mut state),
            }
        }
        state.state()
    }

    /// Wait, then return the value or the failure.
    pub fn value(&self, timeout: Option<Duration>) -> Result<Value> {
        self.wait(timeout);
        let state = self.shared.state.lock();
        match &state.outcome {
            Outcome::Pending => Err(Error::timeout()),
            Outcome::Value(value) => Ok(value.clone()),
            Outcome::Error(error) => Err(error.clone()),
            Outcome::Canceled => Err(Error::canceled()),
        }
    }

    /// Error of a future finished with an error.
    pub fn error(&self) -> Option<Error> {
        match &self.shared.state.lock().outcome {
            Outcome::Error(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Run `callback` once this future finishes (immediately if it already
    /// has).
    pub fn connect<F>(&self, callback: F)
    where
        F: FnOnce(&Future) + Send + 'static,
    {
        let callback: Callback = Box::new(callback);
        let late = {
            let mut state = self.shared.state.lock();
            if matches!(state.outcome, Outcome::Pending) {
                state.callbacks.push(callback);
                None
            } else {
                Some(callback)
            }
        };
        if let Some(callback) = late {
            self.dispatch(callback);
        }
    }

    fn dispatch(&self, callback: Callback) {
        match self.shared.policy {
            CallbackPolicy::Sync => callback(self),
            CallbackPolicy::Async => {
                let future = self.clone();
                default_context().post(Box::new(move || callback(&future)));
            }
        }
    }

    /// Ask the producer to cancel.
    ///
    /// Finished futures ignore the request. Running futures without a cancel
    /// handler fail with `NotCancelable`.
    pub fn cancel(&self) -> Result<()> {
        let handler = {
            let mut state = self.shared.state.lock();
            if !matches!(state.outcome, Outcome::Pending) {
                return Ok(());
            }
            let Some(handler) = state.on_cancel.clone() else {
                return Err(Error::new(
                    ErrorKind::NotCancelable,
                    "no cancel handler installed",
                ));
            };
            state.cancel_requested = true;
            handler
        };
        log::debug!("[future] cancel requested");
        let promise = Promise::attach(Arc::clone(&self.shared));
        handler(&promise);
        Ok(())
    }

    /// Chain `f` on completion, whatever the outcome. Canceling the
    /// returned future cancels this one.
    pub fn then<F>(&self, f: F) -> Future
    where
        F: FnOnce(&Future) -> Result<Value> + Send + 'static,
    {
        let promise = Promise::with_policy(self.shared.policy);
        let chained = promise.future();
        self.forward_cancel(&promise);
        self.connect(move |done| {
            let _ = promise.set_result(f(done));
        });
        chained
    }

    /// Chain `f` on the value; errors and cancellation pass through.
    pub fn and_then<F>(&self, f: F) -> Future
    where
        F: FnOnce(Value) -> Result<Value> + Send + 'static,
    {
        let promise = Promise::with_policy(self.shared.policy);
        let chained = promise.future();
        self.forward_cancel(&promise);
        self.connect(move |done| {
            let outcome = match &done.shared.state.lock().outcome {
                Outcome::Value(value) => Ok(value.clone()),
                Outcome::Error(error) => Err(Some(error.clone())),
                Outcome::Canceled | Outcome::Pending => Err(None),
            };
            let _ = match outcome {
                Ok(value) => promise.set_result(f(value)),
                Err(Some(error)) => promise.set_error(error),
                Err(None) => promise.set_canceled(),
            };
        });
        chained
    }

    fn forward_cancel(&self, downstream: &Promise) {
        let upstream = self.clone();
        downstream.set_on_cancel(move |_| {
            if let Err(e) = upstream.cancel() {
                log::debug!("[future] upstream not cancelable: {}", e);
            }
        });
    }

    /// Awaitable bridge for async code.
    #[cfg(feature = "async")]
    pub fn into_async(self) -> impl std::future::Future<Output = Result<Value>> + Send {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.connect(move |done| {
            let _ = tx.send(done.value(Some(Duration::ZERO)));
        });
        async move {
            rx.await.unwrap_or_else(|_| {
                Err(Error::new(ErrorKind::BrokenPromise, "future dropped"))
            })
        }
    }

    #[cfg(test)]
    pub(crate) fn same_state(&self, other: &Future) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("state", &self.state())
            .finish()
    }
}

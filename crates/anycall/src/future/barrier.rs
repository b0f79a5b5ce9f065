// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Aggregation of several futures into one.

use super::{CallbackPolicy, Future, Promise};
use crate::error::{Error, ErrorKind, Result};
use crate::types::{TypeDescriptor, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

struct Members {
    futures: Vec<Future>,
    pending: usize,
    closed: bool,
}

struct Inner {
    members: Mutex<Members>,
    promise: Promise,
}

/// Collects futures, then resolves once every one of them is finished.
///
/// Members are added with [`add_future`](Self::add_future) until
/// [`future`](Self::future) closes the barrier. The barrier future holds a
/// list with one dynamic entry per member, in insertion order: the member's
/// value, or void for members that failed or were canceled. Use
/// [`members`](Self::members) to inspect individual outcomes. Canceling the
/// barrier future cancels every member still running.
#[derive(Clone)]
pub struct FutureBarrier {
    inner: Arc<Inner>,
}

impl FutureBarrier {
    pub fn new() -> Self {
        let promise = Promise::with_policy(CallbackPolicy::Sync);
        let inner = Arc::new(Inner {
            members: Mutex::new(Members {
                futures: Vec::new(),
                pending: 0,
                closed: false,
            }),
            promise,
        });
        let weak = Arc::downgrade(&inner);
        inner.promise.set_on_cancel(move |_| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let running: Vec<Future> = inner
                .members
                .lock()
                .futures
                .iter()
                .filter(|f| f.is_running())
                .cloned()
                .collect();
            for member in running {
                if let Err(e) = member.cancel() {
                    log::debug!("[future] barrier member not cancelable: {}", e);
                }
            }
        });
        Self { inner }
    }

    /// Add a member. Fails with `BarrierClosed` once `future()` was called.
    pub fn add_future(&self, future: Future) -> Result<()> {
        {
            let mut members = self.inner.members.lock();
            if members.closed {
                return Err(Error::new(
                    ErrorKind::BarrierClosed,
                    "cannot add a future after the barrier future was taken",
                ));
            }
            members.futures.push(future.clone());
            members.pending += 1;
        }
        let inner = Arc::clone(&self.inner);
        future.connect(move |_| inner.member_done());
        Ok(())
    }

    /// Close the barrier and return its aggregate future.
    pub fn future(&self) -> Future {
        let ready = {
            let mut members = self.inner.members.lock();
            let first = !members.closed;
            members.closed = true;
            first && members.pending == 0
        };
        if ready {
            self.inner.resolve();
        }
        self.inner.promise.future()
    }

    /// Members in insertion order.
    pub fn members(&self) -> Vec<Future> {
        self.inner.members.lock().futures.clone()
    }
}

impl Default for FutureBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn member_done(&self) {
        let ready = {
            let mut members = self.members.lock();
            members.pending = members.pending.saturating_sub(1);
            members.closed && members.pending == 0
        };
        if ready {
            self.resolve();
        }
    }

    fn resolve(&self) {
        let futures = self.members.lock().futures.clone();
        let items: Vec<Value> = futures
            .iter()
            .map(|f| Value::dynamic(f.value(Some(Duration::ZERO)).unwrap_or_default()))
            .collect();
        let outcome = Value::list(&TypeDescriptor::dynamic(), items);
        if let Err(e) = self.promise.set_result(outcome) {
            log::debug!("[future] barrier already resolved: {}", e);
        }
    }
}

/// Wait until every future in `futures` is finished, or `timeout` elapses.
/// Returns the futures in the given order.
pub fn wait_for_all(futures: Vec<Future>, timeout: Option<Duration>) -> Result<Vec<Future>> {
    let barrier = FutureBarrier::new();
    for future in &futures {
        barrier.add_future(future.clone())?;
    }
    let all = barrier.future();
    if !all.wait(timeout).is_finished() {
        return Err(Error::timeout());
    }
    Ok(futures)
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Execution contexts: where queued calls and async callbacks run.

mod event_loop;
mod strand;

pub use event_loop::{EventLoop, EventLoopStats};
pub use strand::Strand;

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::future::{Future, Promise};
use crate::types::Value;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Unit of work posted to a context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs tasks somewhere.
pub trait ExecutionContext: Send + Sync {
    /// Queue `task`; never blocks.
    fn post(&self, task: Task);

    /// Whether the calling thread is currently running a task of this
    /// context.
    fn is_in_this_context(&self) -> bool;

    fn name(&self) -> &str;
}

/// Run `f` on `context` and expose its outcome as a future.
pub fn run_async<F>(context: &dyn ExecutionContext, f: F) -> Future
where
    F: FnOnce() -> Result<Value> + Send + 'static,
{
    let promise = Promise::new();
    let future = promise.future();
    context.post(Box::new(move || {
        let outcome = f();
        let done = match outcome {
            Ok(value) => promise.set_value(value),
            Err(error) => promise.set_error(error),
        };
        if let Err(e) = done {
            log::debug!("[eventloop] async result dropped: {}", e);
        }
    }));
    future
}

/// Process-wide event loop, started on first use with the configured
/// worker count.
pub fn default_context() -> Arc<EventLoop> {
    static DEFAULT: OnceLock<Arc<EventLoop>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| {
        Arc::new(EventLoop::new(
            "anycall-default",
            RuntimeConfig::global().worker_threads(),
        ))
    }))
}

// =======================================================================
// Thread-local context tracking
// =======================================================================

thread_local! {
    static ACTIVE: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn next_context_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct ContextGuard(u64);

/// Mark the current thread as running inside context `id` until the
/// guard drops. Contexts nest (a strand on top of a loop).
pub(crate) fn enter_context(id: u64) -> ContextGuard {
    ACTIVE.with(|active| active.borrow_mut().push(id));
    ContextGuard(id)
}

pub(crate) fn in_context(id: u64) -> bool {
    ACTIVE.with(|active| active.borrow().contains(&id))
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|id| *id == self.0) {
                active.remove(pos);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const WAIT: Option<Duration> = Some(Duration::from_secs(5));

    #[test]
    fn test_event_loop_runs_tasks() {
        let ev = EventLoop::new("test-loop", 2);
        let hits = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = crossbeam::channel::unbounded();
        for _ in 0..10 {
            let hits = Arc::clone(&hits);
            let tx = tx.clone();
            ev.post(Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            }));
        }
        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).expect("task ran");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(ev.stats().posted, 10);
    }

    #[test]
    fn test_is_in_this_context() {
        let ev = Arc::new(EventLoop::new("test-affinity", 1));
        assert!(!ev.is_in_this_context());
        let inner = Arc::clone(&ev);
        let seen = run_async(ev.as_ref(), move || Ok(Value::from(inner.is_in_this_context())));
        assert_eq!(seen.value(WAIT).expect("ran").as_bool(), Some(true));
    }

    #[test]
    fn test_panicking_task_keeps_worker_alive() {
        let ev = EventLoop::new("test-panic", 1);
        ev.post(Box::new(|| panic!("task failure")));
        let after = run_async(&ev, || Ok(Value::from(1i32)));
        assert_eq!(after.value(WAIT).expect("worker alive"), Value::from(1i32));
        assert_eq!(ev.stats().panicked, 1);
    }

    #[test]
    fn test_strand_serializes() {
        let ev: Arc<dyn ExecutionContext> = Arc::new(EventLoop::new("test-strand", 4));
        let strand = Strand::new("serial", ev);
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut last = None;
        for i in 0..50 {
            let order = Arc::clone(&order);
            last = Some(run_async(&strand, move || {
                order.lock().push(i);
                Ok(Value::void())
            }));
        }
        last.expect("posted").wait(WAIT);
        let order = order.lock();
        assert_eq!(*order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_strand_context_nests_in_loop() {
        let ev = Arc::new(EventLoop::new("test-nest", 1));
        let strand = Strand::new("nested", Arc::clone(&ev) as Arc<dyn ExecutionContext>);
        let in_strand = strand.clone();
        let in_loop = Arc::clone(&ev);
        let seen = run_async(&strand, move || {
            Ok(Value::from(
                in_strand.is_in_this_context() && in_loop.is_in_this_context(),
            ))
        });
        assert_eq!(seen.value(WAIT).expect("ran").as_bool(), Some(true));
    }

    #[test]
    fn test_stopped_loop_runs_inline() {
        let ev = EventLoop::new("test-stop", 1);
        ev.stop();
        let done = run_async(&ev, || Ok(Value::from("inline")));
        assert!(done.is_finished());
    }
}

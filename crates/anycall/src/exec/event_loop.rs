// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Worker pool draining a shared task channel.

use super::{enter_context, in_context, ExecutionContext, Task};
use crate::function::panic_message;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Task counters of an event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventLoopStats {
    pub posted: u64,
    pub executed: u64,
    pub panicked: u64,
}

#[derive(Default)]
struct Counters {
    posted: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
}

/// Named pool of worker threads.
///
/// Tasks posted from any thread run on one of the workers, in no particular
/// order across workers. Dropping the loop lets queued tasks finish, then
/// joins the workers.
pub struct EventLoop {
    id: u64,
    name: String,
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl EventLoop {
    /// Start `workers` threads (at least one).
    pub fn new(name: &str, workers: usize) -> Self {
        let id = super::next_context_id();
        let (sender, receiver) = unbounded::<Task>();
        let counters = Arc::new(Counters::default());
        let mut handles = Vec::new();
        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            let counters = Arc::clone(&counters);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(id, &receiver, &counters));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => log::error!("[eventloop] {}: cannot spawn worker {}: {}", name, index, e),
            }
        }
        log::debug!("[eventloop] {} started with {} workers", name, handles.len());
        Self {
            id,
            name: name.to_string(),
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            counters,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Snapshot of the task counters.
    pub fn stats(&self) -> EventLoopStats {
        EventLoopStats {
            posted: self.counters.posted.load(Ordering::Relaxed),
            executed: self.counters.executed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting tasks and join the workers once the queue drains.
    /// Tasks posted afterwards run inline.
    pub fn stop(&self) {
        self.sender.lock().take();
        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        let me = thread::current().id();
        for handle in handles {
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                log::warn!("[eventloop] {}: worker exited abnormally", self.name);
            }
        }
    }
}

fn worker_loop(id: u64, receiver: &Receiver<Task>, counters: &Counters) {
    let _guard = enter_context(id);
    while let Ok(task) = receiver.recv() {
        run_task(task, counters);
    }
}

fn run_task(task: Task, counters: &Counters) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        counters.panicked.fetch_add(1, Ordering::Relaxed);
        log::error!("[eventloop] task panicked: {}", panic_message(payload.as_ref()));
    }
    counters.executed.fetch_add(1, Ordering::Relaxed);
}

impl ExecutionContext for EventLoop {
    fn post(&self, task: Task) {
        self.counters.posted.fetch_add(1, Ordering::Relaxed);
        let rejected = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).err().map(|e| e.into_inner()),
            None => Some(task),
        };
        if let Some(task) = rejected {
            log::debug!("[eventloop] {} stopped, running task inline", self.name);
            run_task(task, &self.counters);
        }
    }

    fn is_in_this_context(&self) -> bool {
        in_context(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

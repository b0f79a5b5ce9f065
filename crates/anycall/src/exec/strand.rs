// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serial execution on top of another context.

use super::{enter_context, in_context, ExecutionContext, Task};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct Queue {
    tasks: VecDeque<Task>,
    draining: bool,
}

struct StrandInner {
    id: u64,
    name: String,
    target: Arc<dyn ExecutionContext>,
    queue: Mutex<Queue>,
}

/// Runs posted tasks one at a time, in posting order, on the target
/// context. At most one drain job is queued on the target at any moment.
#[derive(Clone)]
pub struct Strand {
    inner: Arc<StrandInner>,
}

impl Strand {
    pub fn new(name: &str, target: Arc<dyn ExecutionContext>) -> Self {
        Self {
            inner: Arc::new(StrandInner {
                id: super::next_context_id(),
                name: name.to_string(),
                target,
                queue: Mutex::new(Queue {
                    tasks: VecDeque::new(),
                    draining: false,
                }),
            }),
        }
    }

    /// Tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().tasks.len()
    }
}

impl StrandInner {
    fn drain(self: Arc<Self>) {
        let _guard = enter_context(self.id);
        loop {
            let task = {
                let mut queue = self.queue.lock();
                match queue.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };
            if let Err(payload) =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(task))
            {
                log::error!(
                    "[eventloop] strand {} task panicked: {}",
                    self.name,
                    crate::function::panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl ExecutionContext for Strand {
    fn post(&self, task: Task) {
        let start = {
            let mut queue = self.inner.queue.lock();
            queue.tasks.push_back(task);
            !std::mem::replace(&mut queue.draining, true)
        };
        if start {
            let inner = Arc::clone(&self.inner);
            self.inner.target.post(Box::new(move || inner.drain()));
        }
    }

    fn is_in_this_context(&self) -> bool {
        in_context(self.inner.id)
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}

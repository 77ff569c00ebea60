//! Virtual-time timer queue for repeating tasks.
//!
//! Time only moves when the owner asks for due tasks, which keeps runs
//! deterministic and lets tests fast-forward through minutes of animation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Identity of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

#[derive(Debug)]
struct Timer<T> {
    task: T,
    interval_ms: u64,
}

/// Repeating task queue driven by virtual milliseconds.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_handle: u64,
    next_seq: u64,
    /// `(due, seq, handle)`; cancelled entries are dropped lazily.
    queue: BinaryHeap<Reverse<(u64, u64, TaskHandle)>>,
    timers: HashMap<TaskHandle, Timer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_handle: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            timers: HashMap::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Run `task` every `interval_ms`, first one interval from now. An
    /// interval of 0 is treated as 1ms.
    pub fn schedule_repeating(&mut self, task: T, interval_ms: u64) -> TaskHandle {
        let interval_ms = interval_ms.max(1);
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        self.timers.insert(handle, Timer { task, interval_ms });
        self.push(self.now + interval_ms, handle);
        handle
    }

    /// Stop a task. Returns true only for the call that actually cancelled it.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    /// Earliest live task due at or before `until_ms`, re-armed one interval
    /// later. Equal due times run in scheduling order. When nothing is due
    /// the clock moves to `until_ms` and `None` is returned.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TaskHandle, T)> {
        while let Some(&Reverse((due, _, handle))) = self.queue.peek() {
            if due > until_ms {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get(&handle) else {
                continue;
            };
            let (task, interval_ms) = (timer.task.clone(), timer.interval_ms);

            self.now = self.now.max(due);
            self.push(due + interval_ms, handle);
            return Some((handle, task));
        }

        self.now = self.now.max(until_ms);
        None
    }

    fn push(&mut self, due: u64, handle: TaskHandle) {
        self.queue.push(Reverse((due, self.next_seq, handle)));
        self.next_seq += 1;
    }
}

//! # Task System Core Types
//!
//! This module defines the unit of work the [`TaskManager`](super::TaskManager)
//! runs on its worker threads, and the report a worker sends back when the
//! work is done.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The worker sends a [`TaskReport`] back to the main thread
//! 4. `TaskManager::process_completed_tasks()` collects the reports
//!
//! Tasks deliver their actual output themselves (a mesh job, for example,
//! sends its mesh down the owning chunk's result channel), so the report only
//! carries bookkeeping.

use std::time::Duration;

/// A unit of work that can be executed on a background worker.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should own everything it reads; shared data goes behind an `Arc`
/// - Should be relatively coarse-grained to amortize scheduling overhead
pub trait Task: Send {
    /// Short human-readable description, used in logs and reports.
    fn label(&self) -> String;

    /// Runs the task to completion on the calling worker thread.
    fn process(self: Box<Self>);
}

/// Bookkeeping for one finished task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    /// The task's [`Task::label`]
    pub label: String,
    /// Wall-clock time spent in [`Task::process`]
    pub elapsed: Duration,
    /// Whether `process` panicked instead of returning
    pub panicked: bool,
}

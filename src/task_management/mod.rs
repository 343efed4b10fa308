//! # Task Management System
//!
//! This module provides a small worker pool for executing work off the main
//! thread. The main loop publishes tasks and polls for completion; it never
//! blocks on a worker.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - [`Task`]: A unit of work that can be executed asynchronously
//! - [`TaskReport`]: What a worker sends back once a task has finished
//! - `TaskChannel`: Communication channel between the main thread and one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager hands tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back a report
//! 4. Reports are collected on the main thread in `process_completed_tasks()`
//! 5. Tasks that found every worker busy wait in a FIFO queue until
//!    `process_queued_tasks()` finds room for them
//!
//! ## Example Usage
//! ```
//! use voxel_mesher::task_management::{task::Task, TaskManager};
//!
//! struct Noop;
//!
//! impl Task for Noop {
//!     fn label(&self) -> String {
//!         "noop".to_string()
//!     }
//!
//!     fn process(self: Box<Self>) {}
//! }
//!
//! let mut task_manager = TaskManager::new(2).unwrap();
//! task_manager.publish_task(Box::new(Noop));
//!
//! // In your main loop:
//! while !task_manager.is_idle() {
//!     task_manager.process_completed_tasks();
//!     task_manager.process_queued_tasks();
//! }
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    io,
    panic::{self, AssertUnwindSafe},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::info;
use web_time::Instant;

use task::{Task, TaskReport};

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task reports from worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined when the manager drops
struct TaskChannel {
    task_sender: Sender<Box<dyn Task>>,
    result_receiver: Receiver<TaskReport>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and managing worker threads
/// - Distributing tasks across available workers
/// - Collecting task reports
/// - Queuing tasks when all workers are busy
///
/// Dropping the manager closes every task channel and joins the workers;
/// tasks still queued at that point are discarded.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 so a long task never has other work stuck behind it on the
/// same worker while a different worker sits idle.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

fn run_worker(task_rx: Receiver<Box<dyn Task>>, result_tx: Sender<TaskReport>) {
    while let Ok(task) = task_rx.recv() {
        let label = task.label();
        let start_time = Instant::now();
        let panicked = panic::catch_unwind(AssertUnwindSafe(|| task.process())).is_err();
        if panicked {
            log::error!("Task '{}' panicked", label);
        }
        let report = TaskReport {
            label,
            elapsed: start_time.elapsed(),
            panicked,
        };
        if result_tx.send(report).is_err() {
            break;
        }
    }
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        info!(
            "Available parallelism: {:?}, spawning {} mesh workers",
            thread::available_parallelism(),
            num_workers
        );

        let mut channels = Vec::with_capacity(num_workers);

        for worker_index in 0..num_workers {
            let (task_tx, task_rx) = unbounded::<Box<dyn Task>>();
            let (result_tx, result_rx) = unbounded::<TaskReport>();

            let worker = thread::Builder::new()
                .name(format!("mesh-worker-{worker_index}"))
                .spawn(move || run_worker(task_rx, result_tx))?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task back if the worker has gone away, so it can be requeued.
    fn try_send_task(&mut self, task: Box<dyn Task>, channel_idx: usize) -> Result<(), Box<dyn Task>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(err) => Err(err.into_inner()),
        }
    }

    /// Finds an available worker channel, round-robin from the last one used.
    ///
    /// Channels that have reached [`MAX_TASKS_IN_FLIGHT`] are skipped.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// Returns `true` if the task went straight to a worker and `false` if it
    /// was queued because all workers are busy. Never blocks.
    pub fn publish_task(&mut self, task: Box<dyn Task>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    log::warn!("Worker {} disconnected, queueing task", channel_idx);
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers, oldest first, until the queue is empty
    /// or every worker is busy.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Collects the reports of every task that finished since the last call.
    ///
    /// Non-blocking. Reports come back grouped by worker.
    pub fn process_completed_tasks(&mut self) -> Vec<TaskReport> {
        let mut reports = Vec::new();
        for channel in &mut self.channels {
            while let Ok(report) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                log::trace!("Task '{}' finished in {:?}", report.label, report.elapsed);
                reports.push(report);
            }
        }
        reports
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued_task_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Number of tasks handed to workers whose reports have not been collected.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Whether no task is queued or running.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for TaskChannel {
            task_sender,
            worker,
            ..
        } in self.channels.drain(..)
        {
            drop(task_sender);
            if worker.join().is_err() {
                log::error!("Mesh worker exited with a panic");
            }
        }
    }
}

#[cfg(test)]
mod tests;

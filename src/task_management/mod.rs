//! # Task Management System
//!
//! This module provides the worker pools the world offloads chunk generation and mesh
//! compilation to.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, applied on the orchestrating thread
//! - `TaskChannel`: Communication channel between the orchestrator and one worker thread
//!
//! Each worker is a named OS thread with a dedicated task channel and result
//! channel. Tasks are distributed round-robin to workers that have fewer than
//! `MAX_TASKS_IN_FLIGHT` tasks; the rest wait in a FIFO queue until
//! `process_queued_tasks()` finds room for them.
//!
//! A manager created with zero workers, or one whose threads all failed to spawn,
//! runs tasks inline inside `process_queued_tasks()`.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and return results; a panicking task is caught and
//!    replaced with its `recover()` result
//! 4. Results are collected on the orchestrating thread by `drain_completed()`
//!
//! ## Example Usage
//! ```rust,ignore
//! let mut task_manager = TaskManager::new("mesh", 4);
//!
//! // Publish a task for background processing
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // Once per tick:
//! for result in task_manager.drain_completed() {
//!     result.handle_result(&mut world);
//! }
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{channel, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{error, info};
use task::{Task, TaskResult};

/// A communication channel between the orchestrating thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the orchestrator to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread
///
/// Dropping the channel closes the task sender, which ends the worker's receive loop.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
pub struct TaskManager {
    name: String,
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    completed_inline: VecDeque<Box<dyn TaskResult + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 lets an idle worker pick up the next queued task while a busy
/// worker's backlog stays in the shared queue.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// Runs a task, turning a panic into the task's recovery result.
fn run_guarded(task: &(dyn Task + Send)) -> Box<dyn TaskResult + Send> {
    match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!("Task {} panicked: {}", task.describe(), message);
            task.recover()
        }
    }
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `name` - Pool name, used for thread names and log messages
    /// * `num_workers` - Number of worker threads to create; zero runs tasks inline
    ///
    /// A worker that fails to spawn is logged and skipped.
    pub fn new(name: &str, num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = run_guarded(task.as_ref());
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            match thread::Builder::new()
                .name(format!("{name}-worker-{index}"))
                .spawn(task_closure)
            {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    result_receiver: result_rx,
                    num_tasks_in_flight: 0,
                    _worker: worker,
                }),
                Err(err) => error!("Failed to spawn {name} worker {index}: {err}"),
            }
        }

        info!("Started {} pool with {} workers", name, channels.len());

        TaskManager {
            name: name.to_string(),
            channels,
            queued_tasks: VecDeque::new(),
            completed_inline: VecDeque::new(),
            current_channel: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the channel's in-flight counter is incremented
    /// - `Err(task)` if the worker has disconnected, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds the next channel, round-robin from the last used one, that has room for
    /// another task.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
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
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
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

    /// Hands queued tasks to workers until the queue is empty or every worker is busy.
    ///
    /// Without workers, every queued task is run to completion here.
    pub fn process_queued_tasks(&mut self) {
        if self.channels.is_empty() {
            while let Some(task) = self.queued_tasks.pop_front() {
                let result = run_guarded(task.as_ref());
                self.completed_inline.push_back(result);
            }
            return;
        }

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

    /// Collects every result that has arrived since the last call, in arrival order
    /// per worker.
    pub fn drain_completed(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        let mut results: Vec<Box<dyn TaskResult + Send>> = self.completed_inline.drain(..).collect();
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                results.push(result);
            }
        }
        results
    }

    /// Tasks that are queued, running, or finished but not yet drained.
    pub fn tasks_in_flight(&self) -> usize {
        self.queued_tasks.len()
            + self.completed_inline.len()
            + self
                .channels
                .iter()
                .map(|channel| channel.num_tasks_in_flight)
                .sum::<usize>()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks_in_flight() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };

    use super::*;
    use crate::voxels::world::World;

    struct NoopResult;

    impl TaskResult for NoopResult {
        fn handle_result(self: Box<Self>, _world: &mut World) {}
    }

    struct CountingTask {
        processed: Arc<AtomicUsize>,
        recovered: Arc<AtomicUsize>,
        panics: bool,
    }

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            if self.panics {
                panic!("synthetic failure");
            }
            self.processed.fetch_add(1, Ordering::SeqCst);
            Box::new(NoopResult)
        }

        fn recover(&self) -> Box<dyn TaskResult + Send> {
            self.recovered.fetch_add(1, Ordering::SeqCst);
            Box::new(NoopResult)
        }

        fn describe(&self) -> String {
            "counting task".to_string()
        }
    }

    fn task(processed: &Arc<AtomicUsize>, recovered: &Arc<AtomicUsize>, panics: bool) -> Box<dyn Task + Send> {
        Box::new(CountingTask {
            processed: processed.clone(),
            recovered: recovered.clone(),
            panics,
        })
    }

    fn drain_until_idle(manager: &mut TaskManager) -> usize {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut drained = 0;
        while !manager.is_idle() && Instant::now() < deadline {
            drained += manager.drain_completed().len();
            manager.process_queued_tasks();
            thread::sleep(Duration::from_millis(1));
        }
        drained
    }

    #[test]
    fn all_published_tasks_complete() {
        let processed = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new("test", 2);
        for _ in 0..10 {
            manager.publish_task(task(&processed, &recovered, false));
        }
        assert_eq!(manager.tasks_in_flight(), 10);
        assert_eq!(drain_until_idle(&mut manager), 10);
        assert_eq!(processed.load(Ordering::SeqCst), 10);
        assert_eq!(recovered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_task_is_recovered() {
        let processed = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new("test", 1);
        manager.publish_task(task(&processed, &recovered, true));
        manager.publish_task(task(&processed, &recovered, false));
        assert_eq!(drain_until_idle(&mut manager), 2);
        assert_eq!(recovered.load(Ordering::SeqCst), 1);
        assert_eq!(processed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_workers_run_inline() {
        let processed = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new("inline", 0);
        assert_eq!(manager.worker_count(), 0);
        assert!(!manager.publish_task(task(&processed, &recovered, false)));
        assert_eq!(processed.load(Ordering::SeqCst), 0);

        manager.process_queued_tasks();
        assert_eq!(processed.load(Ordering::SeqCst), 1);
        assert_eq!(manager.tasks_in_flight(), 1);
        assert_eq!(manager.drain_completed().len(), 1);
        assert!(manager.is_idle());
    }
}

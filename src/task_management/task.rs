//! # Task System Core Traits
//!
//! This module defines the two halves of a unit of background work.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The orchestrator drains finished results and calls `handle_result()` on its own
//!    thread with exclusive access to the world
//!
//! If `process()` panics, the worker catches it and sends the task's `recover()`
//! result instead, so the state the task claimed is always released.
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the orchestrating thread
//! - All shared state must be properly synchronized

use crate::voxels::world::World;

/// A unit of work that runs on a worker thread.
///
/// Tasks own (or share through locks) everything they read, so no borrow of
/// orchestrator state crosses the thread boundary.
pub trait Task: Send {
    /// Performs the work and returns the result to hand back to the orchestrator.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// The result reported in place of `process()` when it panicked.
    ///
    /// It must undo whatever claim the task holds so the work can be retried.
    fn recover(&self) -> Box<dyn TaskResult + Send>;

    /// Short description used in log messages.
    fn describe(&self) -> String;
}

/// The outcome of a `Task`, applied on the orchestrating thread.
pub trait TaskResult: Send {
    /// Applies the result to the world.
    ///
    /// # Arguments
    /// * `world` - The world that published the task
    fn handle_result(self: Box<Self>, world: &mut World);
}

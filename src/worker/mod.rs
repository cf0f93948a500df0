//! Worker system — background loops that drive tasks to completion.
//!
//! Each loop sleeps for the poll interval, claims one task through
//! `TaskRepository::take`, executes its handler and saves the outcome.

pub mod pool;

pub use pool::{Worker, WorkerConfig, WorkerPool};

//! Tasks — the lifecycle state machine, its repository and the client facade.
//!
//! - `model` — `Task` state machine (Created → InWork → Completed/Failed)
//! - `store` — `TaskRepository` contract and the in-memory backend
//! - `service` — create/get/retry/delete on behalf of clients

pub mod model;
pub mod service;
pub mod store;

pub use model::{Task, TaskStatus, TaskView};
pub use service::TaskService;
pub use store::{InMemoryTaskRepository, TaskRepository, TaskUpdate};

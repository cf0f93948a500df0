//! HTTP surface — axum routes over the task service.

pub mod routes;

pub use routes::task_routes;

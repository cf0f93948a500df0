//! Task Pool — asynchronous task processing with a pool of polling workers.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod tasks;
pub mod worker;

// File: ./src/client/mod.rs
pub mod core;
pub mod error;
pub mod middleware;

pub use crate::client::core::ApiClient;
pub use crate::client::error::ApiError;

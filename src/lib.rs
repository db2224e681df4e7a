// Crate root library declaration and module exports.
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod credentials;
pub mod logging;
pub mod model;
pub mod notify;
pub mod storage;

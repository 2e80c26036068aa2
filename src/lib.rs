pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

#[cfg(feature = "demo-server")]
pub mod server;

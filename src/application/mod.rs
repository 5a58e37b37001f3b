//! Application layer - use cases and services

pub mod commands;
pub mod services;

pub use commands::{Cli, Commands};
pub use services::PaymentService;

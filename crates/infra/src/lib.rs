//! Infrastructure layer: stores, SMS delivery, configuration and the
//! application services built on top of them.
//!
//! `services::Services` wires everything together:
//!
//! - `Services::in_memory(&config)` for development and tests
//! - `Services::postgres(pool, &config)` for production, after
//!   `store::apply_schema(&pool)`

/// Configuration loading and representation.
pub mod config;

/// External service clients/adapters.
pub mod external;

pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use services::{Services, Stores};

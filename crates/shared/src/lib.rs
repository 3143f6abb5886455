//! Shared types, errors, and configuration for Aquabill.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - The Notifier port for non-blocking observability

pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use notify::{Notifier, TracingNotifier};

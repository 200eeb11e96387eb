//! # Core Module
//!
//! Configuration and error types shared by the command layer.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Typed command errors
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;

pub use config::Config;
pub use error::CommandError;

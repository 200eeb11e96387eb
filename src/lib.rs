// Core layer - configuration and errors
pub mod core;

// Command layer - registry, routing, arguments and the execution pipeline
pub mod commands;

// Transport seam - remote command service and interaction responses
pub mod transport;

pub mod client;

pub use client::Client;
pub use crate::core::{CommandError, Config};
pub use transport::{CommandTransport, SerenityTransport};

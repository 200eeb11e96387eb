//! # Command System
//!
//! Declaring commands, keeping the registry in sync with the remote service,
//! and dispatching interactions to callbacks.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Weak registry with remote diff, group routing and hook pipeline
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod arguments;
pub mod context;
pub mod handler;
pub mod hooks;
pub mod interaction;
pub mod model;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod response;
pub mod router;

pub use arguments::{ArgValue, Arguments, Mentionable};
pub use context::{InteractionContext, PendingResponse};
pub use handler::{
    register_command, AutocompleteCallback, CommandBuilder, CommandCallback, Group,
    RegisteredCommand, SubGroup,
};
pub use hooks::{
    AutocompleteErrorHandler, Catch, CatchCommandError, CommandErrorHandler, ErrorReporter, Hook,
    HookResult, LogReporter,
};
pub use interaction::{Interaction, InteractionOption};
pub use model::{CommandDescriptor, CommandOption, CommandType, OptionChoice, OptionType, Unique};
pub use pipeline::Outcome;
pub use plugin::Plugin;
pub use registry::{CommandRegistry, SyncReport};
pub use response::{AutocompleteChoice, InteractionResponse, ResponseMessage};
pub use router::CommandPath;

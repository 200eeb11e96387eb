//! # Transport Seam
//!
//! Narrow interface to the remote command service and interaction responses.
//! The dispatch layer never talks to the gateway or REST client directly.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Followup and edit calls for context responses
//! - 1.0.0: Command fetch/create/delete and initial responses

pub mod discord;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ApplicationId, GuildId, InteractionId};

use crate::commands::model::CommandDescriptor;
use crate::commands::response::{InteractionResponse, ResponseMessage};

pub use discord::SerenityTransport;

/// Remote side of command registration and interaction responses
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Commands currently registered remotely; `None` is the global scope
    async fn fetch_commands(
        &self,
        application_id: ApplicationId,
        guild: Option<GuildId>,
    ) -> Result<Vec<CommandDescriptor>>;

    /// Create one command in the scope named by its `guild_id`
    async fn create_command(&self, application_id: ApplicationId, command: &CommandDescriptor) -> Result<()>;

    /// Delete one remote command; the descriptor must carry its remote id
    async fn delete_command(&self, application_id: ApplicationId, command: &CommandDescriptor) -> Result<()>;

    async fn create_response(
        &self,
        interaction_id: InteractionId,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<()>;

    async fn edit_response(&self, token: &str, message: &ResponseMessage) -> Result<()>;

    async fn create_followup(&self, token: &str, message: &ResponseMessage) -> Result<()>;
}

//! Per-interaction context handed to callbacks, hooks and error handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Pending response slot; respond/defer/edit/followup state machine
//! - 1.0.0: Initial implementation with resolved path and arguments

use std::sync::Arc;

use anyhow::Result;
use log::debug;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::oneshot;
use uuid::Uuid;

use super::arguments::{ArgValue, Arguments};
use super::interaction::{Interaction, PartialUser};
use super::model::CommandType;
use super::response::{InteractionResponse, ResponseMessage};
use super::router::CommandPath;
use crate::transport::CommandTransport;

/// Slot the transport waits on when it holds the interaction open for a result
pub type PendingResponse = oneshot::Sender<InteractionResponse>;

pub struct InteractionContext {
    /// Prefix for every log line about this interaction
    pub request_id: Uuid,
    pub interaction: Interaction,
    pub command: String,
    pub group: Option<String>,
    pub sub_group: Option<String>,
    pub command_type: CommandType,
    pub options: Arguments,
    pub locale: String,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub user: Option<PartialUser>,
    has_created_response: bool,
    has_deferred_response: bool,
    pending: Option<PendingResponse>,
    transport: Arc<dyn CommandTransport>,
}

impl InteractionContext {
    pub fn new(
        interaction: Interaction,
        path: CommandPath,
        options: Arguments,
        transport: Arc<dyn CommandTransport>,
        pending: Option<PendingResponse>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            command: path.command,
            group: path.group,
            sub_group: path.sub_group,
            command_type: interaction.data.kind,
            locale: interaction.locale.clone(),
            guild_id: interaction.guild_id,
            channel_id: interaction.channel_id,
            user: interaction.actor().cloned(),
            interaction,
            options,
            has_created_response: false,
            has_deferred_response: false,
            pending,
            transport,
        }
    }

    pub fn option(&self, name: &str) -> Option<&ArgValue> {
        self.options.get(name)
    }

    pub fn has_created_response(&self) -> bool {
        self.has_created_response
    }

    pub fn has_deferred_response(&self) -> bool {
        self.has_deferred_response
    }

    /// Take the pending response slot, if the transport supplied one and it is unused
    pub fn take_pending(&mut self) -> Option<PendingResponse> {
        self.pending.take()
    }

    /// Deliver the initial response: complete the pending slot when present,
    /// otherwise issue it through the transport.
    pub async fn send_initial(&mut self, response: InteractionResponse) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            debug!("[{}] Completing pending response slot", self.request_id);
            pending
                .send(response)
                .map_err(|_| anyhow::anyhow!("pending response receiver was dropped"))?;
            return Ok(());
        }
        self.transport
            .create_response(self.interaction.id, &self.interaction.token, &response)
            .await
    }

    /// Acknowledge now and respond later
    pub async fn defer(&mut self, ephemeral: bool) -> Result<()> {
        if self.has_created_response || self.has_deferred_response {
            return Err(anyhow::anyhow!(
                "interaction for '{}' was already acknowledged",
                self.command
            ));
        }
        self.send_initial(InteractionResponse::Deferred { ephemeral }).await?;
        self.has_deferred_response = true;
        Ok(())
    }

    /// Respond with a message.
    ///
    /// First call creates the response (or fills a deferred one); later calls
    /// become followups.
    pub async fn respond(&mut self, message: ResponseMessage) -> Result<()> {
        if self.has_created_response {
            return self.followup(message).await;
        }
        if self.has_deferred_response {
            self.transport
                .edit_response(&self.interaction.token, &message)
                .await?;
        } else {
            self.send_initial(InteractionResponse::Message(message)).await?;
        }
        self.has_created_response = true;
        Ok(())
    }

    pub async fn followup(&mut self, message: ResponseMessage) -> Result<()> {
        self.transport
            .create_followup(&self.interaction.token, &message)
            .await
    }

    /// Replace the original response
    pub async fn edit(&mut self, message: ResponseMessage) -> Result<()> {
        self.transport
            .edit_response(&self.interaction.token, &message)
            .await
    }
}

impl std::fmt::Debug for InteractionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionContext")
            .field("request_id", &self.request_id)
            .field("command", &self.command)
            .field("group", &self.group)
            .field("sub_group", &self.sub_group)
            .field("guild_id", &self.guild_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

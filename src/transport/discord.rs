//! Serenity-backed transport
//!
//! Implements [`CommandTransport`] on serenity's REST client and converts
//! gateway interactions into the crate's payload model. Both directions go
//! through serde_json because the crate model mirrors Discord's JSON layout.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Remote command conversion split out of `fetch_commands`
//! - 1.1.0: Followup and edit support
//! - 1.0.0: Initial implementation

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::application::command::Command as RemoteCommand;
use serenity::model::application::interaction::Interaction as GatewayInteraction;
use serenity::model::id::{ApplicationId, GuildId, InteractionId};

use super::CommandTransport;
use crate::commands::interaction::Interaction;
use crate::commands::model::CommandDescriptor;
use crate::commands::response::{InteractionResponse, ResponseMessage};
use crate::core::CommandError;

#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// Convert a gateway interaction into the crate payload.
///
/// Returns `None` for interaction kinds the command layer does not route.
pub fn convert_interaction(interaction: &GatewayInteraction) -> Result<Option<Interaction>> {
    let raw = match interaction {
        GatewayInteraction::ApplicationCommand(command) => serde_json::to_value(command)?,
        GatewayInteraction::Autocomplete(autocomplete) => serde_json::to_value(autocomplete)?,
        _ => return Ok(None),
    };
    Ok(Some(serde_json::from_value(raw)?))
}

/// Convert a remote command fetched for `guild` (`None` for global) into a descriptor
pub fn convert_command(command: &RemoteCommand, guild: Option<GuildId>) -> Result<CommandDescriptor> {
    let mut descriptor: CommandDescriptor = serde_json::from_value(serde_json::to_value(command)?)?;
    // Guild commands are fetched per guild; make the scope explicit
    descriptor.guild_id = descriptor.guild_id.or(guild);
    Ok(descriptor)
}

#[async_trait]
impl CommandTransport for SerenityTransport {
    async fn fetch_commands(
        &self,
        application_id: ApplicationId,
        guild: Option<GuildId>,
    ) -> Result<Vec<CommandDescriptor>> {
        self.http.set_application_id(application_id.0);

        let commands = match guild {
            Some(guild_id) => self.http.get_guild_application_commands(guild_id.0).await?,
            None => self.http.get_global_application_commands().await?,
        };
        debug!(
            "Fetched {} remote commands for {}",
            commands.len(),
            guild.map(|g| g.to_string()).unwrap_or_else(|| "global scope".to_string())
        );

        commands
            .iter()
            .map(|command| convert_command(command, guild))
            .collect()
    }

    async fn create_command(&self, application_id: ApplicationId, command: &CommandDescriptor) -> Result<()> {
        self.http.set_application_id(application_id.0);
        let payload = command.create_payload()?;

        match command.guild_id {
            Some(guild_id) => {
                self.http
                    .create_guild_application_command(guild_id.0, &payload)
                    .await?;
            }
            None => {
                self.http.create_global_application_command(&payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_command(&self, application_id: ApplicationId, command: &CommandDescriptor) -> Result<()> {
        self.http.set_application_id(application_id.0);
        let command_id = command.id.ok_or_else(|| {
            CommandError::MalformedPayload(format!("remote command '{}' has no id", command.name))
        })?;

        match command.guild_id {
            Some(guild_id) => {
                self.http
                    .delete_guild_application_command(guild_id.0, command_id.0)
                    .await?
            }
            None => self.http.delete_global_application_command(command_id.0).await?,
        }
        Ok(())
    }

    async fn create_response(
        &self,
        interaction_id: InteractionId,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<()> {
        self.http
            .create_interaction_response(interaction_id.0, token, &response.to_json())
            .await?;
        Ok(())
    }

    async fn edit_response(&self, token: &str, message: &ResponseMessage) -> Result<()> {
        self.http
            .edit_original_interaction_response(token, &message.to_json())
            .await?;
        Ok(())
    }

    async fn create_followup(&self, token: &str, message: &ResponseMessage) -> Result<()> {
        self.http
            .create_followup_message(token, &message.to_json())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::arguments::{materialize, ArgValue};
    use crate::commands::interaction::InteractionType;
    use crate::commands::model::{CommandOption, CommandType, OptionType};
    use crate::commands::router::{find_focused, resolve_path};
    use serde_json::{json, Value};

    fn gateway(kind: u8, data: Value) -> GatewayInteraction {
        serde_json::from_value(json!({
            "id": "1",
            "application_id": "20",
            "type": kind,
            "guild_id": "30",
            "channel_id": "40",
            "user": {"id": "4", "username": "ada", "discriminator": "0001", "avatar": null},
            "token": "tok",
            "version": 1,
            "locale": "en-GB",
            "data": data
        }))
        .unwrap()
    }

    #[test]
    fn test_autocomplete_keeps_focus() {
        let raw = gateway(4, json!({
            "id": "100",
            "name": "find",
            "type": 1,
            "options": [
                {"name": "scope", "type": 3, "value": "all"},
                {"name": "query", "type": 3, "value": "ad", "focused": true}
            ]
        }));

        let interaction = convert_interaction(&raw).unwrap().unwrap();
        assert_eq!(interaction.kind, InteractionType::Autocomplete);
        assert_eq!(interaction.locale, "en-GB");
        assert_eq!(interaction.actor().map(|u| u.username.as_str()), Some("ada"));

        let focused = find_focused(&interaction.data.options).unwrap();
        assert_eq!(focused.name, "query");
        assert_eq!(focused.value, Some(json!("ad")));
    }

    #[test]
    fn test_role_option_resolves() {
        let raw = gateway(2, json!({
            "id": "100",
            "name": "promote",
            "type": 1,
            "options": [{"name": "role", "type": 8, "value": "7"}],
            "resolved": {"roles": {"7": {
                "id": "7",
                "name": "mods",
                "color": 0,
                "hoist": false,
                "managed": false,
                "permissions": "0",
                "position": 1
            }}}
        }));

        let interaction = convert_interaction(&raw).unwrap().unwrap();
        let route = resolve_path(&interaction.data).unwrap();
        let args = materialize(route.options, &interaction.data.resolved).unwrap();
        match &args["role"] {
            ArgValue::Role(role) => assert_eq!(role["name"], "mods"),
            other => panic!("expected a role, got {other:?}"),
        }
    }

    #[test]
    fn test_user_option_keeps_identity() {
        let raw = gateway(2, json!({
            "id": "100",
            "name": "inspect",
            "type": 1,
            "options": [{"name": "who", "type": 6, "value": "5"}],
            "resolved": {
                "users": {"5": {"id": "5", "username": "grace", "discriminator": "0002", "avatar": null}},
                "members": {"5": {"nick": "Admiral", "roles": []}}
            }
        }));

        let interaction = convert_interaction(&raw).unwrap().unwrap();
        let route = resolve_path(&interaction.data).unwrap();
        let args = materialize(route.options, &interaction.data.resolved).unwrap();

        assert!(matches!(args["who"], ArgValue::Member { .. }));
        assert_eq!(args["who"].object().unwrap()["nick"], "Admiral");
        assert_eq!(args["who"].user().unwrap()["username"], "grace");
    }

    #[test]
    fn test_remote_command_matches_local_descriptor() {
        let mut local = CommandDescriptor::new(CommandType::ChatInput, "greet", "Greet someone");
        local.options.push(CommandOption::new(OptionType::String, "name", "Who to greet").required(true));

        let mut remote = local.create_payload().unwrap();
        remote["id"] = json!("900");
        remote["application_id"] = json!("20");
        remote["version"] = json!("1");
        let remote: RemoteCommand = serde_json::from_value(remote).unwrap();

        let global = convert_command(&remote, None).unwrap();
        assert_eq!(global, local);
        assert_eq!(global.id.map(|id| id.0), Some(900));

        let scoped = convert_command(&remote, Some(GuildId(30))).unwrap();
        assert_eq!(scoped.guild_id, Some(GuildId(30)));
        assert!(scoped.is_same_command(&CommandDescriptor {
            guild_id: Some(GuildId(30)),
            ..local.clone()
        }));
    }

    #[test]
    fn test_other_interactions_skipped() {
        let ping: GatewayInteraction = serde_json::from_value(json!({
            "id": "1",
            "application_id": "20",
            "type": 1,
            "token": "tok",
            "version": 1
        }))
        .unwrap();
        assert!(convert_interaction(&ping).unwrap().is_none());
    }
}

//! Inbound interaction payloads
//!
//! Wire view of a command or autocomplete interaction, including the nested
//! option tree and the resolved cross-reference table.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Explicit resolved-section table for reference lookups
//! - 1.0.0: Initial payload model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::id::{ApplicationId, ChannelId, GuildId, InteractionId, UserId};

use super::model::{CommandType, OptionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    ApplicationCommand,
    Autocomplete,
    /// Pings, components and modals; never routed here
    Other(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            2 => InteractionType::ApplicationCommand,
            4 => InteractionType::Autocomplete,
            other => InteractionType::Other(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> Self {
        match kind {
            InteractionType::ApplicationCommand => 2,
            InteractionType::Autocomplete => 4,
            InteractionType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialUser {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMember {
    #[serde(default)]
    pub user: Option<PartialUser>,
    #[serde(default)]
    pub nick: Option<String>,
}

/// One node of the inbound option tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<InteractionOption>,
    #[serde(default)]
    pub focused: bool,
}

/// Sections of the resolved table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedSection {
    Users,
    Members,
    Roles,
    Channels,
    Messages,
    Attachments,
}

/// Per-interaction map from referenced ids to full entity data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolved {
    #[serde(default)]
    pub users: HashMap<String, Value>,
    #[serde(default)]
    pub members: HashMap<String, Value>,
    #[serde(default)]
    pub roles: HashMap<String, Value>,
    #[serde(default)]
    pub channels: HashMap<String, Value>,
    #[serde(default)]
    pub messages: HashMap<String, Value>,
    #[serde(default)]
    pub attachments: HashMap<String, Value>,
}

impl Resolved {
    pub fn section(&self, section: ResolvedSection) -> &HashMap<String, Value> {
        match section {
            ResolvedSection::Users => &self.users,
            ResolvedSection::Members => &self.members,
            ResolvedSection::Roles => &self.roles,
            ResolvedSection::Channels => &self.channels,
            ResolvedSection::Messages => &self.messages,
            ResolvedSection::Attachments => &self.attachments,
        }
    }

    /// First section (in the given order) holding `id`
    pub fn lookup(&self, sections: &[ResolvedSection], id: &str) -> Option<(ResolvedSection, &Value)> {
        sections
            .iter()
            .find_map(|&section| self.section(section).get(id).map(|value| (section, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.members.is_empty()
            && self.roles.is_empty()
            && self.channels.is_empty()
            && self.messages.is_empty()
            && self.attachments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    pub name: String,
    #[serde(rename = "type", default = "default_command_type")]
    pub kind: CommandType,
    /// Guild the invoked command is registered in, absent for global commands
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
    #[serde(default)]
    pub resolved: Resolved,
    #[serde(default)]
    pub target_id: Option<String>,
}

fn default_command_type() -> CommandType {
    CommandType::ChatInput
}

/// A command or autocomplete interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub application_id: ApplicationId,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub user: Option<PartialUser>,
    #[serde(default)]
    pub member: Option<InteractionMember>,
    pub data: InteractionData,
}

impl Interaction {
    pub fn is_autocomplete(&self) -> bool {
        self.kind == InteractionType::Autocomplete
    }

    /// Invoking user; guild interactions carry it inside `member`
    pub fn actor(&self) -> Option<&PartialUser> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "id": "10",
            "application_id": "20",
            "type": 2,
            "token": "tok",
            "guild_id": "30",
            "channel_id": "40",
            "locale": "en-US",
            "member": {"user": {"id": "50", "username": "ada"}, "nick": null},
            "data": {
                "id": "60",
                "name": "ban",
                "type": 1,
                "options": [{"name": "who", "type": 6, "value": "50"}],
                "resolved": {"users": {"50": {"id": "50", "username": "ada"}}}
            }
        })
    }

    #[test]
    fn test_interaction_deserializes() {
        let interaction: Interaction = serde_json::from_value(payload()).unwrap();
        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.guild_id, Some(GuildId(30)));
        assert_eq!(interaction.data.options[0].kind, OptionType::User);
        assert_eq!(interaction.actor().map(|u| u.id), Some(UserId(50)));
        assert!(!interaction.data.resolved.is_empty());
    }

    #[test]
    fn test_unknown_interaction_kind_kept() {
        let mut raw = payload();
        raw["type"] = json!(3);
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, InteractionType::Other(3));
    }

    #[test]
    fn test_lookup_follows_section_order() {
        let resolved: Resolved = serde_json::from_value(json!({
            "users": {"1": {"id": "1", "username": "u"}},
            "members": {"1": {"nick": "m"}}
        }))
        .unwrap();

        let (section, value) = resolved
            .lookup(&[ResolvedSection::Members, ResolvedSection::Users], "1")
            .unwrap();
        assert_eq!(section, ResolvedSection::Members);
        assert_eq!(value["nick"], "m");

        let (section, _) = resolved
            .lookup(&[ResolvedSection::Users, ResolvedSection::Members], "1")
            .unwrap();
        assert_eq!(section, ResolvedSection::Users);

        assert!(resolved.lookup(&[ResolvedSection::Roles], "1").is_none());
    }
}

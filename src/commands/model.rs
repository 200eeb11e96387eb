//! # Command Descriptor Model
//!
//! Declarative shape of commands and options as the remote registration
//! endpoint understands them. Serializes to Discord's JSON layout so the same
//! values travel to and from the transport unchanged.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Choices and autocomplete flag on options
//! - 1.1.0: Loose identity comparison (`is_same_command`)
//! - 1.0.0: Initial descriptor and identity key types

use serde::{Deserialize, Serialize};
use serenity::model::id::{CommandId, GuildId};

use crate::core::CommandError;

/// Placeholder description for commands declared without one
pub const PLACEHOLDER_DESCRIPTION: &str = "\u{200B}";

/// Description used for synthesized group and sub-group containers
pub const GROUP_DESCRIPTION: &str = "HIDDEN";

/// Top-level command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CommandType {
    ChatInput,
    User,
    Message,
}

impl TryFrom<u8> for CommandType {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CommandType::ChatInput),
            2 => Ok(CommandType::User),
            3 => Ok(CommandType::Message),
            other => Err(CommandError::UnknownCommandType(other)),
        }
    }
}

impl From<CommandType> for u8 {
    fn from(kind: CommandType) -> Self {
        match kind {
            CommandType::ChatInput => 1,
            CommandType::User => 2,
            CommandType::Message => 3,
        }
    }
}

/// Option kind, covering both nesting levels and leaf value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionType {
    /// True for the two nesting kinds, which never carry a value
    pub fn is_nesting(self) -> bool {
        matches!(self, OptionType::SubCommand | OptionType::SubCommandGroup)
    }
}

impl TryFrom<u8> for OptionType {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => OptionType::SubCommand,
            2 => OptionType::SubCommandGroup,
            3 => OptionType::String,
            4 => OptionType::Integer,
            5 => OptionType::Boolean,
            6 => OptionType::User,
            7 => OptionType::Channel,
            8 => OptionType::Role,
            9 => OptionType::Mentionable,
            10 => OptionType::Number,
            11 => OptionType::Attachment,
            other => return Err(CommandError::UnknownOptionType(other)),
        })
    }
}

impl From<OptionType> for u8 {
    fn from(kind: OptionType) -> Self {
        match kind {
            OptionType::SubCommand => 1,
            OptionType::SubCommandGroup => 2,
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Mentionable => 9,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }
}

/// Fixed choice offered for a string, integer or number option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// One option of a command: a nesting level or a leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: OptionType,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autocomplete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_permission() -> bool {
    true
}

impl CommandOption {
    pub fn new(kind: OptionType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            autocomplete: false,
            options: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a child option, enforcing the nesting rule:
    /// groups hold sub-commands, sub-commands hold leaf values, leaves hold nothing.
    pub fn child(mut self, child: CommandOption) -> Result<Self, CommandError> {
        let allowed = match self.kind {
            OptionType::SubCommandGroup => child.kind == OptionType::SubCommand,
            OptionType::SubCommand => !child.kind.is_nesting(),
            _ => false,
        };
        if !allowed {
            return Err(CommandError::MalformedPayload(format!(
                "option '{}' ({:?}) cannot contain '{}' ({:?})",
                self.name, self.kind, child.name, child.kind
            )));
        }
        self.options.push(child);
        Ok(self)
    }
}

/// A command as registered with the remote service
///
/// `id` is assigned remotely and is ignored by equality: two descriptors are
/// equal when everything that would be posted is equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,
    #[serde(rename = "type", default = "default_command_type")]
    pub kind: CommandType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(default = "default_permission")]
    pub default_permission: bool,
}

fn default_command_type() -> CommandType {
    CommandType::ChatInput
}

impl PartialEq for CommandDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.description == other.description
            && self.guild_id == other.guild_id
            && self.options == other.options
            && self.default_permission == other.default_permission
    }
}

impl CommandDescriptor {
    pub fn new(kind: CommandType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            description: description.into(),
            guild_id: None,
            options: Vec::new(),
            default_permission: true,
        }
    }

    /// Loose identity: same top-level name, kind and guild scope.
    /// Description and options are ignored.
    pub fn is_same_command(&self, other: &CommandDescriptor) -> bool {
        self.kind == other.kind && self.name == other.name && self.guild_id == other.guild_id
    }

    /// Body for the create endpoint; scope travels in the URL, not the body
    pub fn create_payload(&self) -> serde_json::Result<serde_json::Value> {
        let mut payload = serde_json::to_value(self)?;
        if let Some(body) = payload.as_object_mut() {
            body.remove("id");
            body.remove("guild_id");
        }
        Ok(payload)
    }

    /// Identity key of this descriptor as a top-level command
    pub fn unique(&self) -> Unique {
        Unique {
            name: self.name.clone(),
            kind: self.kind,
            guild_id: self.guild_id,
            group: None,
            sub_group: None,
        }
    }
}

/// Identity key of a registered command
///
/// Two handlers are the same command iff their keys match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unique {
    pub name: String,
    pub kind: CommandType,
    pub guild_id: Option<GuildId>,
    pub group: Option<String>,
    pub sub_group: Option<String>,
}

impl Unique {
    pub fn new(
        name: impl Into<String>,
        kind: CommandType,
        guild_id: Option<GuildId>,
        group: Option<String>,
        sub_group: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            guild_id,
            group,
            sub_group,
        }
    }

    /// Same key with the guild scope removed
    pub fn global(&self) -> Self {
        Self {
            guild_id: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_remote_json() {
        let remote: CommandDescriptor = serde_json::from_value(json!({
            "id": "900",
            "application_id": "1",
            "type": 1,
            "name": "ping",
            "description": "Check latency",
            "guild_id": "77",
            "default_permission": true,
            "version": "1"
        }))
        .unwrap();

        assert_eq!(remote.id, Some(CommandId(900)));
        assert_eq!(remote.guild_id, Some(GuildId(77)));
        assert_eq!(remote.kind, CommandType::ChatInput);
        assert!(remote.options.is_empty());
    }

    #[test]
    fn test_equality_ignores_id() {
        let mut local = CommandDescriptor::new(CommandType::ChatInput, "ping", "pong");
        let mut remote = local.clone();
        remote.id = Some(CommandId(5));
        assert_eq!(local, remote);

        local.description = "changed".into();
        assert_ne!(local, remote);
        assert!(local.is_same_command(&remote));
    }

    #[test]
    fn test_same_command_respects_guild_and_kind() {
        let global = CommandDescriptor::new(CommandType::ChatInput, "info", "x");
        let mut guild = global.clone();
        guild.guild_id = Some(GuildId(1));
        assert!(!global.is_same_command(&guild));

        let user_cmd = CommandDescriptor::new(CommandType::User, "info", "");
        assert!(!global.is_same_command(&user_cmd));
    }

    #[test]
    fn test_create_payload_strips_scope() {
        let mut command = CommandDescriptor::new(CommandType::ChatInput, "ping", "pong");
        command.id = Some(CommandId(1));
        command.guild_id = Some(GuildId(2));
        let payload = command.create_payload().unwrap();
        assert_eq!(
            payload,
            json!({"type": 1, "name": "ping", "description": "pong", "default_permission": true})
        );
    }

    #[test]
    fn test_option_serialization_omits_defaults() {
        let option = CommandOption::new(OptionType::String, "name", "who");
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(value, json!({"type": 3, "name": "name", "description": "who"}));

        let back: CommandOption = serde_json::from_value(value).unwrap();
        assert_eq!(back, option);
    }

    #[test]
    fn test_unknown_option_type_rejected() {
        let result: Result<CommandOption, _> =
            serde_json::from_value(json!({"type": 99, "name": "x", "description": "y"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_nesting_rule() {
        let leaf = CommandOption::new(OptionType::Integer, "n", "count");
        let sub = CommandOption::new(OptionType::SubCommand, "add", "add")
            .child(leaf.clone())
            .unwrap();
        let group = CommandOption::new(OptionType::SubCommandGroup, "math", "math")
            .child(sub.clone())
            .unwrap();
        assert_eq!(group.options[0].options[0].name, "n");

        assert!(CommandOption::new(OptionType::SubCommandGroup, "g", "g")
            .child(leaf.clone())
            .is_err());
        assert!(CommandOption::new(OptionType::SubCommand, "s", "s")
            .child(sub)
            .is_err());
        assert!(CommandOption::new(OptionType::String, "s", "s").child(leaf).is_err());
    }

    #[test]
    fn test_unique_global() {
        let key = Unique::new("greet", CommandType::ChatInput, Some(GuildId(3)), Some("social".into()), None);
        let global = key.global();
        assert_eq!(global.guild_id, None);
        assert_eq!(global.group.as_deref(), Some("social"));
    }
}

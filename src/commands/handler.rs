//! Command callbacks and their registration records
//!
//! - **Version**: 2.1.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.1: Derived names keep acronyms together
//! - 2.1.0: `Group` / `SubGroup` builders with group-level hooks
//! - 2.0.0: Builder-based declaration replacing static name lists
//! - 1.0.0: Initial implementation for modular command handling

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::GuildId;

use super::context::InteractionContext;
use super::hooks::Hook;
use super::interaction::InteractionOption;
use super::model::{
    CommandDescriptor, CommandOption, CommandType, Unique, PLACEHOLDER_DESCRIPTION,
};
use super::response::AutocompleteChoice;
use crate::core::CommandError;

const MAX_NAME_LEN: usize = 32;

/// Trait for command callbacks
///
/// Materialized arguments are available through `ctx.options`.
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// #[async_trait]
/// impl CommandCallback for Ping {
///     async fn call(&self, ctx: &mut InteractionContext) -> Result<()> {
///         ctx.respond(ResponseMessage::content("pong")).await
///     }
/// }
/// ```
#[async_trait]
pub trait CommandCallback: Send + Sync {
    async fn call(&self, ctx: &mut InteractionContext) -> Result<()>;

    /// Name used when the declaration does not give one: the type name in snake_case
    fn default_name(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.rsplit("::").next().unwrap_or(full);
        to_snake_case(base)
    }
}

/// Suggests values for one option while the user types
#[async_trait]
pub trait AutocompleteCallback: Send + Sync {
    async fn complete(
        &self,
        ctx: &InteractionContext,
        option: &InteractionOption,
    ) -> Result<Vec<AutocompleteChoice>>;
}

/// `RollDice` becomes `roll_dice`; acronym runs stay together, so `HTTPPing` becomes `http_ping`
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Validate a chat-input command, group or option name
pub fn validate_name(name: &str) -> Result<(), CommandError> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_lowercase() || c.is_numeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CommandError::InvalidName(name.to_string()))
    }
}

fn validate_context_menu_name(name: &str) -> Result<(), CommandError> {
    if name.trim().is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(CommandError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A declared command: descriptor, grouping labels, hooks and callbacks
pub struct RegisteredCommand {
    pub descriptor: CommandDescriptor,
    pub group: Option<String>,
    pub sub_group: Option<String>,
    pub callback: Arc<dyn CommandCallback>,
    pub hooks: Vec<Arc<dyn Hook>>,
    pub after_hooks: Vec<Arc<dyn Hook>>,
    pub autocomplete: HashMap<String, Arc<dyn AutocompleteCallback>>,
}

impl RegisteredCommand {
    /// Identity key, with `guild` used when the command names no guild itself
    pub fn unique(&self, default_guild: Option<GuildId>) -> Unique {
        Unique {
            name: self.descriptor.name.clone(),
            kind: self.descriptor.kind,
            guild_id: self.descriptor.guild_id.or(default_guild),
            group: self.group.clone(),
            sub_group: self.sub_group.clone(),
        }
    }
}

impl std::fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("descriptor", &self.descriptor)
            .field("group", &self.group)
            .field("sub_group", &self.sub_group)
            .field("hooks", &self.hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .field("autocomplete", &self.autocomplete.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Declares a command
pub struct CommandBuilder {
    kind: CommandType,
    callback: Arc<dyn CommandCallback>,
    name: Option<String>,
    description: Option<String>,
    guild: Option<GuildId>,
    group: Option<String>,
    sub_group: Option<String>,
    options: Vec<CommandOption>,
    default_permission: bool,
    hooks: Vec<Arc<dyn Hook>>,
    after_hooks: Vec<Arc<dyn Hook>>,
    autocomplete: HashMap<String, Arc<dyn AutocompleteCallback>>,
}

impl CommandBuilder {
    fn new(kind: CommandType, callback: Arc<dyn CommandCallback>) -> Self {
        Self {
            kind,
            callback,
            name: None,
            description: None,
            guild: None,
            group: None,
            sub_group: None,
            options: Vec::new(),
            default_permission: true,
            hooks: Vec::new(),
            after_hooks: Vec::new(),
            autocomplete: HashMap::new(),
        }
    }

    /// Slash command
    pub fn chat_input(callback: impl CommandCallback + 'static) -> Self {
        Self::new(CommandType::ChatInput, Arc::new(callback))
    }

    /// Context-menu command on a user
    pub fn user(callback: impl CommandCallback + 'static) -> Self {
        Self::new(CommandType::User, Arc::new(callback))
    }

    /// Context-menu command on a message
    pub fn message(callback: impl CommandCallback + 'static) -> Self {
        Self::new(CommandType::Message, Arc::new(callback))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn guild(mut self, guild: GuildId) -> Self {
        self.guild = Some(guild);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn sub_group(mut self, sub_group: impl Into<String>) -> Self {
        self.sub_group = Some(sub_group.into());
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn default_permission(mut self, default_permission: bool) -> Self {
        self.default_permission = default_permission;
        self
    }

    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn after_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    /// Attach an autocomplete callback to the option named `option`
    pub fn autocomplete(
        mut self,
        option: impl Into<String>,
        callback: impl AutocompleteCallback + 'static,
    ) -> Self {
        self.autocomplete.insert(option.into(), Arc::new(callback));
        self
    }

    pub fn build(mut self) -> Result<RegisteredCommand, CommandError> {
        let name = self
            .name
            .take()
            .unwrap_or_else(|| self.callback.default_name());

        let description = match self.kind {
            CommandType::ChatInput => {
                validate_name(&name)?;
                self.description
                    .take()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string())
            }
            // Context-menu commands must be posted with an empty description
            CommandType::User | CommandType::Message => {
                validate_context_menu_name(&name)?;
                if self.group.is_some() || self.sub_group.is_some() {
                    return Err(CommandError::InvalidGrouping(format!(
                        "context menu command '{name}' cannot be grouped"
                    )));
                }
                if !self.options.is_empty() {
                    return Err(CommandError::InvalidGrouping(format!(
                        "context menu command '{name}' cannot take options"
                    )));
                }
                String::new()
            }
        };

        if let Some(group) = &self.group {
            validate_name(group)?;
        }
        if let Some(sub_group) = &self.sub_group {
            validate_name(sub_group)?;
            if self.group.is_none() {
                return Err(CommandError::InvalidGrouping(format!(
                    "sub-group '{sub_group}' of '{name}' declared without a group"
                )));
            }
        }

        for option in &mut self.options {
            validate_name(&option.name)?;
            if option.kind.is_nesting() {
                return Err(CommandError::InvalidGrouping(format!(
                    "option '{}' of '{name}': use group/sub_group instead of nesting options",
                    option.name
                )));
            }
            if self.autocomplete.contains_key(&option.name) {
                option.autocomplete = true;
            }
        }

        Ok(RegisteredCommand {
            descriptor: CommandDescriptor {
                id: None,
                kind: self.kind,
                name,
                description,
                guild_id: self.guild,
                options: self.options,
                default_permission: self.default_permission,
            },
            group: self.group,
            sub_group: self.sub_group,
            callback: self.callback,
            hooks: self.hooks,
            after_hooks: self.after_hooks,
            autocomplete: self.autocomplete,
        })
    }
}

/// Declare a slash command in one call
#[allow(clippy::too_many_arguments)]
pub fn register_command(
    callback: impl CommandCallback + 'static,
    guild: Option<GuildId>,
    group: Option<&str>,
    sub_group: Option<&str>,
    name: Option<&str>,
    description: Option<&str>,
    options: Vec<CommandOption>,
    default_permission: Option<bool>,
) -> Result<RegisteredCommand, CommandError> {
    let mut builder = CommandBuilder::chat_input(callback).options(options);
    if let Some(guild) = guild {
        builder = builder.guild(guild);
    }
    if let Some(group) = group {
        builder = builder.group(group);
    }
    if let Some(sub_group) = sub_group {
        builder = builder.sub_group(sub_group);
    }
    if let Some(name) = name {
        builder = builder.name(name);
    }
    if let Some(description) = description {
        builder = builder.description(description);
    }
    if let Some(default_permission) = default_permission {
        builder = builder.default_permission(default_permission);
    }
    builder.build()
}

/// Top-level command group; every command it declares becomes a sub-command
#[derive(Clone)]
pub struct Group {
    name: String,
    hooks: Vec<Arc<dyn Hook>>,
    after_hooks: Vec<Arc<dyn Hook>>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hook run before the hooks of every command in the group
    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn after_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    pub fn sub_group(&self, name: impl Into<String>) -> SubGroup {
        SubGroup {
            parent: self.clone(),
            name: name.into(),
            hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    pub fn command(&self, callback: impl CommandCallback + 'static) -> CommandBuilder {
        let mut builder = CommandBuilder::chat_input(callback).group(self.name.clone());
        builder.hooks.extend(self.hooks.iter().cloned());
        builder.after_hooks.extend(self.after_hooks.iter().cloned());
        builder
    }
}

/// Second nesting level inside a [`Group`]
#[derive(Clone)]
pub struct SubGroup {
    parent: Group,
    name: String,
    hooks: Vec<Arc<dyn Hook>>,
    after_hooks: Vec<Arc<dyn Hook>>,
}

impl SubGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn after_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    pub fn command(&self, callback: impl CommandCallback + 'static) -> CommandBuilder {
        let mut builder = self.parent.command(callback).sub_group(self.name.clone());
        builder.hooks.extend(self.hooks.iter().cloned());
        builder.after_hooks.extend(self.after_hooks.iter().cloned());
        builder
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::hooks::HookResult;
    use crate::commands::model::OptionType;

    pub(crate) struct Noop;

    #[async_trait]
    impl CommandCallback for Noop {
        async fn call(&self, _ctx: &mut InteractionContext) -> Result<()> {
            Ok(())
        }
    }

    struct GreetUser;

    #[async_trait]
    impl CommandCallback for GreetUser {
        async fn call(&self, _ctx: &mut InteractionContext) -> Result<()> {
            Ok(())
        }
    }

    struct Pass;

    #[async_trait]
    impl Hook for Pass {
        async fn run(&self, _ctx: &mut InteractionContext) -> Result<HookResult> {
            Ok(HookResult::Continue)
        }
    }

    struct Suggest;

    #[async_trait]
    impl AutocompleteCallback for Suggest {
        async fn complete(
            &self,
            _ctx: &InteractionContext,
            _option: &InteractionOption,
        ) -> Result<Vec<AutocompleteChoice>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_default_name_from_type() {
        let command = CommandBuilder::chat_input(GreetUser).build().unwrap();
        assert_eq!(command.descriptor.name, "greet_user");
        assert_eq!(command.descriptor.description, PLACEHOLDER_DESCRIPTION);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Ping"), "ping");
        assert_eq!(to_snake_case("RollDice"), "roll_dice");
        assert_eq!(to_snake_case("HTTPPing"), "http_ping");
        assert_eq!(to_snake_case("GetURL"), "get_url");
        assert_eq!(to_snake_case("Roll2Dice"), "roll2_dice");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("greet").is_ok());
        assert!(validate_name("set-role_2").is_ok());
        assert!(validate_name("Greet").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_context_menu_commands() {
        let command = CommandBuilder::user(Noop).name("Inspect User").build().unwrap();
        assert_eq!(command.descriptor.kind, CommandType::User);
        assert_eq!(command.descriptor.description, "");

        assert!(CommandBuilder::message(Noop)
            .name("Quote")
            .group("tools")
            .build()
            .is_err());
    }

    #[test]
    fn test_sub_group_requires_group() {
        let result = CommandBuilder::chat_input(Noop)
            .name("x")
            .sub_group("inner")
            .build();
        assert!(matches!(result, Err(CommandError::InvalidGrouping(_))));
    }

    #[test]
    fn test_autocomplete_marks_option() {
        let command = CommandBuilder::chat_input(Noop)
            .name("find")
            .option(CommandOption::new(OptionType::String, "query", "what"))
            .autocomplete("query", Suggest)
            .build()
            .unwrap();
        assert!(command.descriptor.options[0].autocomplete);
        assert!(command.autocomplete.contains_key("query"));
    }

    #[test]
    fn test_nested_option_rejected() {
        let result = CommandBuilder::chat_input(Noop)
            .name("x")
            .option(CommandOption::new(OptionType::SubCommand, "y", "y"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_group_stamps_labels_and_hooks() {
        let admin = Group::new("admin").hook(Pass);
        let roles = admin.sub_group("roles").hook(Pass).after_hook(Pass);

        let command = roles.command(Noop).name("grant").hook(Pass).build().unwrap();
        assert_eq!(command.group.as_deref(), Some("admin"));
        assert_eq!(command.sub_group.as_deref(), Some("roles"));
        assert_eq!(command.hooks.len(), 3);
        assert_eq!(command.after_hooks.len(), 1);
    }

    #[test]
    fn test_register_command_fn() {
        let command = register_command(
            Noop,
            Some(GuildId(9)),
            Some("social"),
            None,
            Some("greet"),
            Some("Say hello"),
            vec![CommandOption::new(OptionType::String, "name", "who").required(true)],
            Some(false),
        )
        .unwrap();
        assert_eq!(command.descriptor.guild_id, Some(GuildId(9)));
        assert!(!command.descriptor.default_permission);
        assert_eq!(
            command.unique(None),
            Unique::new("greet", CommandType::ChatInput, Some(GuildId(9)), Some("social".into()), None)
        );
    }

    #[test]
    fn test_unique_applies_default_guild() {
        let command = CommandBuilder::chat_input(Noop).name("ping").build().unwrap();
        assert_eq!(command.unique(Some(GuildId(4))).guild_id, Some(GuildId(4)));
        assert_eq!(command.unique(None).guild_id, None);
    }
}

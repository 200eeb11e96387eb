//! # Plugins
//!
//! Owning containers for declared commands. The registry only holds weak
//! references, so a command stays live exactly as long as its plugin does.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use std::sync::Arc;

use super::handler::{CommandBuilder, RegisteredCommand};
use crate::core::CommandError;

pub struct Plugin {
    name: String,
    commands: Vec<Arc<RegisteredCommand>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take ownership of a declared command
    pub fn include(&mut self, command: RegisteredCommand) -> Arc<RegisteredCommand> {
        let command = Arc::new(command);
        self.commands.push(Arc::clone(&command));
        command
    }

    /// Build and include in one step
    pub fn command(&mut self, builder: CommandBuilder) -> Result<Arc<RegisteredCommand>, CommandError> {
        Ok(self.include(builder.build()?))
    }

    pub fn commands(&self) -> &[Arc<RegisteredCommand>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::tests::Noop;

    #[test]
    fn test_plugin_owns_commands() {
        let mut plugin = Plugin::new("utility");
        assert!(plugin.is_empty());

        let ping = plugin
            .command(CommandBuilder::chat_input(Noop).name("ping"))
            .unwrap();
        assert_eq!(plugin.len(), 1);
        // plugin + local handle
        assert_eq!(Arc::strong_count(&ping), 2);
        assert_eq!(plugin.commands()[0].descriptor.name, "ping");
    }

    #[test]
    fn test_invalid_command_not_included() {
        let mut plugin = Plugin::new("utility");
        assert!(plugin
            .command(CommandBuilder::chat_input(Noop).name("Bad Name"))
            .is_err());
        assert!(plugin.is_empty());
    }
}

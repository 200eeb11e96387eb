//! # Command Client
//!
//! Owns the registry, plugins, global hooks and error chains, and feeds
//! incoming interactions through the execution pipeline.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Plugins are owned by the client and can be removed at runtime
//! - 1.1.0: Client-wide hooks and error chains
//! - 1.0.0: Initial init/synchronize/dispatch

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info};
use serenity::model::id::{ApplicationId, GuildId};
use tokio::sync::RwLock;

use crate::commands::context::PendingResponse;
use crate::commands::handler::RegisteredCommand;
use crate::commands::hooks::{
    AutocompleteErrorHandler, CommandErrorHandler, ErrorHandlers, ErrorReporter, Hook, LogReporter,
};
use crate::commands::interaction::Interaction;
use crate::commands::pipeline::{Outcome, Pipeline};
use crate::commands::plugin::Plugin;
use crate::commands::registry::{CommandRegistry, SyncReport};
use crate::core::{CommandError, Config};
use crate::transport::CommandTransport;

/// Entry point for registering commands and dispatching interactions
pub struct Client {
    config: Config,
    registry: CommandRegistry,
    transport: Arc<dyn CommandTransport>,
    application_id: RwLock<Option<ApplicationId>>,
    guilds: RwLock<Vec<GuildId>>,
    plugins: DashMap<String, Plugin>,
    hooks: Vec<Arc<dyn Hook>>,
    after_hooks: Vec<Arc<dyn Hook>>,
    command_errors: ErrorHandlers<dyn CommandErrorHandler>,
    autocomplete_errors: ErrorHandlers<dyn AutocompleteErrorHandler>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Client {
    pub fn new(config: Config, transport: Arc<dyn CommandTransport>) -> Self {
        Self {
            registry: CommandRegistry::new(config.default_guild),
            config,
            transport,
            application_id: RwLock::new(None),
            guilds: RwLock::new(Vec::new()),
            plugins: DashMap::new(),
            hooks: Vec::new(),
            after_hooks: Vec::new(),
            command_errors: ErrorHandlers::new(),
            autocomplete_errors: ErrorHandlers::new(),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Hook run before every command's own hooks
    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Hook run after every command's own post-hooks
    pub fn with_after_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    pub fn catch_command_error(mut self, handler: impl CommandErrorHandler + 'static) -> Self {
        self.command_errors.push(Arc::new(handler));
        self
    }

    pub fn catch_autocomplete_error(mut self, handler: impl AutocompleteErrorHandler + 'static) -> Self {
        self.autocomplete_errors.push(Arc::new(handler));
        self
    }

    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn application_id(&self) -> Option<ApplicationId> {
        *self.application_id.read().await
    }

    /// Register a command the caller owns. The registry keeps only a weak
    /// reference; dropping every handle removes the command.
    pub fn register(&self, command: Arc<RegisteredCommand>) -> Arc<RegisteredCommand> {
        self.registry.register(command)
    }

    /// Take ownership of a plugin and register its commands.
    ///
    /// A plugin with the same name is replaced; its commands disappear unless
    /// the new plugin re-registers them.
    pub fn add_plugin(&self, plugin: Plugin) {
        for command in plugin.commands() {
            self.registry.register(Arc::clone(command));
        }
        info!("Loaded plugin '{}' with {} commands", plugin.name(), plugin.len());
        if let Some(previous) = self.plugins.insert(plugin.name().to_string(), plugin) {
            debug!("Replaced plugin '{}'", previous.name());
        }
    }

    /// Remove a plugin and unregister its commands. Returns the plugin if it was loaded.
    pub fn remove_plugin(&self, name: &str) -> Option<Plugin> {
        let (_, plugin) = self.plugins.remove(name)?;
        let default_guild = self.registry.default_guild();
        for command in plugin.commands() {
            let key = command.unique(default_guild);
            // another owner may have re-registered the key since
            if let Some(current) = self.registry.get(&key) {
                if Arc::ptr_eq(&current, command) {
                    self.registry.unregister(&key);
                }
            }
        }
        info!("Unloaded plugin '{}'", plugin.name());
        Some(plugin)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Record the application id and the guilds to manage, then synchronize
    /// commands when `update_commands` is set.
    ///
    /// `discovered_guilds` is used only when the config names no guilds.
    pub async fn init(
        &self,
        application_id: ApplicationId,
        discovered_guilds: Vec<GuildId>,
    ) -> Result<Option<SyncReport>> {
        *self.application_id.write().await = Some(application_id);

        let guilds = if self.config.command_guilds.is_empty() {
            discovered_guilds
        } else {
            self.config.command_guilds.clone()
        };
        info!("Command client ready for application {application_id} in {} guilds", guilds.len());
        *self.guilds.write().await = guilds;

        if self.config.update_commands {
            Ok(Some(self.synchronize().await?))
        } else {
            Ok(None)
        }
    }

    /// Run the remote diff for the global scope and every managed guild
    pub async fn synchronize(&self) -> Result<SyncReport> {
        let application_id = self
            .application_id()
            .await
            .ok_or(CommandError::MissingApplicationId)?;
        let guilds = self.guilds.read().await.clone();

        let report = self
            .registry
            .synchronize(self.transport.as_ref(), application_id, &guilds)
            .await?;
        info!(
            "Command sync done: {} deleted, {} created",
            report.deleted.len(),
            report.created.len()
        );
        Ok(report)
    }

    /// Dispatch one interaction. Failures inside callbacks and hooks go to
    /// the error chains; only malformed payloads return `Err`.
    pub async fn handle_interaction(
        &self,
        interaction: Interaction,
        pending: Option<PendingResponse>,
    ) -> Result<Outcome, CommandError> {
        self.pipeline().handle(interaction, pending).await
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            registry: &self.registry,
            transport: &self.transport,
            hooks: &self.hooks,
            after_hooks: &self.after_hooks,
            command_errors: &self.command_errors,
            autocomplete_errors: &self.autocomplete_errors,
            reporter: self.reporter.as_ref(),
            allow_unknown_interactions: self.config.allow_unknown_interactions,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("commands", &self.registry.len())
            .field("plugins", &self.plugins.len())
            .field("hooks", &self.hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .finish_non_exhaustive()
    }
}

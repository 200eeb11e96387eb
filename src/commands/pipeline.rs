//! Execution pipeline
//!
//! End-to-end handling of one interaction: route, look up, materialize, run
//! hooks and the callback, and hand failures to the error chains.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Panics inside hooks are reported like errors
//! - 1.1.0: Panics inside callbacks are reported like errors
//! - 1.0.0: Initial command and autocomplete pipelines

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use log::{debug, info, warn};

use super::arguments::{materialize, raw_arguments, resolved_target};
use super::context::{InteractionContext, PendingResponse};
use super::handler::RegisteredCommand;
use super::hooks::{
    AutocompleteErrorHandler, CommandErrorHandler, ErrorHandlers, ErrorReporter, Hook, HookResult,
};
use super::interaction::{Interaction, InteractionType};
use super::model::{CommandType, Unique};
use super::registry::CommandRegistry;
use super::response::InteractionResponse;
use super::router::{find_focused, resolve_path, Route};
use crate::core::CommandError;
use crate::transport::CommandTransport;

/// How one interaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command or autocomplete interaction
    NotRouted,
    /// No local handler matched
    UnknownCommand,
    /// A pre-hook asked to stop
    Exited,
    /// No focused option, or no autocomplete callback for it
    NoAutocomplete,
    Completed,
    /// The callback or a hook failed; `handled` says whether the chain claimed it
    Failed { handled: bool },
}

/// Borrowed view of everything one interaction needs
pub struct Pipeline<'a> {
    pub registry: &'a CommandRegistry,
    pub transport: &'a Arc<dyn CommandTransport>,
    pub hooks: &'a [Arc<dyn Hook>],
    pub after_hooks: &'a [Arc<dyn Hook>],
    pub command_errors: &'a ErrorHandlers<dyn CommandErrorHandler>,
    pub autocomplete_errors: &'a ErrorHandlers<dyn AutocompleteErrorHandler>,
    pub reporter: &'a dyn ErrorReporter,
    pub allow_unknown_interactions: bool,
}

impl<'a> Pipeline<'a> {
    /// Handle one interaction.
    ///
    /// Callback and hook failures are contained here and reported through the
    /// error chains; only malformed payloads come back as `Err`.
    pub async fn handle(
        &self,
        interaction: Interaction,
        pending: Option<PendingResponse>,
    ) -> Result<Outcome, CommandError> {
        let autocomplete = match interaction.kind {
            InteractionType::ApplicationCommand => false,
            InteractionType::Autocomplete => true,
            InteractionType::Other(kind) => {
                debug!("Ignoring interaction {} of type {kind}", interaction.id);
                return Ok(Outcome::NotRouted);
            }
        };

        let Route { path, options } = resolve_path(&interaction.data)?;

        let key = Unique::new(
            path.command.clone(),
            interaction.data.kind,
            interaction.guild_id,
            path.group.clone(),
            path.sub_group.clone(),
        );
        let Some(command) = self.registry.lookup(&key) else {
            if !self.allow_unknown_interactions {
                warn!(
                    "Handler for command `{}` does not exist locally. (If this is intended, \
                     set allow_unknown_interactions in the client config.)",
                    path.command
                );
            }
            return Ok(Outcome::UnknownCommand);
        };

        let arguments = if autocomplete {
            raw_arguments(options)?
        } else if interaction.data.kind == CommandType::ChatInput {
            materialize(options, &interaction.data.resolved)?
        } else {
            resolved_target(&interaction.data)?
        };

        let ctx = InteractionContext::new(
            interaction,
            path,
            arguments,
            Arc::clone(self.transport),
            pending,
        );

        if autocomplete {
            Ok(self.run_autocomplete(&command, ctx).await)
        } else {
            Ok(self.run_command(&command, ctx).await)
        }
    }

    async fn run_command(&self, command: &RegisteredCommand, mut ctx: InteractionContext) -> Outcome {
        info!(
            "[{}] Command '{}' (group: {:?}, sub-group: {:?}) | User: {} | Guild: {}",
            ctx.request_id,
            ctx.command,
            ctx.group,
            ctx.sub_group,
            ctx.user.as_ref().map(|u| u.id.to_string()).unwrap_or_default(),
            ctx.guild_id.map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string()),
        );

        let pre_hooks = self.hooks.iter().chain(command.hooks.iter());
        match run_hooks(pre_hooks, &mut ctx).await {
            Ok(HookResult::Continue) => {}
            Ok(HookResult::Exit) => {
                debug!("[{}] Pre-hook exited before '{}'", ctx.request_id, ctx.command);
                return Outcome::Exited;
            }
            Err(error) => return self.command_failed(error, &ctx).await,
        }

        let called = AssertUnwindSafe(command.callback.call(&mut ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error(panic)));

        let result = match called {
            Ok(()) => {
                let post_hooks = command.after_hooks.iter().chain(self.after_hooks.iter());
                run_hooks(post_hooks, &mut ctx).await.map(|_| ())
            }
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                debug!("[{}] Command '{}' completed", ctx.request_id, ctx.command);
                Outcome::Completed
            }
            Err(error) => self.command_failed(error, &ctx).await,
        }
    }

    async fn command_failed(&self, error: anyhow::Error, ctx: &InteractionContext) -> Outcome {
        let handled = self.command_errors.try_handle(&error, ctx).await;
        self.reporter.on_command_error(&error, ctx, handled).await;
        Outcome::Failed { handled }
    }

    async fn run_autocomplete(&self, command: &RegisteredCommand, mut ctx: InteractionContext) -> Outcome {
        if command.autocomplete.is_empty() {
            return Outcome::NoAutocomplete;
        }

        let Some(option) = find_focused(&ctx.interaction.data.options).cloned() else {
            return Outcome::NoAutocomplete;
        };
        let Some(callback) = command.autocomplete.get(&option.name) else {
            debug!(
                "[{}] No autocomplete callback for '{}' option '{}'",
                ctx.request_id, ctx.command, option.name
            );
            return Outcome::NoAutocomplete;
        };

        debug!(
            "[{}] Autocomplete '{}' option '{}'",
            ctx.request_id, ctx.command, option.name
        );

        let completed = AssertUnwindSafe(callback.complete(&ctx, &option))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error(panic)));

        let result = match completed {
            Ok(choices) => ctx.send_initial(InteractionResponse::autocomplete(choices)).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => Outcome::Completed,
            Err(error) => {
                let handled = self.autocomplete_errors.try_handle(&error, &ctx, &option).await;
                self.reporter
                    .on_autocomplete_error(&error, &ctx, &option, handled)
                    .await;
                Outcome::Failed { handled }
            }
        }
    }
}

/// Run hooks in order; the first `Exit` stops the rest
async fn run_hooks<'h>(
    hooks: impl Iterator<Item = &'h Arc<dyn Hook>>,
    ctx: &mut InteractionContext,
) -> anyhow::Result<HookResult> {
    for hook in hooks {
        let result = AssertUnwindSafe(hook.run(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error(panic)))?;
        if result == HookResult::Exit {
            return Ok(HookResult::Exit);
        }
    }
    Ok(HookResult::Continue)
}

fn panic_error(panic: Box<dyn Any + Send>) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("panicked: {message}")
}

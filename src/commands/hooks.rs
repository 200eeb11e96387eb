//! Hooks and error handlers
//!
//! Pre/post hooks wrap command execution; error handler chains and the
//! terminal [`ErrorReporter`] receive failures from the pipeline.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Typed `Catch` adapter for command error chains
//! - 1.0.0: Initial hook and error handler traits

use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use log::error;

use super::context::InteractionContext;
use super::interaction::InteractionOption;

/// Outcome of a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookResult {
    #[default]
    Continue,
    /// Stop here: skip the handler and every later hook. Not an error.
    Exit,
}

#[async_trait]
pub trait Hook: Send + Sync {
    async fn run(&self, ctx: &mut InteractionContext) -> anyhow::Result<HookResult>;
}

/// Member of the command error chain. Returns `true` to claim the error.
#[async_trait]
pub trait CommandErrorHandler: Send + Sync {
    async fn handle(&self, error: &anyhow::Error, ctx: &InteractionContext) -> bool;
}

/// Member of the autocomplete error chain. Returns `true` to claim the error.
#[async_trait]
pub trait AutocompleteErrorHandler: Send + Sync {
    async fn handle(
        &self,
        error: &anyhow::Error,
        ctx: &InteractionContext,
        option: &InteractionOption,
    ) -> bool;
}

/// Handler for one concrete error type, used through [`Catch`]
#[async_trait]
pub trait CatchCommandError<E>: Send + Sync {
    async fn on_error(&self, error: &E, ctx: &InteractionContext);
}

/// Claims errors that downcast to `E` and hands them to `H`
pub struct Catch<E, H> {
    handler: H,
    _error: PhantomData<fn() -> E>,
}

impl<E, H> Catch<E, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _error: PhantomData,
        }
    }
}

#[async_trait]
impl<E, H> CommandErrorHandler for Catch<E, H>
where
    E: Display + Debug + Send + Sync + 'static,
    H: CatchCommandError<E>,
{
    async fn handle(&self, error: &anyhow::Error, ctx: &InteractionContext) -> bool {
        match error.downcast_ref::<E>() {
            Some(typed) => {
                self.handler.on_error(typed, ctx).await;
                true
            }
            None => false,
        }
    }
}

/// Ordered error handler chain; the first handler to claim an error wins
pub struct ErrorHandlers<H: ?Sized> {
    handlers: Vec<Arc<H>>,
}

impl<H: ?Sized> ErrorHandlers<H> {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn push(&mut self, handler: Arc<H>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H: ?Sized> Default for ErrorHandlers<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandlers<dyn CommandErrorHandler> {
    pub async fn try_handle(&self, error: &anyhow::Error, ctx: &InteractionContext) -> bool {
        for handler in &self.handlers {
            if handler.handle(error, ctx).await {
                return true;
            }
        }
        false
    }
}

impl ErrorHandlers<dyn AutocompleteErrorHandler> {
    pub async fn try_handle(
        &self,
        error: &anyhow::Error,
        ctx: &InteractionContext,
        option: &InteractionOption,
    ) -> bool {
        for handler in &self.handlers {
            if handler.handle(error, ctx, option).await {
                return true;
            }
        }
        false
    }
}

/// Terminal error callbacks, fired exactly once per failing interaction
/// after the handler chain ran, whether or not the chain claimed the error.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn on_command_error(&self, error: &anyhow::Error, ctx: &InteractionContext, handled: bool) {
        if !handled {
            error!(
                "[{}] Unhandled error in command '{}': {:#}",
                ctx.request_id, ctx.command, error
            );
        }
    }

    async fn on_autocomplete_error(
        &self,
        error: &anyhow::Error,
        ctx: &InteractionContext,
        option: &InteractionOption,
        handled: bool,
    ) {
        if !handled {
            error!(
                "[{}] Unhandled error in autocomplete for '{}' option '{}': {:#}",
                ctx.request_id, ctx.command, option.name, error
            );
        }
    }
}

/// Reporter that only logs unhandled errors
pub struct LogReporter;

impl ErrorReporter for LogReporter {}

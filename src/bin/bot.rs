use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::Interaction as GatewayInteraction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serde_json::Value;

use cmdgate::commands::{
    AutocompleteCallback, AutocompleteChoice, CommandBuilder, CommandCallback, CommandOption,
    Group, Hook, HookResult, InteractionContext, InteractionOption, OptionType, Plugin,
    ResponseMessage,
};
use cmdgate::transport::discord::convert_interaction;
use cmdgate::{Client as CommandClient, Config, SerenityTransport};

const GREETINGS: &[&str] = &["Ada", "Grace", "Linus", "Margaret", "Barbara", "Ken"];

struct Ping;

#[async_trait]
impl CommandCallback for Ping {
    async fn call(&self, ctx: &mut InteractionContext) -> Result<()> {
        ctx.respond(ResponseMessage::content("Pong!").ephemeral(true)).await
    }
}

struct Greet;

#[async_trait]
impl CommandCallback for Greet {
    async fn call(&self, ctx: &mut InteractionContext) -> Result<()> {
        let name = ctx
            .option("name")
            .and_then(|value| value.as_str())
            .unwrap_or("stranger")
            .to_string();
        ctx.respond(ResponseMessage::content(format!("Hello, {name}!"))).await
    }
}

struct GreetNames;

#[async_trait]
impl AutocompleteCallback for GreetNames {
    async fn complete(
        &self,
        _ctx: &InteractionContext,
        option: &InteractionOption,
    ) -> Result<Vec<AutocompleteChoice>> {
        let typed = option
            .value
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        Ok(GREETINGS
            .iter()
            .filter(|name| name.to_lowercase().starts_with(&typed))
            .map(|name| AutocompleteChoice::new(*name, *name))
            .collect())
    }
}

struct Quote;

#[async_trait]
impl CommandCallback for Quote {
    async fn call(&self, ctx: &mut InteractionContext) -> Result<()> {
        let content = ctx
            .option("message")
            .and_then(|value| value.object())
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let reply = if content.is_empty() {
            ResponseMessage::content("That message has no text to quote.").ephemeral(true)
        } else {
            ResponseMessage::content(format!("> {content}"))
        };
        ctx.respond(reply).await
    }
}

/// Stops commands used outside a guild
struct GuildOnly;

#[async_trait]
impl Hook for GuildOnly {
    async fn run(&self, ctx: &mut InteractionContext) -> Result<HookResult> {
        if ctx.guild_id.is_some() {
            return Ok(HookResult::Continue);
        }
        ctx.respond(ResponseMessage::content("This command only works in a server.").ephemeral(true))
            .await?;
        Ok(HookResult::Exit)
    }
}

fn demo_plugins() -> Result<Vec<Plugin>> {
    let mut utility = Plugin::new("utility");
    utility.command(CommandBuilder::chat_input(Ping).description("Check that the bot is alive"))?;
    utility.command(CommandBuilder::message(Quote).name("Quote"))?;

    let social = Group::new("social").hook(GuildOnly);
    let mut greetings = Plugin::new("social");
    greetings.command(
        social
            .command(Greet)
            .description("Greet someone")
            .option(CommandOption::new(OptionType::String, "name", "Who to greet").required(true))
            .autocomplete("name", GreetNames),
    )?;

    Ok(vec![utility, greetings])
}

struct Handler {
    commands: Arc<CommandClient>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected and ready!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());

        let guilds = ready.guilds.iter().map(|guild| guild.id).collect();
        match self.commands.init(ready.application.id, guilds).await {
            Ok(Some(report)) => info!(
                "Commands synchronized: {} deleted, {} created",
                report.deleted.len(),
                report.created.len()
            ),
            Ok(None) => info!("Command synchronization disabled (UPDATE_COMMANDS=false)"),
            Err(e) => error!("Failed to synchronize commands: {e:#}"),
        }
    }

    async fn interaction_create(&self, _ctx: Context, interaction: GatewayInteraction) {
        let interaction = match convert_interaction(&interaction) {
            Ok(Some(interaction)) => interaction,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not decode interaction payload: {e:#}");
                return;
            }
        };

        let name = interaction.data.name.clone();
        match self.commands.handle_interaction(interaction, None).await {
            Ok(outcome) => debug!("Interaction '{name}' finished: {outcome:?}"),
            Err(e) => error!("Error handling interaction '{name}': {e}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::from_env()?,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting command gateway demo bot...");

    if config.discord_token.is_empty() {
        return Err(anyhow::anyhow!("DISCORD_TOKEN is not set"));
    }

    let http = Arc::new(Http::new(&config.discord_token));
    let transport = Arc::new(SerenityTransport::new(Arc::clone(&http)));
    let intents = GatewayIntents::GUILDS;
    let token = config.discord_token.clone();

    let commands = CommandClient::new(config, transport);
    for plugin in demo_plugins()? {
        commands.add_plugin(plugin);
    }

    let handler = Handler {
        commands: Arc::new(commands),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
        return Err(anyhow::anyhow!("Client error: {}", why));
    }

    Ok(())
}

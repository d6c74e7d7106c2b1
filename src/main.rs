//! # Main Entry Point
//!
//! Bootstraps the bot: configuration, logging, plugin loading, then the
//! event loop over the chat transport.
//!
//! - Domain: configuration and transport traits
//! - Infrastructure: plugin loader, console transport
//! - Application: router, help renderer, event loop

mod application;
mod domain;
mod infrastructure;
mod strings;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use minibot_api::BotContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::application::event_loop::EventLoop;
use crate::application::router::CommandRouter;
use crate::domain::config::AppConfig;
use crate::infrastructure::console::ConsoleTransport;
use crate::infrastructure::loader::{DynamicLibrarySource, PluginLoader};

#[derive(Parser)]
#[command(name = "minibot", about = "A micro chat-bot with pluggable commands", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Chat service auth token.
    #[arg(long, env = "MINIBOT_TOKEN")]
    token: Option<String>,
    /// Directory scanned for plugin artifacts.
    #[arg(long, env = "MINIBOT_PLUGIN_DIR")]
    plugin_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration: file first, then flag/env overrides
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(token) = cli.token {
        config.bot.token = token;
    }
    if let Some(dir) = cli.plugin_dir {
        config.plugins.dir = dir;
    }

    // 2. Logging: stderr always, plus an optional file sink. Replies are
    // printed to stdout by the console transport, so logs stay on stderr.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let (file_layer, _guard) = match &config.log_file {
        Some(log_file) => {
            let path = Path::new(log_file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file = path
                .file_name()
                .map(|name| name.to_owned())
                .unwrap_or_else(|| "minibot.log".into());
            let appender = tracing_appender::rolling::never(dir, file);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("starting minibot");

    // 3. Load plugins and build the registry
    let ctx = BotContext::new();
    let loader = PluginLoader::new(Box::new(DynamicLibrarySource), &config.plugins.disabled);
    let loaded = loader
        .load_dir(&config.plugins.dir, &ctx)
        .context("loading plugins")?;
    tracing::info!(
        plugins = loaded.plugins.len(),
        commands = loaded.commands.len(),
        "command registry built"
    );

    let commands = Arc::new(loaded.commands);
    ctx.publish_commands(Arc::clone(&commands));
    // Module handles stay alive so registry entries remain valid.
    let _plugins = loaded.plugins;

    // 4. Event loop
    let router = CommandRouter::new(
        commands,
        ctx,
        Duration::from_secs(config.plugins.command_timeout_secs),
    );
    let transport = ConsoleTransport::new(&config.bot.user_id);
    EventLoop::new(transport, router, config.bot.user_id.clone())
        .run()
        .await
}

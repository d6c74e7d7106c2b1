//! # Echo Plugin
//!
//! The smallest useful plugin: one command that replies with its argument
//! text unchanged. Handy as a smoke test for the dispatch path.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use minibot_api::{BotContext, Command, CommandMap, Invocation, PluginModule, Reply, export_plugin};

struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }
    fn usage(&self) -> String {
        "Usage: echo <text>".to_string()
    }
    fn short_desc(&self) -> String {
        "repeats <text> back".to_string()
    }
    fn long_desc(&self) -> String {
        self.short_desc()
    }

    async fn exec(&self, _ctx: &BotContext, inv: Invocation<'_>) -> Result<Vec<Reply>> {
        tracing::debug!(args = inv.args, "running echo");
        Ok(vec![Reply::text(inv.args)])
    }
}

struct EchoPlugin;

impl PluginModule for EchoPlugin {
    fn init(&self, _ctx: &BotContext) -> Result<()> {
        tracing::info!("echo plugin loaded");
        Ok(())
    }

    fn registry(&self) -> CommandMap {
        let mut commands = CommandMap::new();
        commands.insert("echo".to_string(), Arc::new(EchoCommand) as Arc<dyn Command>);
        commands
    }
}

export_plugin!(EchoPlugin);

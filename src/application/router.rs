//! # Command Router
//!
//! Parses an addressed message line into a command invocation, looks the
//! name up in the registry and runs the handler. The router is purely a
//! router: handler errors pass through untouched. Every handler runs
//! under a deadline and an unwind guard so one bad plugin can neither
//! stall nor crash the bot.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use minibot_api::{
    BotContext, CommandMap, InboundEvent, Invocation, Reply, SenderInfo, mention_prefix,
};
use thiserror::Error;

use crate::application::help;
use crate::strings::messages;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unable to parse command line: {0:?}")]
    UnparsableLine(String),
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("command `{name}` failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("command `{name}` timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("command `{name}` panicked")]
    Panicked { name: String },
}

impl DispatchError {
    /// The short reply sent to the conversation. The detailed error goes
    /// to the log, never to the chat.
    pub fn user_reply(&self) -> String {
        match self {
            Self::UnparsableLine(_) => messages::UNPARSABLE_LINE.to_string(),
            Self::CommandNotFound(name) => messages::command_not_found(name),
            Self::Handler { name, .. } | Self::Timeout { name, .. } | Self::Panicked { name } => {
                messages::command_failed(name)
            }
        }
    }
}

pub struct CommandRouter {
    commands: Arc<CommandMap>,
    ctx: BotContext,
    timeout: Duration,
}

impl CommandRouter {
    pub fn new(commands: Arc<CommandMap>, ctx: BotContext, timeout: Duration) -> Self {
        Self {
            commands,
            ctx,
            timeout,
        }
    }

    /// Route one addressed message to its handler and return the replies.
    ///
    /// The mention prefix is stripped and the first whitespace token,
    /// lowercased, selects the command. The residual text is handed to the
    /// handler unmodified. An empty line or a leading `help` token goes to
    /// the help renderer instead of the registry.
    pub async fn dispatch(
        &self,
        event: &InboundEvent,
        sender: &SenderInfo,
    ) -> Result<Vec<Reply>, DispatchError> {
        let prefix = mention_prefix(&sender.bot_user_id);
        let line = event.text.strip_prefix(&prefix).unwrap_or(&event.text).trim();

        if line.is_empty() {
            return Ok(vec![Reply::text(help::render_list(&self.commands))]);
        }
        let Some(first) = line.split_whitespace().next() else {
            return Err(DispatchError::UnparsableLine(line.to_string()));
        };
        let name = first.to_lowercase();
        let args = line[first.len()..].trim_start();

        if name == "help" {
            let topic = args.trim().to_lowercase();
            let text = if topic.is_empty() {
                help::render_list(&self.commands)
            } else {
                help::render_detail(&self.commands, &topic)
            };
            return Ok(vec![Reply::text(text)]);
        }

        let Some(command) = self.commands.get(&name) else {
            return Err(DispatchError::CommandNotFound(name));
        };

        tracing::info!(command = %name, sender = %sender.user_id, "dispatching");
        let invocation = Invocation {
            event,
            sender,
            args,
        };
        let exec = AssertUnwindSafe(command.exec(&self.ctx, invocation)).catch_unwind();
        match tokio::time::timeout(self.timeout, exec).await {
            Err(_) => Err(DispatchError::Timeout {
                name,
                timeout: self.timeout,
            }),
            Ok(Err(_)) => Err(DispatchError::Panicked { name }),
            Ok(Ok(result)) => result.map_err(|source| DispatchError::Handler { name, source }),
        }
    }
}

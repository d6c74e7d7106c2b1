//! # Plugin Contract
//!
//! The shared surface between the minibot host and its command plugins:
//! the `Command` and `PluginModule` traits, the data types that flow
//! through a dispatch, and the exported-symbol declaration every plugin
//! artifact must carry.
//!
//! Plugins are built as cdylibs against this crate and export one
//! [`PluginDeclaration`] via [`export_plugin!`]. The host refuses any
//! artifact whose [`API_VERSION`] does not match its own.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;

/// Version stamp compiled into both host and plugins. A mismatch is a
/// load-time contract violation, not a runtime error.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the static every plugin artifact must export.
pub const DECLARATION_SYMBOL: &[u8] = b"MINIBOT_DECLARATION";

/// The merged name-to-command mapping. A `BTreeMap` keeps iteration order
/// lexicographic by name, which makes help output deterministic.
pub type CommandMap = BTreeMap<String, Arc<dyn Command>>;

/// An inbound chat message, consumed exactly once by the event loop.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Id of the user who sent the message.
    pub sender: String,
    /// Conversation the message arrived on; replies go back here.
    pub channel: String,
    /// Raw message text, mention prefix included.
    pub text: String,
}

/// Identities relevant to one dispatch.
#[derive(Debug, Clone)]
pub struct SenderInfo {
    pub user_id: String,
    pub bot_user_id: String,
}

/// Transport-specific delivery options for a reply.
#[derive(Debug, Clone, Default)]
pub struct ReplyOptions {
    pub markdown: bool,
    pub thread: Option<String>,
}

/// One outbound reply unit. A single command execution may legitimately
/// produce zero, one or many of these; each is sent as an independent
/// message to the originating conversation.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub options: ReplyOptions,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: ReplyOptions::default(),
        }
    }
}

/// Everything a command handler gets to see about one invocation.
pub struct Invocation<'a> {
    pub event: &'a InboundEvent,
    pub sender: &'a SenderInfo,
    /// Residual argument text after the command name, original case and
    /// spacing preserved. Further parsing is the handler's job.
    pub args: &'a str,
}

/// Process-scoped context threaded through `init` and `exec`. Cheap to
/// clone; all clones observe the same registry once it is published.
#[derive(Clone, Default)]
pub struct BotContext {
    commands: Arc<OnceLock<Arc<CommandMap>>>,
}

impl BotContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The merged registry, for plugins that need to enumerate sibling
    /// commands. `None` while the load phase is still running.
    pub fn commands(&self) -> Option<Arc<CommandMap>> {
        self.commands.get().cloned()
    }

    /// Publish the merged registry. Called once by the host after the load
    /// phase; later calls are ignored.
    pub fn publish_commands(&self, commands: Arc<CommandMap>) {
        let _ = self.commands.set(commands);
    }
}

/// A named, user-invocable action with help metadata.
#[async_trait]
pub trait Command: Send + Sync {
    /// Registry key. Must match the key the owning module registers.
    fn name(&self) -> &str;
    /// One-line synopsis, e.g. `Usage: leet <text>`.
    fn usage(&self) -> String;
    fn short_desc(&self) -> String;
    fn long_desc(&self) -> String;

    /// Run the command. Errors are propagated to the event loop untouched;
    /// a handler that wants partial results delivered despite a failure
    /// should return `Ok` with an error reply appended instead.
    async fn exec(&self, ctx: &BotContext, inv: Invocation<'_>) -> Result<Vec<Reply>>;
}

/// One plugin module: one-time setup plus the commands it provides.
pub trait PluginModule: Send + Sync {
    /// Validate prerequisites (environment, reachable services) and build
    /// anything the commands need. Failing here skips the whole plugin.
    fn init(&self, ctx: &BotContext) -> Result<()>;

    /// Every command this module provides, keyed by [`Command::name`].
    fn registry(&self) -> CommandMap;
}

/// The value exported under [`DECLARATION_SYMBOL`] by every plugin cdylib.
#[derive(Clone, Copy)]
pub struct PluginDeclaration {
    pub api_version: &'static str,
    pub register: fn() -> Box<dyn PluginModule>,
}

/// Emit the exported declaration for a plugin crate.
///
/// ```ignore
/// export_plugin!(MyPlugin);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($module:expr) => {
        #[unsafe(no_mangle)]
        pub static MINIBOT_DECLARATION: $crate::PluginDeclaration = $crate::PluginDeclaration {
            api_version: $crate::API_VERSION,
            register: || ::std::boxed::Box::new($module),
        };
    };
}

/// The literal mention prefix a message must start with to be treated as a
/// command. Stripped before parsing.
pub fn mention_prefix(bot_user_id: &str) -> String {
    format!("<@{bot_user_id}> ")
}

/// Read an environment variable with a fallback. An unset variable with an
/// empty fallback is an error telling the operator what to set.
pub fn get_env(key: &str, fallback: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) => Ok(value),
        Err(_) if fallback.is_empty() => {
            anyhow::bail!("to use this plugin, set the {key} environment variable")
        }
        Err(_) => Ok(fallback.to_string()),
    }
}

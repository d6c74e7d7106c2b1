//! # Leet Plugin
//!
//! Toy text-transform commands: `leet` and `morse`. Initialization is
//! gated on the `MINIBOT_ENABLE_LEET` environment variable, which makes
//! this plugin the reference for "fail loudly on missing prerequisites".

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use minibot_api::{
    BotContext, Command, CommandMap, Invocation, PluginModule, Reply, export_plugin, get_env,
};

const ENABLE_VAR: &str = "MINIBOT_ENABLE_LEET";

fn to_leet(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_ascii_lowercase() {
            'a' => '4',
            'b' => '8',
            'e' => '3',
            'l' => '1',
            'o' => '0',
            's' => '5',
            't' => '7',
            _ => c,
        })
        .collect()
}

fn morse_char(c: char) -> Option<&'static str> {
    let code = match c {
        'a' => ".-",
        'b' => "-...",
        'c' => "-.-.",
        'd' => "-..",
        'e' => ".",
        'f' => "..-.",
        'g' => "--.",
        'h' => "....",
        'i' => "..",
        'j' => ".---",
        'k' => "-.-",
        'l' => ".-..",
        'm' => "--",
        'n' => "-.",
        'o' => "---",
        'p' => ".--.",
        'q' => "--.-",
        'r' => ".-.",
        's' => "...",
        't' => "-",
        'u' => "..-",
        'v' => "...-",
        'w' => ".--",
        'x' => "-..-",
        'y' => "-.--",
        'z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        ' ' => "/",
        _ => return None,
    };
    Some(code)
}

/// `None` when the text contains a character with no morse encoding.
fn to_morse(text: &str) -> Option<String> {
    text.to_lowercase()
        .chars()
        .map(morse_char)
        .collect::<Option<Vec<_>>>()
        .map(|codes| codes.join(" "))
}

struct LeetCommand;

#[async_trait]
impl Command for LeetCommand {
    fn name(&self) -> &str {
        "leet"
    }
    fn usage(&self) -> String {
        "Usage: leet <text>".to_string()
    }
    fn short_desc(&self) -> String {
        "prints leet of <text>".to_string()
    }
    fn long_desc(&self) -> String {
        self.short_desc()
    }

    async fn exec(&self, _ctx: &BotContext, inv: Invocation<'_>) -> Result<Vec<Reply>> {
        tracing::debug!(args = inv.args, "running leet");
        Ok(vec![Reply::text(to_leet(inv.args))])
    }
}

struct MorseCommand;

#[async_trait]
impl Command for MorseCommand {
    fn name(&self) -> &str {
        "morse"
    }
    fn usage(&self) -> String {
        "Usage: morse <text>".to_string()
    }
    fn short_desc(&self) -> String {
        "prints morse code from <text>".to_string()
    }
    fn long_desc(&self) -> String {
        self.short_desc()
    }

    async fn exec(&self, _ctx: &BotContext, inv: Invocation<'_>) -> Result<Vec<Reply>> {
        tracing::debug!(args = inv.args, "running morse");
        // An untranslatable character is reported as a reply, not an error.
        let reply = match to_morse(inv.args) {
            Some(morse) => Reply::text(morse),
            None => Reply::text("Unable to morse code"),
        };
        Ok(vec![reply])
    }
}

struct LeetPlugin;

impl PluginModule for LeetPlugin {
    fn init(&self, _ctx: &BotContext) -> Result<()> {
        get_env(ENABLE_VAR, "")?;
        tracing::info!("leet plugin loaded");
        Ok(())
    }

    fn registry(&self) -> CommandMap {
        let mut commands = CommandMap::new();
        commands.insert("leet".to_string(), Arc::new(LeetCommand) as Arc<dyn Command>);
        commands.insert("morse".to_string(), Arc::new(MorseCommand) as Arc<dyn Command>);
        commands
    }
}

export_plugin!(LeetPlugin);

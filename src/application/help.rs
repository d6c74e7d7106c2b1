//! # Help Renderer
//!
//! Renders the command list and per-command help views from the registry.
//! Ordering is stable: the registry is a `BTreeMap` keyed by command name.

use minibot_api::CommandMap;

use crate::strings::messages;

/// List form: one name/short-description line per command, plus a hint on
/// how to get per-command help.
pub fn render_list(commands: &CommandMap) -> String {
    let mut out = String::from("Available commands:\n");
    for (name, command) in commands {
        out.push_str(&format!("`{name}`: {}\n", command.short_desc()));
    }
    out.push_str("Use `help <command>` for help on each command");
    out
}

/// Detail form: name, usage line and long description. An unknown name is
/// a plain "not found" reply, not an error.
pub fn render_detail(commands: &CommandMap, name: &str) -> String {
    match commands.get(name) {
        Some(command) => format!(
            "Command: `{}`\n{}\n{}",
            command.name(),
            command.usage(),
            command.long_desc()
        ),
        None => messages::COMMAND_NOT_FOUND.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use minibot_api::{BotContext, Command, Invocation, Reply};

    struct StaticCommand {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Command for StaticCommand {
        fn name(&self) -> &str {
            self.name
        }
        fn usage(&self) -> String {
            format!("Usage: {} <text>", self.name)
        }
        fn short_desc(&self) -> String {
            format!("short for {}", self.name)
        }
        fn long_desc(&self) -> String {
            format!("long for {}", self.name)
        }
        async fn exec(
            &self,
            _ctx: &BotContext,
            _inv: Invocation<'_>,
        ) -> anyhow::Result<Vec<Reply>> {
            Ok(Vec::new())
        }
    }

    fn registry(names: &[&'static str]) -> CommandMap {
        names
            .iter()
            .copied()
            .map(|name| {
                (
                    name.to_string(),
                    Arc::new(StaticCommand { name }) as Arc<dyn Command>,
                )
            })
            .collect()
    }

    #[test]
    fn test_list_is_sorted_and_stable() {
        let commands = registry(&["zulu", "alpha", "mike"]);
        let first = render_list(&commands);
        let alpha = first.find("`alpha`").unwrap();
        let mike = first.find("`mike`").unwrap();
        let zulu = first.find("`zulu`").unwrap();
        assert!(alpha < mike && mike < zulu);
        assert!(first.ends_with("Use `help <command>` for help on each command"));
        assert_eq!(first, render_list(&commands));
    }

    #[test]
    fn test_detail_known_command() {
        let commands = registry(&["leet"]);
        let detail = render_detail(&commands, "leet");
        assert!(detail.contains("Command: `leet`"));
        assert!(detail.contains("Usage: leet <text>"));
        assert!(detail.contains("long for leet"));
    }

    #[test]
    fn test_detail_unknown_command_is_plain_message() {
        let commands = registry(&["leet"]);
        assert_eq!(render_detail(&commands, "nope"), "Command not found");
    }
}

//! # Messages
//!
//! User-facing reply strings. Detailed diagnostics go to the log; these
//! are the short lines the bot says in the conversation.

pub const COMMAND_NOT_FOUND: &str = "Command not found";
pub const UNPARSABLE_LINE: &str = "I could not parse that command line.";

pub fn command_not_found(name: &str) -> String {
    format!("Command not found: `{name}`")
}

pub fn command_failed(name: &str) -> String {
    format!("Something went wrong running `{name}`.")
}

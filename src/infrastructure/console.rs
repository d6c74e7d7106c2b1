//! # Console Transport
//!
//! Development transport: reads lines from stdin and prints replies to
//! stdout. Every typed line is implicitly addressed to the bot, so
//! `leet hi` at the console behaves like `<@minibot> leet hi` in a room.

use anyhow::Result;
use async_trait::async_trait;
use minibot_api::{InboundEvent, Reply, mention_prefix};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::domain::traits::{ChatTransport, TransportEvent};

const CONSOLE_CHANNEL: &str = "console";
const CONSOLE_USER: &str = "operator";

pub struct ConsoleTransport {
    lines: Lines<BufReader<Stdin>>,
    prefix: String,
    announced: bool,
}

impl ConsoleTransport {
    pub fn new(bot_user_id: &str) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            prefix: mention_prefix(bot_user_id),
            announced: false,
        }
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn next_event(&mut self) -> TransportEvent {
        if !self.announced {
            self.announced = true;
            return TransportEvent::Connected;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => TransportEvent::Message(InboundEvent {
                sender: CONSOLE_USER.to_string(),
                channel: CONSOLE_CHANNEL.to_string(),
                text: format!("{}{line}", self.prefix),
            }),
            Ok(None) => TransportEvent::TransportError("stdin closed".to_string()),
            Err(err) => TransportEvent::TransportError(err.to_string()),
        }
    }

    async fn send_message(&self, _channel: &str, reply: &Reply) -> Result<()> {
        println!("{}", reply.text);
        Ok(())
    }
}

//! # Domain Traits
//!
//! Abstract interface for the chat transport, plus the event variants it
//! can deliver. Allows pluggable backends (a chat service connection, the
//! console, test fakes) behind one seam.

use anyhow::Result;
use async_trait::async_trait;
use minibot_api::{InboundEvent, Reply};

/// Everything the transport can hand the event loop. The loop matches
/// exhaustively, so a new variant forces an explicit decision at the
/// match site instead of falling into a silent catch-all.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection to the chat service established.
    Connected,
    /// An inbound chat message.
    Message(InboundEvent),
    /// Unrecoverable transport-level failure. Terminal.
    TransportError(String),
    /// The chat service rejected our credentials. Terminal.
    InvalidAuth,
    /// Any event kind the bot deliberately takes no action on, by name.
    Other(String),
}

/// Abstract interface for a chat transport (e.g. Slack, Matrix, console).
#[async_trait]
pub trait ChatTransport: Send {
    /// Pull the next event off the inbound stream.
    async fn next_event(&mut self) -> TransportEvent;

    /// Send one reply to a conversation.
    async fn send_message(&self, channel: &str, reply: &Reply) -> Result<()>;
}

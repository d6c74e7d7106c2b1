//! # Event Loop
//!
//! Consumes the transport's inbound stream strictly in arrival order,
//! filters for messages addressed to the bot and fans handler replies back
//! out to the originating conversation. Transport-fatal events and ctrl-c
//! are the only ways out.

use anyhow::{Result, anyhow};
use minibot_api::{InboundEvent, Reply, SenderInfo, mention_prefix};

use crate::application::router::CommandRouter;
use crate::domain::traits::{ChatTransport, TransportEvent};

pub struct EventLoop<T: ChatTransport> {
    transport: T,
    router: CommandRouter,
    bot_user_id: String,
}

impl<T: ChatTransport> EventLoop<T> {
    pub fn new(transport: T, router: CommandRouter, bot_user_id: String) -> Self {
        Self {
            transport,
            router,
            bot_user_id,
        }
    }

    /// Run until the transport fails, authentication is rejected, or
    /// ctrl-c. Dispatch failures are logged and answered in-channel; they
    /// never stop the loop.
    pub async fn run(mut self) -> Result<()> {
        let prefix = mention_prefix(&self.bot_user_id);
        loop {
            let event = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                event = self.transport.next_event() => event,
            };
            match event {
                TransportEvent::Connected => tracing::info!("transport connected"),
                TransportEvent::Message(message) => self.handle_message(&prefix, message).await,
                TransportEvent::TransportError(reason) => {
                    return Err(anyhow!("transport failed: {reason}"));
                }
                TransportEvent::InvalidAuth => {
                    return Err(anyhow!("chat service rejected credentials"));
                }
                TransportEvent::Other(kind) => tracing::debug!(kind = %kind, "ignoring event"),
            }
        }
    }

    async fn handle_message(&self, prefix: &str, message: InboundEvent) {
        // Never answer ourselves, and only act on addressed messages.
        if message.sender == self.bot_user_id {
            return;
        }
        if !message.text.starts_with(prefix) {
            return;
        }
        let sender = SenderInfo {
            user_id: message.sender.clone(),
            bot_user_id: self.bot_user_id.clone(),
        };
        match self.router.dispatch(&message, &sender).await {
            Ok(replies) => {
                for reply in replies {
                    self.send(&message.channel, &reply).await;
                }
            }
            Err(err) => {
                tracing::error!(%err, "dispatch failed");
                self.send(&message.channel, &Reply::text(err.user_reply())).await;
            }
        }
    }

    async fn send(&self, channel: &str, reply: &Reply) {
        if let Err(err) = self.transport.send_message(channel, reply).await {
            tracing::error!(channel = %channel, %err, "failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use minibot_api::{BotContext, Command, CommandMap, Invocation};

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
        async fn exec(
            &self,
            _ctx: &BotContext,
            inv: Invocation<'_>,
        ) -> anyhow::Result<Vec<Reply>> {
            Ok(vec![Reply::text(inv.args), Reply::text("done")])
        }
    }

    struct FakeTransport {
        events: VecDeque<TransportEvent>,
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn next_event(&mut self) -> TransportEvent {
            self.events
                .pop_front()
                .unwrap_or_else(|| TransportEvent::TransportError("script ended".to_string()))
        }

        async fn send_message(&self, channel: &str, reply: &Reply) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), reply.text.clone()));
            Ok(())
        }
    }

    fn message(sender: &str, channel: &str, text: &str) -> TransportEvent {
        TransportEvent::Message(InboundEvent {
            sender: sender.to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
        })
    }

    fn event_loop(
        events: Vec<TransportEvent>,
    ) -> (EventLoop<FakeTransport>, Arc<Mutex<Vec<(String, String)>>>) {
        let mut commands = CommandMap::new();
        commands.insert("echo".to_string(), Arc::new(EchoCommand) as _);
        let commands = Arc::new(commands);
        let ctx = BotContext::new();
        ctx.publish_commands(Arc::clone(&commands));
        let router = CommandRouter::new(commands, ctx, Duration::from_secs(1));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = FakeTransport {
            events: events.into(),
            sent: Arc::clone(&sent),
        };
        (EventLoop::new(transport, router, "U1".to_string()), sent)
    }

    #[tokio::test]
    async fn test_replies_fan_out_to_origin_channel() {
        let (event_loop, sent) = event_loop(vec![
            TransportEvent::Connected,
            message("U7", "C9", "<@U1> echo hi"),
        ]);
        assert!(event_loop.run().await.is_err()); // script end is terminal
        let sent = sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![
                ("C9".to_string(), "hi".to_string()),
                ("C9".to_string(), "done".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_own_messages_ignored_even_if_addressed() {
        let (event_loop, sent) = event_loop(vec![message("U1", "C9", "<@U1> echo hi")]);
        let _ = event_loop.run().await;
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unaddressed_messages_ignored() {
        let (event_loop, sent) = event_loop(vec![
            message("U7", "C9", "echo hi"),
            message("U7", "C9", "<@U2> echo hi"),
        ]);
        let _ = event_loop.run().await;
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_error_replies_and_loop_continues() {
        let (event_loop, sent) = event_loop(vec![
            message("U7", "C9", "<@U1> missing"),
            message("U7", "C9", "<@U1> echo still alive"),
        ]);
        let _ = event_loop.run().await;
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0], ("C9".to_string(), "Command not found: `missing`".to_string()));
        assert_eq!(sent[1], ("C9".to_string(), "still alive".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_auth_is_terminal() {
        let (event_loop, sent) = event_loop(vec![
            TransportEvent::InvalidAuth,
            message("U7", "C9", "<@U1> echo never"),
        ]);
        let err = event_loop.run().await.unwrap_err();
        assert!(err.to_string().contains("credentials"));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_events_are_ignored() {
        let (event_loop, sent) = event_loop(vec![
            TransportEvent::Other("user_typing".to_string()),
            message("U7", "C9", "<@U1> echo ok"),
        ]);
        let _ = event_loop.run().await;
        assert_eq!(sent.lock().unwrap()[0].1, "ok");
    }
}

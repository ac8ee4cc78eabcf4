//! Inbound message sources for the agent loop.
//!
//! The wire transport is outside this workspace; whatever connection layer a
//! plugin uses decodes each message into an [`InboundMessage`] and hands it
//! to the loop through a [`MessageSource`].

use async_trait::async_trait;
use tokio::sync::mpsc;

use alerthub_agentlib::callback::{CommandCall, CommandCode};

/// One decoded procedure-call message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Command code selecting the handlers to run.
    pub code: CommandCode,
    /// Argument bundle passed through to every handler.
    pub call: CommandCall,
}

impl InboundMessage {
    /// Create a message.
    pub fn new(code: CommandCode, call: CommandCall) -> Self {
        Self { code, call }
    }
}

/// Source of decoded messages for the loop.
///
/// The loop pulls one message at a time and fully processes it before
/// pulling the next.
#[async_trait]
pub trait MessageSource: Send {
    /// Receive the next decoded message; `None` once the transport closed.
    async fn next_message(&mut self) -> Option<InboundMessage>;
}

/// Channel-backed [`MessageSource`].
///
/// Bridges a transport task (or the poll timer) into the loop: the producer
/// half is a plain `mpsc::Sender`, and dropping every sender ends the loop
/// cleanly.
pub struct ChannelSource {
    rx: mpsc::Receiver<InboundMessage>,
}

impl ChannelSource {
    /// Create a bounded channel and its source half.
    pub fn new(capacity: usize) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelSource::new(4);

        tx.send(InboundMessage::new(CommandCode(1), CommandCall::new()))
            .await
            .unwrap();
        tx.send(InboundMessage::new(CommandCode(2), CommandCall::new()))
            .await
            .unwrap();

        assert_eq!(source.next_message().await.unwrap().code, CommandCode(1));
        assert_eq!(source.next_message().await.unwrap().code, CommandCode(2));
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::new(4);
        drop(tx);
        assert!(source.next_message().await.is_none());
    }
}

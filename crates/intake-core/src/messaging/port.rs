use async_trait::async_trait;

use crate::{
    domain::{MessageRef, Recipient},
    Result,
};

/// Outbound side of a messenger.
///
/// Receiving is owned by the adapter's update loop; the core only ever sends.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send text rendered with the messenger's Markdown mode.
    async fn send_markdown(&self, to: &Recipient, text: &str) -> Result<MessageRef>;

    /// Send text verbatim, without any parse mode.
    async fn send_text(&self, to: &Recipient, text: &str) -> Result<MessageRef>;
}

//! Channel-side contract used by the panel reconciler.

use async_trait::async_trait;

use crate::errors::ChatPlatformError;
use crate::panel::PanelDefinition;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The parts of a channel message the reconciler inspects.
pub struct ChannelMessage {
    pub id: String,
    pub author_id: String,
    /// Title of the first embed, if the message has one.
    pub embed_title: Option<String>,
}

#[async_trait]
pub trait PanelChannels: Send + Sync {
    /// Fails with `ChannelUnavailable` unless the channel exists and accepts
    /// text messages.
    async fn ensure_postable(&self, channel_id: &str) -> Result<(), ChatPlatformError>;

    /// Most recent messages first, at most `limit`.
    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, ChatPlatformError>;

    /// Sends the panel and returns the new message id.
    async fn send_panel(&self, panel: &PanelDefinition) -> Result<String, ChatPlatformError>;

    async fn edit_panel(
        &self,
        panel: &PanelDefinition,
        message_id: &str,
    ) -> Result<(), ChatPlatformError>;
}

//! `PanelChannels` backed by the Discord REST API.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateMessage, EditMessage, GetMessages, Http, MessageId,
};
use tracing::debug;
use warden_core::{ChannelMessage, ChatPlatformError, PanelChannels, PanelDefinition};

use crate::discord_render::{panel_embed, panel_rows};

/// Public struct `SerenityPanelChannels` used by the panel reconciler at startup.
#[derive(Clone)]
pub struct SerenityPanelChannels {
    http: Arc<Http>,
}

impl SerenityPanelChannels {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

pub(crate) fn parse_snowflake(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value != 0)
}

fn channel_id(raw: &str) -> Result<ChannelId, ChatPlatformError> {
    parse_snowflake(raw)
        .map(ChannelId::new)
        .ok_or_else(|| ChatPlatformError::ChannelUnavailable {
            channel_id: raw.to_string(),
            reason: "not a valid channel id".to_string(),
        })
}

pub(crate) fn http_status(error: &serenity::Error) -> Option<u16> {
    match error {
        serenity::Error::Http(http_error) => http_error.status_code().map(|status| status.as_u16()),
        _ => None,
    }
}

pub(crate) fn channel_error_from_status(
    channel_id: &str,
    status: Option<u16>,
    detail: String,
) -> ChatPlatformError {
    match status {
        Some(403) => ChatPlatformError::PermissionDenied {
            channel_id: channel_id.to_string(),
            reason: detail,
        },
        Some(404) => ChatPlatformError::ChannelUnavailable {
            channel_id: channel_id.to_string(),
            reason: detail,
        },
        _ => ChatPlatformError::Transport(detail),
    }
}

fn map_channel_error(channel_id: &str, error: serenity::Error) -> ChatPlatformError {
    channel_error_from_status(channel_id, http_status(&error), error.to_string())
}

#[async_trait]
impl PanelChannels for SerenityPanelChannels {
    async fn ensure_postable(&self, raw_channel_id: &str) -> Result<(), ChatPlatformError> {
        let id = channel_id(raw_channel_id)?;
        let channel = self
            .http
            .get_channel(id)
            .await
            .map_err(|error| map_channel_error(raw_channel_id, error))?;
        match channel {
            Channel::Guild(guild_channel)
                if matches!(guild_channel.kind, ChannelType::Text | ChannelType::News) =>
            {
                Ok(())
            }
            _ => Err(ChatPlatformError::ChannelUnavailable {
                channel_id: raw_channel_id.to_string(),
                reason: "not a guild text channel".to_string(),
            }),
        }
    }

    async fn recent_messages(
        &self,
        raw_channel_id: &str,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, ChatPlatformError> {
        let id = channel_id(raw_channel_id)?;
        let messages = id
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .map_err(|error| map_channel_error(raw_channel_id, error))?;
        debug!(
            channel_id = raw_channel_id,
            count = messages.len(),
            "fetched channel history"
        );
        Ok(messages
            .into_iter()
            .map(|message| ChannelMessage {
                id: message.id.to_string(),
                author_id: message.author.id.to_string(),
                embed_title: message.embeds.first().and_then(|embed| embed.title.clone()),
            })
            .collect())
    }

    async fn send_panel(&self, panel: &PanelDefinition) -> Result<String, ChatPlatformError> {
        let id = channel_id(&panel.channel_id)?;
        let message = id
            .send_message(
                &self.http,
                CreateMessage::new()
                    .embed(panel_embed(panel))
                    .components(panel_rows(panel)),
            )
            .await
            .map_err(|error| map_channel_error(&panel.channel_id, error))?;
        Ok(message.id.to_string())
    }

    async fn edit_panel(
        &self,
        panel: &PanelDefinition,
        message_id: &str,
    ) -> Result<(), ChatPlatformError> {
        let id = channel_id(&panel.channel_id)?;
        let message_id = parse_snowflake(message_id)
            .map(MessageId::new)
            .ok_or_else(|| {
                ChatPlatformError::Transport(format!("invalid message id '{message_id}'"))
            })?;
        id.edit_message(
            &self.http,
            message_id,
            EditMessage::new()
                .embed(panel_embed(panel))
                .components(panel_rows(panel)),
        )
        .await
        .map_err(|error| map_channel_error(&panel.channel_id, error))?;
        Ok(())
    }
}

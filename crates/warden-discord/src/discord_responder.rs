//! `InteractionResponder` over a live Discord interaction token.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ComponentInteraction, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, Http, ModalInteraction,
};
use warden_core::{ChatPlatformError, FormView, InteractionResponder, SelectionView};

use crate::discord_channels::http_status;
use crate::discord_render::{form_modal, selection_row};

enum InteractionHandle {
    Component(Box<ComponentInteraction>),
    Modal(Box<ModalInteraction>),
}

/// Responds to one component or modal interaction.
pub struct SerenityResponder {
    http: Arc<Http>,
    interaction: InteractionHandle,
}

/// Discord answers 404 (unknown interaction) or 401 (invalid webhook token)
/// once the token has lapsed.
pub(crate) fn interaction_error_from_status(status: Option<u16>, detail: String) -> ChatPlatformError {
    match status {
        Some(401) | Some(404) => ChatPlatformError::InteractionExpired,
        _ => ChatPlatformError::Transport(detail),
    }
}

fn map_interaction_error(error: serenity::Error) -> ChatPlatformError {
    interaction_error_from_status(http_status(&error), error.to_string())
}

impl SerenityResponder {
    pub fn component(http: Arc<Http>, interaction: ComponentInteraction) -> Self {
        Self {
            http,
            interaction: InteractionHandle::Component(Box::new(interaction)),
        }
    }

    pub fn modal(http: Arc<Http>, interaction: ModalInteraction) -> Self {
        Self {
            http,
            interaction: InteractionHandle::Modal(Box::new(interaction)),
        }
    }

    async fn respond(&self, response: CreateInteractionResponse) -> Result<(), ChatPlatformError> {
        let result = match &self.interaction {
            InteractionHandle::Component(interaction) => {
                interaction.create_response(&self.http, response).await
            }
            InteractionHandle::Modal(interaction) => {
                interaction.create_response(&self.http, response).await
            }
        };
        result.map_err(map_interaction_error)
    }

    async fn follow_up(
        &self,
        builder: CreateInteractionResponseFollowup,
    ) -> Result<(), ChatPlatformError> {
        let result = match &self.interaction {
            InteractionHandle::Component(interaction) => {
                interaction.create_followup(&self.http, builder).await
            }
            InteractionHandle::Modal(interaction) => {
                interaction.create_followup(&self.http, builder).await
            }
        };
        result.map(|_| ()).map_err(map_interaction_error)
    }

    async fn edit_original(&self, builder: EditInteractionResponse) -> Result<(), ChatPlatformError> {
        let result = match &self.interaction {
            InteractionHandle::Component(interaction) => {
                interaction.edit_response(&self.http, builder).await
            }
            InteractionHandle::Modal(interaction) => {
                interaction.edit_response(&self.http, builder).await
            }
        };
        result.map(|_| ()).map_err(map_interaction_error)
    }
}

#[async_trait]
impl InteractionResponder for SerenityResponder {
    async fn open_form(&self, form: &FormView) -> Result<(), ChatPlatformError> {
        self.respond(CreateInteractionResponse::Modal(form_modal(form)))
            .await
    }

    async fn defer_private(&self) -> Result<(), ChatPlatformError> {
        self.respond(CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        ))
        .await
    }

    async fn acknowledge_update(&self) -> Result<(), ChatPlatformError> {
        self.respond(CreateInteractionResponse::Acknowledge).await
    }

    async fn send_private(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.follow_up(
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await
    }

    async fn send_private_selection(
        &self,
        content: &str,
        selection: &SelectionView,
    ) -> Result<(), ChatPlatformError> {
        self.follow_up(
            CreateInteractionResponseFollowup::new()
                .content(content)
                .components(vec![selection_row(selection)])
                .ephemeral(true),
        )
        .await
    }

    async fn replace_original(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.edit_original(
            EditInteractionResponse::new()
                .content(content)
                .components(Vec::new()),
        )
        .await
    }
}

//! Platform-neutral interaction events and the response primitives handlers
//! use to answer them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ChatPlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Kind of UI event, used together with the control identifier as a route key.
pub enum InteractionKind {
    Button,
    FormSubmit,
    Selection,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::FormSubmit => "form_submit",
            Self::Selection => "selection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionPayload {
    Button,
    FormSubmit { values: BTreeMap<String, String> },
    Selection { values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single UI round trip as delivered by the chat platform.
pub struct InteractionEvent {
    pub custom_id: String,
    pub user_id: String,
    /// Message carrying the control, when the platform reports one.
    pub message_id: Option<String>,
    pub payload: InteractionPayload,
}

impl InteractionEvent {
    pub fn kind(&self) -> InteractionKind {
        match self.payload {
            InteractionPayload::Button => InteractionKind::Button,
            InteractionPayload::FormSubmit { .. } => InteractionKind::FormSubmit,
            InteractionPayload::Selection { .. } => InteractionKind::Selection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A modal form with one or more short text fields.
pub struct FormView {
    pub custom_id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single-choice list attached to a private message.
pub struct SelectionView {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectionOption>,
    pub disabled: bool,
}

#[async_trait]
/// Response primitives for one interaction.
///
/// Every reply is private to the invoking user. An interaction is
/// acknowledged by exactly one of `open_form`, `defer_private` or
/// `acknowledge_update`; the `send_private*` and `replace_original` calls are
/// follow-ups and require a prior acknowledgment.
pub trait InteractionResponder: Send + Sync {
    async fn open_form(&self, form: &FormView) -> Result<(), ChatPlatformError>;

    /// Enters the private "working" state.
    async fn defer_private(&self) -> Result<(), ChatPlatformError>;

    /// Acknowledges a control on an existing message without a new reply.
    async fn acknowledge_update(&self) -> Result<(), ChatPlatformError>;

    async fn send_private(&self, content: &str) -> Result<(), ChatPlatformError>;

    async fn send_private_selection(
        &self,
        content: &str,
        selection: &SelectionView,
    ) -> Result<(), ChatPlatformError>;

    /// Replaces the message that carried the control and drops its controls.
    async fn replace_original(&self, content: &str) -> Result<(), ChatPlatformError>;
}

//! Mapping from gateway interactions to platform-neutral events.

use std::collections::BTreeMap;

use serenity::all::{
    ActionRowComponent, ComponentInteraction, ComponentInteractionDataKind, ModalInteraction,
};
use warden_core::{InteractionEvent, InteractionPayload};

const PING_COMMAND: &str = "!ping";
const PING_REPLY: &str = "Pong !";

/// Liveness reply for a plain text message, if it is the ping command.
pub fn ping_reply(content: &str) -> Option<&'static str> {
    (content == PING_COMMAND).then_some(PING_REPLY)
}

pub(crate) fn component_payload(kind: &ComponentInteractionDataKind) -> Option<InteractionPayload> {
    match kind {
        ComponentInteractionDataKind::Button => Some(InteractionPayload::Button),
        ComponentInteractionDataKind::StringSelect { values } => Some(InteractionPayload::Selection {
            values: values.clone(),
        }),
        _ => None,
    }
}

pub(crate) fn form_values<I>(inputs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    inputs
        .into_iter()
        .map(|(id, value)| (id, value.unwrap_or_default()))
        .collect()
}

/// Button clicks and string selections; other component kinds are not used
/// by any panel and yield `None`.
pub fn component_event(interaction: &ComponentInteraction) -> Option<InteractionEvent> {
    let payload = component_payload(&interaction.data.kind)?;
    Some(InteractionEvent {
        custom_id: interaction.data.custom_id.clone(),
        user_id: interaction.user.id.to_string(),
        message_id: Some(interaction.message.id.to_string()),
        payload,
    })
}

pub fn modal_event(interaction: &ModalInteraction) -> InteractionEvent {
    let inputs = interaction
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => {
                Some((input.custom_id.clone(), input.value.clone()))
            }
            _ => None,
        });
    InteractionEvent {
        custom_id: interaction.data.custom_id.clone(),
        user_id: interaction.user.id.to_string(),
        message_id: interaction
            .message
            .as_ref()
            .map(|message| message.id.to_string()),
        payload: InteractionPayload::FormSubmit {
            values: form_values(inputs),
        },
    }
}

//! Builders turning panel, form and picker views into Discord payloads.

use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateInputText, CreateModal,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, InputTextStyle,
};
use warden_core::{ControlStyle, FormView, PanelDefinition, SelectionView};

const MAX_BUTTONS_PER_ROW: usize = 5;
const MAX_MODAL_TEXT_CHARS: usize = 45;

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn button_style(style: ControlStyle) -> ButtonStyle {
    match style {
        ControlStyle::Primary => ButtonStyle::Primary,
        ControlStyle::Secondary => ButtonStyle::Secondary,
        ControlStyle::Success => ButtonStyle::Success,
        ControlStyle::Danger => ButtonStyle::Danger,
    }
}

pub(crate) fn panel_embed(panel: &PanelDefinition) -> CreateEmbed {
    CreateEmbed::new()
        .title(panel.title.as_str())
        .description(panel.description.as_str())
        .colour(panel.colour)
}

pub(crate) fn panel_rows(panel: &PanelDefinition) -> Vec<CreateActionRow> {
    panel
        .controls
        .chunks(MAX_BUTTONS_PER_ROW)
        .map(|chunk| {
            CreateActionRow::Buttons(
                chunk
                    .iter()
                    .map(|control| {
                        CreateButton::new(control.custom_id.as_str())
                            .label(control.label.as_str())
                            .style(button_style(control.style))
                    })
                    .collect(),
            )
        })
        .collect()
}

pub(crate) fn form_modal(form: &FormView) -> CreateModal {
    let rows = form
        .fields
        .iter()
        .map(|field| {
            CreateActionRow::InputText(
                CreateInputText::new(
                    InputTextStyle::Short,
                    truncate_chars(&field.label, MAX_MODAL_TEXT_CHARS),
                    field.id.as_str(),
                )
                .placeholder(field.placeholder.as_str())
                .required(field.required),
            )
        })
        .collect();
    CreateModal::new(
        form.custom_id.as_str(),
        truncate_chars(&form.title, MAX_MODAL_TEXT_CHARS),
    )
    .components(rows)
}

pub(crate) fn selection_row(selection: &SelectionView) -> CreateActionRow {
    let options = selection
        .options
        .iter()
        .map(|option| CreateSelectMenuOption::new(option.label.as_str(), option.value.as_str()))
        .collect();
    CreateActionRow::SelectMenu(
        CreateSelectMenu::new(
            selection.custom_id.as_str(),
            CreateSelectMenuKind::String { options },
        )
        .placeholder(selection.placeholder.as_str())
        .min_values(1)
        .max_values(1)
        .disabled(selection.disabled),
    )
}

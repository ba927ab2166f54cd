//! Stable control identifiers.
//!
//! Identifiers depend only on the panel function and the document key, never
//! on the message they are attached to, so controls on panels sent by an
//! earlier process still route after a restart.

const CONTROL_ID_PREFIX: &str = "warden";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The administrative functions, one panel each.
pub enum PanelFunction {
    AddEditor,
    RemoveEditor,
    CopyDocument,
}

impl PanelFunction {
    pub const ALL: [PanelFunction; 3] = [Self::AddEditor, Self::RemoveEditor, Self::CopyDocument];

    pub fn slug(self) -> &'static str {
        match self {
            Self::AddEditor => "add",
            Self::RemoveEditor => "remove",
            Self::CopyDocument => "copy",
        }
    }

    pub fn panel_title(self) -> &'static str {
        match self {
            Self::AddEditor => "Panel - ADD",
            Self::RemoveEditor => "Panel - DELETE",
            Self::CopyDocument => "Panel - COPY",
        }
    }
}

pub fn button_id(function: PanelFunction, document_key: &str) -> String {
    format!("{CONTROL_ID_PREFIX}:{}:{document_key}", function.slug())
}

pub fn form_id(function: PanelFunction, document_key: &str) -> String {
    format!("{}:form", button_id(function, document_key))
}

pub fn selection_id(document_key: &str) -> String {
    format!("{}:select", button_id(PanelFunction::RemoveEditor, document_key))
}

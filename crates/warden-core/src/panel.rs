use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Visual emphasis of a panel control.
pub enum ControlStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A persistent button on a panel. `custom_id` is assigned when the panel is
/// defined and never regenerated per message.
pub struct PanelControl {
    pub custom_id: String,
    pub label: String,
    pub style: ControlStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One administrative surface. At most one live message exists per
/// `(channel_id, title)`.
pub struct PanelDefinition {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub controls: Vec<PanelControl>,
}

impl PanelDefinition {
    pub fn control_ids(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(|control| control.custom_id.as_str())
    }
}

//! Domain model shared by the warden crates.
//!
//! Defines the document targets, panel definitions, permission records and
//! interaction events the panel engine works with, together with the
//! collaborator traits implemented by the document-sharing client
//! (`warden-drive`) and the chat platform adapter (`warden-discord`).

pub mod documents;
pub mod errors;
pub mod interaction;
pub mod panel;
pub mod permission;
pub mod platform;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod time_utils;

pub use documents::DocumentTarget;
pub use errors::{ChatPlatformError, PermissionServiceError, WorkflowError};
pub use interaction::{
    FormField, FormView, InteractionEvent, InteractionKind, InteractionPayload,
    InteractionResponder, SelectionOption, SelectionView,
};
pub use panel::{ControlStyle, PanelControl, PanelDefinition};
pub use permission::{CopiedDocument, PermissionRecord, PermissionRole, PermissionService};
pub use platform::{ChannelMessage, PanelChannels};
pub use time_utils::current_unix_timestamp;

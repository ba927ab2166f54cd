//! Error taxonomy shared by the permission client, the chat adapter and the
//! panel workflows.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures reported by the document-sharing service client.
pub enum PermissionServiceError {
    /// Credentials could not be turned into an authenticated session, or the
    /// service could not be reached at all.
    #[error("document service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The service answered but rejected the operation. `detail` is the
    /// service's own message and is shown to the user unchanged.
    #[error("document service rejected the request (HTTP {status}): {detail}")]
    RemoteError { status: u16, detail: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures reported by the chat platform adapter.
pub enum ChatPlatformError {
    #[error("channel {channel_id} is unavailable: {reason}")]
    ChannelUnavailable { channel_id: String, reason: String },
    #[error("missing permission on channel {channel_id}: {reason}")]
    PermissionDenied { channel_id: String, reason: String },
    #[error("interaction token is no longer valid")]
    InteractionExpired,
    #[error("chat platform request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
/// Error returned by an interaction handler.
pub enum WorkflowError {
    #[error(transparent)]
    Permission(#[from] PermissionServiceError),
    #[error(transparent)]
    Platform(#[from] ChatPlatformError),
    #[error("unexpected handler failure: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::Unexpected(detail.into())
    }
}

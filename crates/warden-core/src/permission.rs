//! Permission records and the document-sharing service contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::PermissionServiceError;

/// Role string the document service uses for editor grants.
pub const EDITOR_ROLE: &str = "writer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Role attached to a permission record.
pub enum PermissionRole {
    Editor,
    Other(String),
}

impl PermissionRole {
    pub fn from_service(role: &str) -> Self {
        if role == EDITOR_ROLE {
            Self::Editor
        } else {
            Self::Other(role.to_string())
        }
    }

    pub fn as_service_str(&self) -> &str {
        match self {
            Self::Editor => EDITOR_ROLE,
            Self::Other(role) => role.as_str(),
        }
    }

    pub fn is_editor(&self) -> bool {
        matches!(self, Self::Editor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One grant on a document as reported by the document service.
pub struct PermissionRecord {
    pub id: String,
    pub email: String,
    pub role: PermissionRole,
}

impl PermissionRecord {
    /// Editor grants that can be offered for removal: editor role with an
    /// email address (link shares and owners never qualify).
    pub fn is_removable_editor(&self) -> bool {
        self.role.is_editor() && !self.email.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result of a server-side document copy.
pub struct CopiedDocument {
    pub file_id: String,
    pub name: String,
    pub link: String,
}

#[async_trait]
/// Narrow contract over the external document-sharing service.
///
/// Every call is a single attempt; implementations never retry.
pub trait PermissionService: Send + Sync {
    /// Lists editor grants that carry an email address.
    async fn list_editors(
        &self,
        document_id: &str,
    ) -> Result<Vec<PermissionRecord>, PermissionServiceError>;

    /// Grants editor access and lets the service send its own notification.
    async fn add_editor(&self, document_id: &str, email: &str)
        -> Result<(), PermissionServiceError>;

    /// Resolves the grantee's email, then deletes the grant. Returns the email.
    async fn remove_editor(
        &self,
        document_id: &str,
        permission_id: &str,
    ) -> Result<String, PermissionServiceError>;

    /// Copies the document next to its source under `new_name`.
    async fn copy_document(
        &self,
        document_id: &str,
        new_name: &str,
    ) -> Result<CopiedDocument, PermissionServiceError>;
}

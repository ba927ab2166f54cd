//! Private reply texts and delivery helpers.

use warden_core::{
    ChatPlatformError, CopiedDocument, InteractionResponder, PermissionServiceError, WorkflowError,
};

pub const GENERIC_FAILURE: &str =
    "❌ Une erreur inattendue est survenue. L'incident a été journalisé.";
pub const CONTROL_INACTIVE: &str =
    "⚠️ Ce contrôle n'est plus actif. Utilisez le panneau le plus récent.";

pub fn editor_added(email: &str, document_name: &str) -> String {
    format!("✅ {email} a maintenant accès en édition au document « {document_name} ».")
}

pub fn editor_removed(email: &str, document_name: &str) -> String {
    format!("🗑️ {email} n'a plus accès en édition au document « {document_name} ».")
}

pub fn choose_editor(document_name: &str) -> String {
    format!("Choisissez l'éditeur à retirer du document « {document_name} » :")
}

pub fn no_editors(document_name: &str) -> String {
    format!("Aucun éditeur à retirer sur le document « {document_name} ».")
}

pub fn document_copied(copy: &CopiedDocument, source_name: &str) -> String {
    format!(
        "📄 Copie de « {source_name} » créée : **{}**\n{}",
        copy.name, copy.link
    )
}

pub fn copy_shared(email: &str) -> String {
    format!("✅ {email} a été ajouté comme éditeur de la copie.")
}

pub fn copy_share_failed(email: &str, error: &PermissionServiceError) -> String {
    format!(
        "⚠️ La copie existe mais {email} n'a pas pu y être ajouté : {}",
        service_error_detail(error)
    )
}

pub fn missing_field(label: &str) -> String {
    format!("❌ Le champ « {label} » est obligatoire.")
}

fn service_error_detail(error: &PermissionServiceError) -> String {
    match error {
        PermissionServiceError::ServiceUnavailable(_) => {
            "impossible de se connecter à Google Drive.".to_string()
        }
        PermissionServiceError::RemoteError { detail, .. } => detail.clone(),
    }
}

/// Text shown to the invoking user for a failed operation.
pub fn failure_reply(error: &WorkflowError) -> String {
    match error {
        WorkflowError::Permission(PermissionServiceError::ServiceUnavailable(_)) => {
            "❌ Impossible de se connecter à Google Drive. Réessayez plus tard.".to_string()
        }
        WorkflowError::Permission(PermissionServiceError::RemoteError { detail, .. }) => {
            format!("❌ Google Drive a refusé l'opération : {detail}")
        }
        WorkflowError::Platform(_) | WorkflowError::Unexpected(_) => GENERIC_FAILURE.to_string(),
    }
}

/// Sends a private follow-up. An expired interaction is not an error: the
/// user is gone and nobody can observe the reply.
pub async fn deliver_private(
    responder: &dyn InteractionResponder,
    content: &str,
) -> Result<(), WorkflowError> {
    swallow_expired(responder.send_private(content).await)
}

pub async fn deliver_replacement(
    responder: &dyn InteractionResponder,
    content: &str,
) -> Result<(), WorkflowError> {
    swallow_expired(responder.replace_original(content).await)
}

fn swallow_expired(result: Result<(), ChatPlatformError>) -> Result<(), WorkflowError> {
    match result {
        Ok(()) => Ok(()),
        Err(ChatPlatformError::InteractionExpired) => {
            tracing::debug!("interaction expired before the follow-up was delivered");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

//! Per-document handlers for the add, remove and copy functions.
//!
//! Each workflow is registered under its panel button and under the follow-up
//! control it creates (form or picker), and branches on the event kind.

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    DocumentTarget, InteractionEvent, InteractionPayload, InteractionResponder, PermissionService,
    WorkflowError,
};

use crate::action_router::{ActionHandler, HandlerOutcome};
use crate::control_ids::{form_id, selection_id, PanelFunction};
use crate::modal_input::ModalInput;
use crate::selection_presenter::SelectionPresenter;
use crate::user_replies::{
    copy_share_failed, copy_shared, deliver_private, document_copied, editor_added, failure_reply,
};

pub const EMAIL_FIELD: &str = "email";
pub const COPY_NAME_FIELD: &str = "name";
pub const COPY_SHARE_FIELD: &str = "share_with";

fn unexpected_event(workflow: &str, event: &InteractionEvent) -> WorkflowError {
    WorkflowError::unexpected(format!(
        "{workflow} workflow cannot handle {} events on {}",
        event.kind().as_str(),
        event.custom_id
    ))
}

pub struct AddEditorWorkflow {
    target: DocumentTarget,
    service: Arc<dyn PermissionService>,
    form: ModalInput,
}

impl AddEditorWorkflow {
    pub fn new(target: DocumentTarget, service: Arc<dyn PermissionService>) -> Self {
        let form = ModalInput::new(
            form_id(PanelFunction::AddEditor, &target.key),
            format!("Ajouter un éditeur · {}", target.name),
        )
        .field(
            EMAIL_FIELD,
            "Adresse e-mail",
            "prenom.nom@gmail.com",
            true,
        );
        Self {
            target,
            service,
            form,
        }
    }

    pub fn form(&self) -> &ModalInput {
        &self.form
    }
}

#[async_trait]
impl ActionHandler for AddEditorWorkflow {
    async fn handle(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        match event.payload {
            InteractionPayload::Button => self.form.open(responder).await,
            InteractionPayload::FormSubmit { .. } => {
                self.form
                    .complete(event, responder, |values| async move {
                        let email = values.value(EMAIL_FIELD);
                        self.service.add_editor(&self.target.file_id, email).await?;
                        tracing::info!(
                            document = %self.target.name,
                            user_id = %event.user_id,
                            "editor access granted"
                        );
                        Ok::<_, WorkflowError>(editor_added(email, &self.target.name))
                    })
                    .await
            }
            InteractionPayload::Selection { .. } => Err(unexpected_event("add", event)),
        }
    }
}

pub struct RemoveEditorWorkflow {
    target: DocumentTarget,
    service: Arc<dyn PermissionService>,
    presenter: Arc<SelectionPresenter>,
    selection_id: String,
}

impl RemoveEditorWorkflow {
    pub fn new(
        target: DocumentTarget,
        service: Arc<dyn PermissionService>,
        presenter: Arc<SelectionPresenter>,
    ) -> Self {
        let selection_id = selection_id(&target.key);
        Self {
            target,
            service,
            presenter,
            selection_id,
        }
    }

    pub fn selection_id(&self) -> &str {
        &self.selection_id
    }

    async fn present_editors(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        responder.defer_private().await?;
        match self.service.list_editors(&self.target.file_id).await {
            Ok(editors) => {
                self.presenter
                    .present(&self.selection_id, &self.target, &editors, responder)
                    .await
            }
            Err(error) => {
                let error = WorkflowError::from(error);
                tracing::warn!(
                    document = %self.target.name,
                    user_id = %event.user_id,
                    error = %error,
                    "listing editors failed"
                );
                deliver_private(responder, &failure_reply(&error)).await?;
                Ok(HandlerOutcome::Failed)
            }
        }
    }
}

#[async_trait]
impl ActionHandler for RemoveEditorWorkflow {
    async fn handle(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        match event.payload {
            InteractionPayload::Button => self.present_editors(event, responder).await,
            InteractionPayload::Selection { .. } => {
                self.presenter
                    .on_selection(&self.target, self.service.as_ref(), event, responder)
                    .await
            }
            InteractionPayload::FormSubmit { .. } => Err(unexpected_event("remove", event)),
        }
    }
}

pub struct CopyDocumentWorkflow {
    target: DocumentTarget,
    service: Arc<dyn PermissionService>,
    form: ModalInput,
}

impl CopyDocumentWorkflow {
    pub fn new(target: DocumentTarget, service: Arc<dyn PermissionService>) -> Self {
        let form = ModalInput::new(
            form_id(PanelFunction::CopyDocument, &target.key),
            format!("Dupliquer · {}", target.name),
        )
        .field(
            COPY_NAME_FIELD,
            "Nom du nouveau document",
            &format!("{} - Copie", target.name),
            true,
        )
        .field(
            COPY_SHARE_FIELD,
            "Ajouter un éditeur à la copie (optionnel)",
            "prenom.nom@gmail.com",
            false,
        );
        Self {
            target,
            service,
            form,
        }
    }

    pub fn form(&self) -> &ModalInput {
        &self.form
    }
}

#[async_trait]
impl ActionHandler for CopyDocumentWorkflow {
    async fn handle(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        match event.payload {
            InteractionPayload::Button => self.form.open(responder).await,
            InteractionPayload::FormSubmit { .. } => {
                self.form
                    .complete(event, responder, |values| async move {
                        let copy = self
                            .service
                            .copy_document(&self.target.file_id, values.value(COPY_NAME_FIELD))
                            .await?;
                        tracing::info!(
                            document = %self.target.name,
                            copy_id = %copy.file_id,
                            user_id = %event.user_id,
                            "document copied"
                        );
                        let mut message = document_copied(&copy, &self.target.name);
                        if let Some(email) = values.get(COPY_SHARE_FIELD) {
                            let shared = match self.service.add_editor(&copy.file_id, email).await {
                                Ok(()) => copy_shared(email),
                                Err(error) => {
                                    tracing::warn!(
                                        copy_id = %copy.file_id,
                                        error = %error,
                                        "sharing the copy failed"
                                    );
                                    copy_share_failed(email, &error)
                                }
                            };
                            message.push('\n');
                            message.push_str(&shared);
                        }
                        Ok::<_, WorkflowError>(message)
                    })
                    .await
            }
            InteractionPayload::Selection { .. } => Err(unexpected_event("copy", event)),
        }
    }
}

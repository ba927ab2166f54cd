//! The deployment's panels and the route table behind them.

use std::sync::Arc;

use warden_core::{
    ControlStyle, DocumentTarget, InteractionKind, PanelControl, PanelDefinition,
    PermissionService,
};

use crate::action_router::{ActionHandler, ActionRouter, RouterError};
use crate::control_ids::{button_id, PanelFunction};
use crate::permission_workflows::{AddEditorWorkflow, CopyDocumentWorkflow, RemoveEditorWorkflow};
use crate::selection_presenter::SelectionPresenter;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Channel hosting each function's panel.
pub struct PanelTargets {
    pub add_channel_id: String,
    pub remove_channel_id: String,
    pub copy_channel_id: String,
}

#[derive(Debug, Clone)]
pub struct PanelCatalog {
    documents: Vec<DocumentTarget>,
    targets: PanelTargets,
}

impl PanelCatalog {
    pub fn new(documents: Vec<DocumentTarget>, targets: PanelTargets) -> Self {
        Self { documents, targets }
    }

    pub fn documents(&self) -> &[DocumentTarget] {
        &self.documents
    }

    fn channel_for(&self, function: PanelFunction) -> &str {
        match function {
            PanelFunction::AddEditor => &self.targets.add_channel_id,
            PanelFunction::RemoveEditor => &self.targets.remove_channel_id,
            PanelFunction::CopyDocument => &self.targets.copy_channel_id,
        }
    }

    pub fn panel(&self, function: PanelFunction) -> PanelDefinition {
        let (description, colour, style) = match function {
            PanelFunction::AddEditor => (
                "Donnez l'accès en édition à un document : cliquez sur le document puis \
                 saisissez l'adresse e-mail du nouvel éditeur. Google lui enverra une \
                 notification.",
                0x2e_cc_71,
                ControlStyle::Success,
            ),
            PanelFunction::RemoveEditor => (
                "Retirez l'accès en édition d'un document : cliquez sur le document puis \
                 choisissez l'éditeur à retirer dans la liste.",
                0xe7_4c_3c,
                ControlStyle::Danger,
            ),
            PanelFunction::CopyDocument => (
                "Dupliquez un document : cliquez sur le document puis saisissez le nom de \
                 la copie. Elle est créée dans le même dossier que l'original.",
                0x34_98_db,
                ControlStyle::Primary,
            ),
        };
        PanelDefinition {
            channel_id: self.channel_for(function).to_string(),
            title: function.panel_title().to_string(),
            description: description.to_string(),
            colour,
            controls: self
                .documents
                .iter()
                .map(|document| PanelControl {
                    custom_id: button_id(function, &document.key),
                    label: document.name.clone(),
                    style,
                })
                .collect(),
        }
    }

    pub fn panels(&self) -> Vec<PanelDefinition> {
        PanelFunction::ALL
            .into_iter()
            .map(|function| self.panel(function))
            .collect()
    }

    /// Registers every control any panel or follow-up message can carry.
    pub fn build_router(
        &self,
        service: Arc<dyn PermissionService>,
    ) -> Result<ActionRouter, RouterError> {
        let presenter = Arc::new(SelectionPresenter::new());
        let mut builder = ActionRouter::builder();
        for document in &self.documents {
            let add = Arc::new(AddEditorWorkflow::new(document.clone(), service.clone()));
            let add_form = add.form().custom_id().to_string();
            builder
                .register(
                    InteractionKind::Button,
                    button_id(PanelFunction::AddEditor, &document.key),
                    add.clone() as Arc<dyn ActionHandler>,
                )?
                .register(InteractionKind::FormSubmit, add_form, add)?;

            let remove = Arc::new(RemoveEditorWorkflow::new(
                document.clone(),
                service.clone(),
                presenter.clone(),
            ));
            let remove_selection = remove.selection_id().to_string();
            builder
                .register(
                    InteractionKind::Button,
                    button_id(PanelFunction::RemoveEditor, &document.key),
                    remove.clone() as Arc<dyn ActionHandler>,
                )?
                .register(InteractionKind::Selection, remove_selection, remove)?;

            let copy = Arc::new(CopyDocumentWorkflow::new(document.clone(), service.clone()));
            let copy_form = copy.form().custom_id().to_string();
            builder
                .register(
                    InteractionKind::Button,
                    button_id(PanelFunction::CopyDocument, &document.key),
                    copy.clone() as Arc<dyn ActionHandler>,
                )?
                .register(InteractionKind::FormSubmit, copy_form, copy)?;
        }
        let router = builder.build();
        tracing::info!(routes = router.len(), "interaction routes registered");
        Ok(router)
    }
}

//! Panel reconciliation and permission workflows.
//!
//! Startup registers every persistent control in an [`ActionRouter`] and then
//! runs the [`PanelReconciler`] so each administrative panel exists exactly
//! once per channel. After that, every button click, form submission and
//! selection is dispatched through the router to a permission workflow.

pub mod action_router;
pub mod control_ids;
pub mod modal_input;
pub mod panel_catalog;
pub mod panel_reconciler;
pub mod permission_workflows;
pub mod selection_presenter;
pub mod user_replies;

pub use action_router::{
    ActionHandler, ActionRouter, ActionRouterBuilder, DispatchOutcome, HandlerOutcome, RouteKey,
    RouterError,
};
pub use control_ids::PanelFunction;
pub use modal_input::{FormValues, ModalInput};
pub use panel_catalog::{PanelCatalog, PanelTargets};
pub use panel_reconciler::{
    find_existing_panel, PanelOutcome, PanelReconciler, PanelReport, ReconcileError,
    PANEL_HISTORY_LIMIT,
};
pub use permission_workflows::{AddEditorWorkflow, CopyDocumentWorkflow, RemoveEditorWorkflow};
pub use selection_presenter::{
    build_editor_selection, SelectionPresenter, CONSUMED_PICKER_CAP, NO_EDITORS_VALUE,
};

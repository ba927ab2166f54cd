use std::collections::BTreeMap;
use std::sync::Arc;

use warden_core::testing::{
    InMemoryPermissionService, RecordingChannels, RecordingResponder, ResponderCall,
};
use warden_core::{
    DocumentTarget, InteractionEvent, InteractionPayload, PermissionRecord, PermissionRole,
    PermissionService,
};
use warden_panels::control_ids::{button_id, form_id, selection_id};
use warden_panels::{
    ActionRouter, DispatchOutcome, HandlerOutcome, PanelCatalog, PanelFunction, PanelOutcome,
    PanelReconciler, PanelTargets, NO_EDITORS_VALUE,
};

const BOT_ID: &str = "bot-1";
const ADD_CHANNEL: &str = "c-add";
const REMOVE_CHANNEL: &str = "c-remove";
const COPY_CHANNEL: &str = "c-copy";
const FICHE_FILE: &str = "doc-fiche";
const DIRECTION_FILE: &str = "doc-direction";

struct Harness {
    catalog: PanelCatalog,
    service: Arc<InMemoryPermissionService>,
    channels: Arc<RecordingChannels>,
    router: ActionRouter,
}

impl Harness {
    fn new() -> Self {
        let catalog = PanelCatalog::new(
            vec![
                DocumentTarget::new("fiche", "Fiche de Travail", FICHE_FILE),
                DocumentTarget::new("direction", "Direction", DIRECTION_FILE),
            ],
            PanelTargets {
                add_channel_id: ADD_CHANNEL.to_string(),
                remove_channel_id: REMOVE_CHANNEL.to_string(),
                copy_channel_id: COPY_CHANNEL.to_string(),
            },
        );
        let service = Arc::new(
            InMemoryPermissionService::new()
                .with_document(FICHE_FILE)
                .with_document(DIRECTION_FILE),
        );
        let channels = Arc::new(
            RecordingChannels::new(BOT_ID)
                .with_channel(ADD_CHANNEL)
                .with_channel(REMOVE_CHANNEL)
                .with_channel(COPY_CHANNEL),
        );
        let router = catalog
            .build_router(service.clone() as Arc<dyn PermissionService>)
            .expect("router");
        Self {
            catalog,
            service,
            channels,
            router,
        }
    }

    fn reconciler(&self) -> PanelReconciler {
        PanelReconciler::new(self.channels.clone())
    }

    async fn reconcile(&self) -> Vec<PanelOutcome> {
        self.reconciler()
            .reconcile_all(&self.router, BOT_ID, &self.catalog.panels())
            .await
            .into_iter()
            .map(|report| report.outcome)
            .collect()
    }

    async fn dispatch(&self, event: InteractionEvent) -> (DispatchOutcome, RecordingResponder) {
        let responder = RecordingResponder::new();
        let outcome = self.router.dispatch(&event, &responder).await;
        (outcome, responder)
    }

    fn seed_editor(&self, file_id: &str, id: &str, email: &str) {
        self.service.seed_permission(
            file_id,
            PermissionRecord {
                id: id.to_string(),
                email: email.to_string(),
                role: PermissionRole::Editor,
            },
        );
    }

    fn editor_emails(&self, file_id: &str) -> Vec<String> {
        self.service
            .permissions(file_id)
            .into_iter()
            .filter(|record| record.role.is_editor())
            .map(|record| record.email)
            .collect()
    }
}

fn button(custom_id: String) -> InteractionEvent {
    InteractionEvent {
        custom_id,
        user_id: "admin-7".to_string(),
        message_id: Some("panel-message".to_string()),
        payload: InteractionPayload::Button,
    }
}

fn submit(custom_id: String, values: &[(&str, &str)]) -> InteractionEvent {
    InteractionEvent {
        custom_id,
        user_id: "admin-7".to_string(),
        message_id: None,
        payload: InteractionPayload::FormSubmit {
            values: values
                .iter()
                .map(|(id, value)| (id.to_string(), value.to_string()))
                .collect::<BTreeMap<_, _>>(),
        },
    }
}

fn select(custom_id: String, message_id: &str, value: &str) -> InteractionEvent {
    InteractionEvent {
        custom_id,
        user_id: "admin-7".to_string(),
        message_id: Some(message_id.to_string()),
        payload: InteractionPayload::Selection {
            values: vec![value.to_string()],
        },
    }
}

#[tokio::test]
async fn integration_fresh_channels_receive_exactly_one_panel_each() {
    let harness = Harness::new();

    let outcomes = harness.reconcile().await;

    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, PanelOutcome::Created { .. })));
    let add_messages = harness.channels.messages(ADD_CHANNEL);
    assert_eq!(add_messages.len(), 1);
    assert_eq!(add_messages[0].author_id, BOT_ID);
    assert_eq!(add_messages[0].embed_title.as_deref(), Some("Panel - ADD"));
    let panel = add_messages[0].panel.as_ref().expect("panel");
    let expected = [
        button_id(PanelFunction::AddEditor, "fiche"),
        button_id(PanelFunction::AddEditor, "direction"),
    ];
    assert_eq!(
        panel.control_ids().collect::<Vec<_>>(),
        expected.iter().map(String::as_str).collect::<Vec<_>>()
    );
    assert_eq!(harness.channels.sends(), 3);
}

#[tokio::test]
async fn integration_existing_panel_is_edited_in_place() {
    let harness = Harness::new();
    harness
        .channels
        .seed_message(ADD_CHANNEL, "someone-else", Some("Panel - ADD"));
    let own = harness
        .channels
        .seed_message(ADD_CHANNEL, BOT_ID, Some("Panel - ADD"));
    harness
        .channels
        .seed_message(ADD_CHANNEL, "someone-else", Some("bonjour"));

    let outcomes = harness.reconcile().await;

    assert_eq!(outcomes[0], PanelOutcome::Updated { message_id: own });
    assert_eq!(harness.channels.messages(ADD_CHANNEL).len(), 3);
    assert_eq!(harness.channels.edits(), 1);
}

#[tokio::test]
async fn integration_reconciliation_is_idempotent_across_restarts() {
    let first = Harness::new();
    first.reconcile().await;
    let sends_after_first = first.channels.sends();

    let outcomes = first.reconcile().await;

    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, PanelOutcome::Updated { .. })));
    assert_eq!(first.channels.sends(), sends_after_first);
    for channel in [ADD_CHANNEL, REMOVE_CHANNEL, COPY_CHANNEL] {
        assert_eq!(first.channels.messages(channel).len(), 1);
    }
}

#[tokio::test]
async fn integration_unreachable_channel_does_not_block_other_panels() {
    let harness = Harness::new();
    harness.channels.deny_channel(REMOVE_CHANNEL);

    let outcomes = harness.reconcile().await;

    assert!(matches!(outcomes[0], PanelOutcome::Created { .. }));
    assert!(matches!(outcomes[1], PanelOutcome::Skipped { .. }));
    assert!(matches!(outcomes[2], PanelOutcome::Created { .. }));
    assert!(harness.channels.messages(REMOVE_CHANNEL).is_empty());
}

#[tokio::test]
async fn integration_add_flow_grants_editor_access() {
    let harness = Harness::new();

    let (opened, responder) = harness
        .dispatch(button(button_id(PanelFunction::AddEditor, "fiche")))
        .await;
    assert_eq!(opened, DispatchOutcome::Handled(HandlerOutcome::FormOpened));
    assert!(matches!(responder.calls()[0], ResponderCall::OpenForm(_)));

    let (completed, responder) = harness
        .dispatch(submit(
            form_id(PanelFunction::AddEditor, "fiche"),
            &[("email", "ana@example.org")],
        ))
        .await;
    assert_eq!(completed, DispatchOutcome::Handled(HandlerOutcome::Completed));
    assert_eq!(harness.editor_emails(FICHE_FILE), vec!["ana@example.org"]);
    assert!(harness.editor_emails(DIRECTION_FILE).is_empty());
    let messages = responder.private_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("ana@example.org"));
    assert!(messages[0].contains("Fiche de Travail"));
}

#[tokio::test]
async fn integration_add_flow_surfaces_service_rejection_verbatim() {
    let harness = Harness::new();

    let (outcome, responder) = harness
        .dispatch(submit(
            form_id(PanelFunction::AddEditor, "direction"),
            &[("email", "bad-email")],
        ))
        .await;

    assert_eq!(outcome, DispatchOutcome::Handled(HandlerOutcome::Failed));
    let messages = responder.private_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Invalid email or User ID"));
    assert!(harness.editor_emails(DIRECTION_FILE).is_empty());
}

#[tokio::test]
async fn integration_copy_flow_reports_requested_name_and_link() {
    let harness = Harness::new();

    let (outcome, responder) = harness
        .dispatch(submit(
            form_id(PanelFunction::CopyDocument, "fiche"),
            &[("name", "Copy A")],
        ))
        .await;

    assert_eq!(outcome, DispatchOutcome::Handled(HandlerOutcome::Completed));
    let messages = responder.private_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("**Copy A**"));
    assert!(messages[0].contains("https://docs.google.com/document/d/copy-1/edit"));
}

#[tokio::test]
async fn integration_copy_flow_can_share_the_new_document() {
    let harness = Harness::new();

    let (_, responder) = harness
        .dispatch(submit(
            form_id(PanelFunction::CopyDocument, "direction"),
            &[("name", "Direction 2027"), ("share_with", "lea@example.org")],
        ))
        .await;

    assert_eq!(harness.editor_emails("copy-1"), vec!["lea@example.org"]);
    let messages = responder.private_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("lea@example.org"));
}

#[tokio::test]
async fn integration_add_then_remove_round_trip_restores_editor_set() {
    let harness = Harness::new();
    harness.seed_editor(FICHE_FILE, "perm-existing", "marc@example.org");
    let before = harness.editor_emails(FICHE_FILE);

    harness
        .dispatch(submit(
            form_id(PanelFunction::AddEditor, "fiche"),
            &[("email", "ana@example.org")],
        ))
        .await;
    let (presented, responder) = harness
        .dispatch(button(button_id(PanelFunction::RemoveEditor, "fiche")))
        .await;
    assert_eq!(
        presented,
        DispatchOutcome::Handled(HandlerOutcome::SelectionPresented)
    );
    let picker = responder.last_selection().expect("picker");
    let ana = picker
        .options
        .iter()
        .find(|option| option.label.contains("ana@example.org"))
        .expect("ana listed")
        .value
        .clone();

    let (removed, responder) = harness
        .dispatch(select(selection_id("fiche"), "picker-1", &ana))
        .await;

    assert_eq!(removed, DispatchOutcome::Handled(HandlerOutcome::Completed));
    assert_eq!(harness.editor_emails(FICHE_FILE), before);
    assert!(responder.calls().iter().any(|call| matches!(
        call,
        ResponderCall::ReplaceOriginal(content) if content.contains("ana@example.org")
    )));
}

#[tokio::test]
async fn integration_picker_removes_at_most_once() {
    let harness = Harness::new();
    harness.seed_editor(FICHE_FILE, "perm-ana", "ana@example.org");
    harness.seed_editor(FICHE_FILE, "perm-marc", "marc@example.org");

    let (first, _) = harness
        .dispatch(select(selection_id("fiche"), "picker-9", "perm-ana"))
        .await;
    let (replay, _) = harness
        .dispatch(select(selection_id("fiche"), "picker-9", "perm-marc"))
        .await;

    assert_eq!(first, DispatchOutcome::Handled(HandlerOutcome::Completed));
    assert_eq!(replay, DispatchOutcome::Handled(HandlerOutcome::NoOp));
    assert_eq!(harness.service.remove_calls(), 1);
    assert_eq!(harness.editor_emails(FICHE_FILE), vec!["marc@example.org"]);
}

#[tokio::test]
async fn integration_empty_editor_list_offers_an_inert_picker() {
    let harness = Harness::new();

    let (outcome, responder) = harness
        .dispatch(button(button_id(PanelFunction::RemoveEditor, "direction")))
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Handled(HandlerOutcome::SelectionPresented)
    );
    let picker = responder.last_selection().expect("picker");
    assert!(picker.disabled);
    assert_eq!(picker.options.len(), 1);
    assert_eq!(picker.options[0].value, NO_EDITORS_VALUE);

    let (selected, _) = harness
        .dispatch(select(selection_id("direction"), "picker-2", NO_EDITORS_VALUE))
        .await;
    assert_eq!(selected, DispatchOutcome::Handled(HandlerOutcome::NoOp));
    assert_eq!(harness.service.remove_calls(), 0);
}

#[tokio::test]
async fn integration_unavailable_service_is_reported_privately() {
    let harness = Harness::new();
    harness.service.set_unavailable(true);

    let (outcome, responder) = harness
        .dispatch(button(button_id(PanelFunction::RemoveEditor, "fiche")))
        .await;

    assert_eq!(outcome, DispatchOutcome::Handled(HandlerOutcome::Failed));
    let messages = responder.private_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Impossible de se connecter"));
    assert!(responder.last_selection().is_none());
}

#[tokio::test]
async fn regression_owner_grant_cannot_be_removed_through_picker() {
    let harness = Harness::new();
    let owner_id = format!("owner-{FICHE_FILE}");

    let (outcome, responder) = harness
        .dispatch(select(selection_id("fiche"), "picker-owner", &owner_id))
        .await;

    assert_eq!(outcome, DispatchOutcome::Handled(HandlerOutcome::Failed));
    assert_eq!(harness.service.permissions(FICHE_FILE).len(), 1);
    assert_eq!(responder.private_messages().len(), 1);
}

#[tokio::test]
async fn regression_stale_control_identifier_gets_inactive_notice() {
    let harness = Harness::new();

    let (outcome, responder) = harness.dispatch(button("legacy:add:fiche".to_string())).await;

    assert_eq!(outcome, DispatchOutcome::Unrouted);
    assert_eq!(responder.private_messages().len(), 1);
    assert_eq!(harness.service.add_calls(), 0);
}

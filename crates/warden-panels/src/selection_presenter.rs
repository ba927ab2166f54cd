//! Single-choice editor picker used by the removal flow.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use warden_core::{
    DocumentTarget, InteractionEvent, InteractionPayload, InteractionResponder, PermissionRecord,
    PermissionService, SelectionOption, SelectionView, WorkflowError,
};

use crate::action_router::HandlerOutcome;
use crate::user_replies::{
    choose_editor, deliver_private, deliver_replacement, editor_removed, failure_reply, no_editors,
};

/// Value of the placeholder entry shown when a document has no editors.
pub const NO_EDITORS_VALUE: &str = "warden:none";
const NO_EDITORS_LABEL: &str = "Aucun éditeur trouvé";
/// Platform cap on options in one list.
const MAX_SELECTION_OPTIONS: usize = 25;
/// Platform cap on the characters of one option label.
const MAX_OPTION_LABEL_CHARS: usize = 100;
/// Consumed pickers remembered before the oldest are forgotten.
pub const CONSUMED_PICKER_CAP: usize = 1_024;

fn option_label(email: &str) -> String {
    if email.chars().count() <= MAX_OPTION_LABEL_CHARS {
        return email.to_string();
    }
    let mut label = email
        .chars()
        .take(MAX_OPTION_LABEL_CHARS - 1)
        .collect::<String>();
    label.push('…');
    label
}

/// Builds the picker: label is the email, value the permission id. An empty
/// input yields one disabled placeholder entry.
pub fn build_editor_selection(custom_id: &str, editors: &[PermissionRecord]) -> SelectionView {
    if editors.is_empty() {
        return SelectionView {
            custom_id: custom_id.to_string(),
            placeholder: NO_EDITORS_LABEL.to_string(),
            options: vec![SelectionOption {
                label: NO_EDITORS_LABEL.to_string(),
                value: NO_EDITORS_VALUE.to_string(),
            }],
            disabled: true,
        };
    }
    if editors.len() > MAX_SELECTION_OPTIONS {
        tracing::warn!(
            custom_id,
            editors = editors.len(),
            shown = MAX_SELECTION_OPTIONS,
            "editor list truncated to the selection cap"
        );
    }
    SelectionView {
        custom_id: custom_id.to_string(),
        placeholder: "Sélectionnez un éditeur".to_string(),
        options: editors
            .iter()
            .take(MAX_SELECTION_OPTIONS)
            .map(|record| SelectionOption {
                label: option_label(&record.email),
                value: record.id.clone(),
            })
            .collect(),
        disabled: false,
    }
}

#[derive(Default)]
struct ClaimSet {
    order: VecDeque<String>,
    index: HashSet<String>,
}

/// Presents editor pickers and performs the removal on selection.
///
/// A picker message is consumed by its first successful selection; replays
/// against the same message are acknowledged and ignored. Only the most
/// recent `capacity` pickers are remembered, so a replay on a picker older
/// than that would reach the service again (and fail there, the grant being
/// gone). Selections without a message id are keyed by user and permission
/// and only guarded while in flight.
pub struct SelectionPresenter {
    consumed: Mutex<ClaimSet>,
    capacity: usize,
}

impl Default for SelectionPresenter {
    fn default() -> Self {
        Self::with_capacity(CONSUMED_PICKER_CAP)
    }
}

impl SelectionPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            consumed: Mutex::new(ClaimSet::default()),
            capacity: capacity.max(1),
        }
    }

    /// Sends the picker as a private follow-up. The interaction must already
    /// be acknowledged.
    pub async fn present(
        &self,
        custom_id: &str,
        target: &DocumentTarget,
        editors: &[PermissionRecord],
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        let content = if editors.is_empty() {
            no_editors(&target.name)
        } else {
            choose_editor(&target.name)
        };
        let selection = build_editor_selection(custom_id, editors);
        match responder.send_private_selection(&content, &selection).await {
            Ok(()) => Ok(HandlerOutcome::SelectionPresented),
            Err(warden_core::ChatPlatformError::InteractionExpired) => {
                tracing::debug!(custom_id, "interaction expired before the picker was shown");
                Ok(HandlerOutcome::NoOp)
            }
            Err(error) => Err(error.into()),
        }
    }

    pub async fn on_selection(
        &self,
        target: &DocumentTarget,
        service: &dyn PermissionService,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        let InteractionPayload::Selection { values } = &event.payload else {
            return Err(WorkflowError::unexpected(format!(
                "selection {} received a {} event",
                event.custom_id,
                event.kind().as_str()
            )));
        };
        let [permission_id] = values.as_slice() else {
            responder.acknowledge_update().await?;
            return Ok(HandlerOutcome::Rejected);
        };
        if permission_id == NO_EDITORS_VALUE {
            responder.acknowledge_update().await?;
            return Ok(HandlerOutcome::NoOp);
        }

        let (claim, keep_claim) = match &event.message_id {
            Some(message_id) => (message_id.clone(), true),
            None => (
                format!("{}:{}:{}", event.custom_id, event.user_id, permission_id),
                false,
            ),
        };
        if !self.claim(&claim) {
            tracing::info!(
                custom_id = %event.custom_id,
                message_id = %claim,
                "ignoring selection on an already consumed picker"
            );
            responder.acknowledge_update().await?;
            return Ok(HandlerOutcome::NoOp);
        }
        if let Err(error) = responder.acknowledge_update().await {
            self.release(&claim);
            return Err(error.into());
        }

        match service.remove_editor(&target.file_id, permission_id).await {
            Ok(email) => {
                tracing::info!(
                    document = %target.name,
                    user_id = %event.user_id,
                    "editor access removed"
                );
                if !keep_claim {
                    self.release(&claim);
                }
                deliver_replacement(responder, &editor_removed(&email, &target.name)).await?;
                Ok(HandlerOutcome::Completed)
            }
            Err(error) => {
                self.release(&claim);
                let error = WorkflowError::from(error);
                tracing::warn!(
                    document = %target.name,
                    user_id = %event.user_id,
                    error = %error,
                    "editor removal failed"
                );
                deliver_private(responder, &failure_reply(&error)).await?;
                Ok(HandlerOutcome::Failed)
            }
        }
    }

    fn claim(&self, key: &str) -> bool {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if !consumed.index.insert(key.to_string()) {
            return false;
        }
        consumed.order.push_back(key.to_string());
        while consumed.order.len() > self.capacity {
            if let Some(oldest) = consumed.order.pop_front() {
                consumed.index.remove(&oldest);
            }
        }
        true
    }

    fn release(&self, key: &str) {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if consumed.index.remove(key) {
            consumed.order.retain(|entry| entry != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use warden_core::testing::{InMemoryPermissionService, RecordingResponder, ResponderCall};
    use warden_core::{
        DocumentTarget, InteractionEvent, InteractionPayload, PermissionRecord, PermissionRole,
        PermissionService,
    };

    use super::{build_editor_selection, SelectionPresenter, NO_EDITORS_VALUE};
    use crate::action_router::HandlerOutcome;

    fn editor(id: &str, email: &str) -> PermissionRecord {
        PermissionRecord {
            id: id.to_string(),
            email: email.to_string(),
            role: PermissionRole::Editor,
        }
    }

    fn selection_event(message_id: &str, values: &[&str]) -> InteractionEvent {
        InteractionEvent {
            custom_id: "warden:remove:fiche:select".to_string(),
            user_id: "user-1".to_string(),
            message_id: Some(message_id.to_string()),
            payload: InteractionPayload::Selection {
                values: values.iter().map(|value| value.to_string()).collect(),
            },
        }
    }

    fn target() -> DocumentTarget {
        DocumentTarget::new("fiche", "Fiche de Travail", "doc-fiche")
    }

    #[test]
    fn unit_selection_uses_email_labels_and_permission_id_values() {
        let view = build_editor_selection(
            "warden:remove:fiche:select",
            &[editor("p-1", "a@x.com"), editor("p-2", "b@x.com")],
        );
        assert!(!view.disabled);
        assert_eq!(view.options.len(), 2);
        assert_eq!(view.options[0].label, "a@x.com");
        assert_eq!(view.options[0].value, "p-1");
    }

    #[test]
    fn unit_empty_editor_list_renders_single_disabled_placeholder() {
        let view = build_editor_selection("warden:remove:fiche:select", &[]);
        assert!(view.disabled);
        assert_eq!(view.options.len(), 1);
        assert_eq!(view.options[0].value, NO_EDITORS_VALUE);
    }

    #[test]
    fn regression_long_email_label_is_truncated_to_platform_limit() {
        let email = format!("{}@example.org", "a".repeat(120));
        let view = build_editor_selection("warden:remove:fiche:select", &[editor("p-1", &email)]);
        let label = &view.options[0].label;
        assert_eq!(label.chars().count(), 100);
        assert!(label.ends_with('…'));
        assert_eq!(view.options[0].value, "p-1");
    }

    #[test]
    fn unit_selection_is_capped_at_platform_limit() {
        let editors = (0..30)
            .map(|index| editor(&format!("p-{index}"), &format!("user{index}@x.com")))
            .collect::<Vec<_>>();
        let view = build_editor_selection("warden:remove:fiche:select", &editors);
        assert_eq!(view.options.len(), 25);
    }

    #[tokio::test]
    async fn functional_placeholder_selection_is_a_no_op() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        let presenter = SelectionPresenter::new();
        let responder = RecordingResponder::new();
        let outcome = presenter
            .on_selection(
                &target(),
                &service,
                &selection_event("picker-1", &[NO_EDITORS_VALUE]),
                &responder,
            )
            .await
            .expect("selection");
        assert_eq!(outcome, HandlerOutcome::NoOp);
        assert_eq!(service.remove_calls(), 0);
        assert_eq!(responder.calls(), vec![ResponderCall::AcknowledgeUpdate]);
    }

    #[tokio::test]
    async fn functional_selection_removes_editor_and_replaces_picker() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        service.seed_permission("doc-fiche", editor("p-1", "a@x.com"));
        let presenter = SelectionPresenter::new();
        let responder = RecordingResponder::new();

        let outcome = presenter
            .on_selection(&target(), &service, &selection_event("picker-1", &["p-1"]), &responder)
            .await
            .expect("selection");
        assert_eq!(outcome, HandlerOutcome::Completed);
        let calls = responder.calls();
        assert_eq!(calls[0], ResponderCall::AcknowledgeUpdate);
        match &calls[1] {
            ResponderCall::ReplaceOriginal(content) => {
                assert!(content.contains("a@x.com"));
                assert!(content.contains("Fiche de Travail"));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn regression_replayed_selection_does_not_delete_twice() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        service.seed_permission("doc-fiche", editor("p-1", "a@x.com"));
        let presenter = SelectionPresenter::new();

        let first = RecordingResponder::new();
        presenter
            .on_selection(&target(), &service, &selection_event("picker-1", &["p-1"]), &first)
            .await
            .expect("first selection");
        let replay = RecordingResponder::new();
        let outcome = presenter
            .on_selection(&target(), &service, &selection_event("picker-1", &["p-1"]), &replay)
            .await
            .expect("replayed selection");

        assert_eq!(outcome, HandlerOutcome::NoOp);
        assert_eq!(service.remove_calls(), 1);
        assert_eq!(replay.calls(), vec![ResponderCall::AcknowledgeUpdate]);
    }

    #[tokio::test]
    async fn regression_failed_removal_keeps_picker_usable() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        service.seed_permission("doc-fiche", editor("p-1", "a@x.com"));
        service.set_unavailable(true);
        let presenter = SelectionPresenter::new();

        let responder = RecordingResponder::new();
        let outcome = presenter
            .on_selection(&target(), &service, &selection_event("picker-1", &["p-1"]), &responder)
            .await
            .expect("selection");
        assert_eq!(outcome, HandlerOutcome::Failed);
        assert!(responder.private_messages()[0].contains("Impossible de se connecter"));

        service.set_unavailable(false);
        let retry = RecordingResponder::new();
        let outcome = presenter
            .on_selection(&target(), &service, &selection_event("picker-1", &["p-1"]), &retry)
            .await
            .expect("retry");
        assert_eq!(outcome, HandlerOutcome::Completed);
    }

    #[tokio::test]
    async fn regression_consumed_pickers_are_bounded() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        for index in 0..3 {
            service.seed_permission("doc-fiche", editor(&format!("p-{index}"), "a@x.com"));
        }
        let presenter = SelectionPresenter::with_capacity(2);
        for (picker, permission) in [("picker-0", "p-0"), ("picker-1", "p-1"), ("picker-2", "p-2")] {
            let responder = RecordingResponder::new();
            let outcome = presenter
                .on_selection(
                    &target(),
                    &service,
                    &selection_event(picker, &[permission]),
                    &responder,
                )
                .await
                .expect("selection");
            assert_eq!(outcome, HandlerOutcome::Completed);
        }

        let consumed = presenter.consumed.lock().expect("consumed lock");
        assert_eq!(consumed.order.len(), 2);
        assert!(!consumed.index.contains("picker-0"));
        assert!(consumed.index.contains("picker-2"));
    }

    #[tokio::test]
    async fn regression_selection_without_message_does_not_block_later_removals() {
        let service = InMemoryPermissionService::new().with_document("doc-fiche");
        service.seed_permission("doc-fiche", editor("p-1", "a@x.com"));
        service.seed_permission("doc-fiche", editor("p-2", "b@x.com"));
        let presenter = SelectionPresenter::new();

        for permission in ["p-1", "p-2"] {
            let mut event = selection_event("unused", &[permission]);
            event.message_id = None;
            let responder = RecordingResponder::new();
            let outcome = presenter
                .on_selection(&target(), &service, &event, &responder)
                .await
                .expect("selection");
            assert_eq!(outcome, HandlerOutcome::Completed);
        }
        assert_eq!(service.remove_calls(), 2);
        assert!(service.list_editors("doc-fiche").await.expect("list").is_empty());
    }
}

//! Startup reconciliation of panel messages.
//!
//! For each panel: resolve the channel, look for the most recent message of
//! ours whose first embed carries the panel title, edit it in place or send a
//! fresh one. Runs once; a failure abandons that panel only.

use std::sync::Arc;

use thiserror::Error;
use warden_core::{ChannelMessage, ChatPlatformError, PanelChannels, PanelDefinition};

use crate::action_router::ActionRouter;

/// How far back the history scan looks for a previous panel.
pub const PANEL_HISTORY_LIMIT: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    Created { message_id: String },
    Updated { message_id: String },
    Skipped { reason: String },
}

impl PanelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Skipped { .. } => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelReport {
    pub channel_id: String,
    pub title: String,
    pub outcome: PanelOutcome,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Platform(#[from] ChatPlatformError),
    #[error("panel {title} has controls without a registered handler: {}", .custom_ids.join(", "))]
    UnregisteredControls {
        title: String,
        custom_ids: Vec<String>,
    },
}

/// First message, in the given most-recent-first order, authored by
/// `own_user_id` whose first embed title equals `title` exactly.
///
/// Older duplicates are left alone.
pub fn find_existing_panel<'a>(
    messages: &'a [ChannelMessage],
    own_user_id: &str,
    title: &str,
) -> Option<&'a ChannelMessage> {
    messages.iter().find(|message| {
        message.author_id == own_user_id && message.embed_title.as_deref() == Some(title)
    })
}

pub struct PanelReconciler {
    channels: Arc<dyn PanelChannels>,
    history_limit: u8,
}

impl PanelReconciler {
    pub fn new(channels: Arc<dyn PanelChannels>) -> Self {
        Self {
            channels,
            history_limit: PANEL_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: u8) -> Self {
        self.history_limit = history_limit.max(1);
        self
    }

    /// Brings one panel in line with its definition. Every control must be
    /// routable before the channel is touched.
    pub async fn reconcile(
        &self,
        router: &ActionRouter,
        own_user_id: &str,
        panel: &PanelDefinition,
    ) -> Result<PanelOutcome, ReconcileError> {
        let unregistered = router.unregistered_controls(panel);
        if !unregistered.is_empty() {
            return Err(ReconcileError::UnregisteredControls {
                title: panel.title.clone(),
                custom_ids: unregistered,
            });
        }

        self.channels.ensure_postable(&panel.channel_id).await?;
        let history = self
            .channels
            .recent_messages(&panel.channel_id, self.history_limit)
            .await?;
        match find_existing_panel(&history, own_user_id, &panel.title) {
            Some(existing) => {
                self.channels.edit_panel(panel, &existing.id).await?;
                Ok(PanelOutcome::Updated {
                    message_id: existing.id.clone(),
                })
            }
            None => {
                let message_id = self.channels.send_panel(panel).await?;
                Ok(PanelOutcome::Created { message_id })
            }
        }
    }

    /// Reconciles every panel independently and reports each outcome.
    pub async fn reconcile_all(
        &self,
        router: &ActionRouter,
        own_user_id: &str,
        panels: &[PanelDefinition],
    ) -> Vec<PanelReport> {
        let mut reports = Vec::with_capacity(panels.len());
        for panel in panels {
            let outcome = match self.reconcile(router, own_user_id, panel).await {
                Ok(outcome) => {
                    tracing::info!(
                        channel_id = %panel.channel_id,
                        panel = %panel.title,
                        outcome = outcome.as_str(),
                        "panel reconciled"
                    );
                    outcome
                }
                Err(error) => {
                    tracing::error!(
                        channel_id = %panel.channel_id,
                        panel = %panel.title,
                        error = %error,
                        "panel reconciliation skipped"
                    );
                    PanelOutcome::Skipped {
                        reason: error.to_string(),
                    }
                }
            };
            reports.push(PanelReport {
                channel_id: panel.channel_id.clone(),
                title: panel.title.clone(),
                outcome,
            });
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use warden_core::testing::RecordingChannels;
    use warden_core::{
        ChannelMessage, ControlStyle, InteractionEvent, InteractionKind, InteractionResponder,
        PanelControl, PanelDefinition, WorkflowError,
    };

    use super::{find_existing_panel, PanelOutcome, PanelReconciler, ReconcileError};
    use crate::action_router::{ActionHandler, ActionRouter, HandlerOutcome};

    const BOT: &str = "bot-1";

    struct NoopHandler;

    #[async_trait]
    impl ActionHandler for NoopHandler {
        async fn handle(
            &self,
            _event: &InteractionEvent,
            _responder: &dyn InteractionResponder,
        ) -> Result<HandlerOutcome, WorkflowError> {
            Ok(HandlerOutcome::NoOp)
        }
    }

    fn panel(channel_id: &str, title: &str) -> PanelDefinition {
        PanelDefinition {
            channel_id: channel_id.to_string(),
            title: title.to_string(),
            description: "Donnez l'accès en édition.".to_string(),
            colour: 0x2e_cc_71,
            controls: vec![PanelControl {
                custom_id: "warden:add:fiche".to_string(),
                label: "Fiche de Travail".to_string(),
                style: ControlStyle::Success,
            }],
        }
    }

    fn router() -> ActionRouter {
        let mut builder = ActionRouter::builder();
        builder
            .register(InteractionKind::Button, "warden:add:fiche", Arc::new(NoopHandler))
            .expect("register");
        builder.build()
    }

    fn message(id: &str, author: &str, title: Option<&str>) -> ChannelMessage {
        ChannelMessage {
            id: id.to_string(),
            author_id: author.to_string(),
            embed_title: title.map(str::to_string),
        }
    }

    #[test]
    fn unit_find_existing_panel_requires_own_author_and_exact_title() {
        let history = vec![
            message("5", "someone-else", Some("Panel - ADD")),
            message("4", BOT, Some("Panel - ADD (old)")),
            message("3", BOT, None),
            message("2", BOT, Some("Panel - ADD")),
            message("1", BOT, Some("Panel - ADD")),
        ];
        let found = find_existing_panel(&history, BOT, "Panel - ADD").expect("panel");
        assert_eq!(found.id, "2");
        assert!(find_existing_panel(&history, BOT, "Panel - COPY").is_none());
    }

    #[tokio::test]
    async fn functional_fresh_channel_gets_exactly_one_panel() {
        let channels = Arc::new(RecordingChannels::new(BOT).with_channel("c-add"));
        let reconciler = PanelReconciler::new(channels.clone());
        let outcome = reconciler
            .reconcile(&router(), BOT, &panel("c-add", "Panel - ADD"))
            .await
            .expect("reconcile");
        assert!(matches!(outcome, PanelOutcome::Created { .. }));
        assert_eq!(channels.sends(), 1);
        assert_eq!(channels.messages("c-add").len(), 1);
    }

    #[tokio::test]
    async fn functional_existing_panel_is_edited_in_place() {
        let channels = Arc::new(RecordingChannels::new(BOT).with_channel("c-add"));
        channels.seed_message("c-add", "member", None);
        let existing = channels.seed_message("c-add", BOT, Some("Panel - ADD"));
        channels.seed_message("c-add", "member", None);

        let reconciler = PanelReconciler::new(channels.clone());
        let outcome = reconciler
            .reconcile(&router(), BOT, &panel("c-add", "Panel - ADD"))
            .await
            .expect("reconcile");
        assert_eq!(outcome, PanelOutcome::Updated { message_id: existing });
        assert_eq!(channels.sends(), 0);
        assert_eq!(channels.edits(), 1);
        assert_eq!(channels.messages("c-add").len(), 3);
    }

    #[tokio::test]
    async fn regression_panel_beyond_history_window_is_not_found() {
        let channels = Arc::new(RecordingChannels::new(BOT).with_channel("c-add"));
        channels.seed_message("c-add", BOT, Some("Panel - ADD"));
        for _ in 0..3 {
            channels.seed_message("c-add", "member", None);
        }
        let reconciler = PanelReconciler::new(channels.clone()).with_history_limit(3);
        let outcome = reconciler
            .reconcile(&router(), BOT, &panel("c-add", "Panel - ADD"))
            .await
            .expect("reconcile");
        assert!(matches!(outcome, PanelOutcome::Created { .. }));
    }

    #[tokio::test]
    async fn regression_unregistered_controls_block_channel_io() {
        let channels = Arc::new(RecordingChannels::new(BOT).with_channel("c-add"));
        let reconciler = PanelReconciler::new(channels.clone());
        let empty_router = ActionRouter::builder().build();
        let error = reconciler
            .reconcile(&empty_router, BOT, &panel("c-add", "Panel - ADD"))
            .await
            .expect_err("unregistered controls");
        assert!(matches!(error, ReconcileError::UnregisteredControls { .. }));
        assert_eq!(channels.sends(), 0);
    }

    #[tokio::test]
    async fn regression_failing_panel_does_not_block_the_others() {
        let channels = Arc::new(
            RecordingChannels::new(BOT)
                .with_channel("c-add")
                .with_channel("c-denied"),
        );
        channels.deny_channel("c-denied");
        let reconciler = PanelReconciler::new(channels.clone());
        let reports = reconciler
            .reconcile_all(
                &router(),
                BOT,
                &[
                    panel("c-missing", "Panel - ADD"),
                    panel("c-denied", "Panel - ADD"),
                    panel("c-add", "Panel - ADD"),
                ],
            )
            .await;
        assert_eq!(reports.len(), 3);
        assert!(matches!(reports[0].outcome, PanelOutcome::Skipped { .. }));
        assert!(matches!(reports[1].outcome, PanelOutcome::Skipped { .. }));
        assert!(matches!(reports[2].outcome, PanelOutcome::Created { .. }));
        assert_eq!(channels.messages("c-add").len(), 1);
    }
}

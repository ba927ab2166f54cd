//! Identifier-keyed dispatch of interaction events.
//!
//! The route table is filled once at startup, before any panel message is
//! touched, and is read-only afterwards. Dispatch is the handler boundary:
//! errors and panics stop here and become a private failure reply.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use thiserror::Error;
use warden_core::{
    ChatPlatformError, FormView, InteractionEvent, InteractionKind, InteractionResponder,
    PanelDefinition, SelectionView, WorkflowError,
};

use crate::user_replies::{deliver_private, failure_reply, CONTROL_INACTIVE, GENERIC_FAILURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a handler did with an interaction.
pub enum HandlerOutcome {
    FormOpened,
    SelectionPresented,
    Completed,
    Rejected,
    Failed,
    NoOp,
}

impl HandlerOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FormOpened => "form_opened",
            Self::SelectionPresented => "selection_presented",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::NoOp => "no_op",
        }
    }
}

#[async_trait]
/// A handler bound to one or more control identifiers.
///
/// Handlers own their acknowledgment and their single reply.
pub trait ActionHandler: Send + Sync {
    async fn handle(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub kind: InteractionKind,
    pub custom_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("control {custom_id} is already registered for {kind} events")]
    DuplicateRoute { kind: &'static str, custom_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(HandlerOutcome),
    Unrouted,
    Failed,
}

#[derive(Default)]
pub struct ActionRouterBuilder {
    routes: HashMap<RouteKey, Arc<dyn ActionHandler>>,
}

impl ActionRouterBuilder {
    pub fn register(
        &mut self,
        kind: InteractionKind,
        custom_id: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<&mut Self, RouterError> {
        let key = RouteKey {
            kind,
            custom_id: custom_id.into(),
        };
        if self.routes.contains_key(&key) {
            return Err(RouterError::DuplicateRoute {
                kind: kind.as_str(),
                custom_id: key.custom_id,
            });
        }
        self.routes.insert(key, handler);
        Ok(self)
    }

    pub fn build(self) -> ActionRouter {
        ActionRouter {
            routes: self.routes,
        }
    }
}

pub struct ActionRouter {
    routes: HashMap<RouteKey, Arc<dyn ActionHandler>>,
}

impl ActionRouter {
    pub fn builder() -> ActionRouterBuilder {
        ActionRouterBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn is_registered(&self, kind: InteractionKind, custom_id: &str) -> bool {
        self.routes.contains_key(&RouteKey {
            kind,
            custom_id: custom_id.to_string(),
        })
    }

    /// Panel buttons that would not route if clicked.
    pub fn unregistered_controls(&self, panel: &PanelDefinition) -> Vec<String> {
        panel
            .control_ids()
            .filter(|custom_id| !self.is_registered(InteractionKind::Button, custom_id))
            .map(str::to_string)
            .collect()
    }

    pub async fn dispatch(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> DispatchOutcome {
        let kind = event.kind();
        let key = RouteKey {
            kind,
            custom_id: event.custom_id.clone(),
        };
        let Some(handler) = self.routes.get(&key) else {
            tracing::warn!(
                custom_id = %event.custom_id,
                kind = kind.as_str(),
                user_id = %event.user_id,
                "interaction does not match any registered control"
            );
            let tracked = TrackedResponder::new(responder);
            report_failure(&tracked, CONTROL_INACTIVE).await;
            return DispatchOutcome::Unrouted;
        };

        let tracked = TrackedResponder::new(responder);
        let result = AssertUnwindSafe(handler.handle(event, &tracked))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(outcome)) => {
                tracing::info!(
                    custom_id = %event.custom_id,
                    kind = kind.as_str(),
                    user_id = %event.user_id,
                    outcome = outcome.as_str(),
                    "interaction handled"
                );
                DispatchOutcome::Handled(outcome)
            }
            Ok(Err(error)) => {
                tracing::error!(
                    custom_id = %event.custom_id,
                    kind = kind.as_str(),
                    user_id = %event.user_id,
                    error = %error,
                    "interaction handler failed"
                );
                report_failure(&tracked, &failure_reply(&error)).await;
                DispatchOutcome::Failed
            }
            Err(panic) => {
                tracing::error!(
                    custom_id = %event.custom_id,
                    kind = kind.as_str(),
                    user_id = %event.user_id,
                    panic = panic_message(panic.as_ref()),
                    "interaction handler panicked"
                );
                report_failure(&tracked, GENERIC_FAILURE).await;
                DispatchOutcome::Failed
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Acknowledges the interaction if nobody did yet, then sends `content`.
async fn report_failure(responder: &TrackedResponder<'_>, content: &str) {
    if !responder.is_acknowledged() {
        if let Err(error) = responder.defer_private().await {
            tracing::warn!(error = %error, "failed to acknowledge interaction after handler failure");
            return;
        }
    }
    if let Err(error) = deliver_private(responder, content).await {
        tracing::warn!(error = %error, "failed to deliver failure reply");
    }
}

/// Remembers whether the wrapped responder already acknowledged the
/// interaction.
struct TrackedResponder<'a> {
    inner: &'a dyn InteractionResponder,
    acknowledged: AtomicBool,
}

impl<'a> TrackedResponder<'a> {
    fn new(inner: &'a dyn InteractionResponder) -> Self {
        Self {
            inner,
            acknowledged: AtomicBool::new(false),
        }
    }

    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    fn mark(&self, result: Result<(), ChatPlatformError>) -> Result<(), ChatPlatformError> {
        if result.is_ok() {
            self.acknowledged.store(true, Ordering::SeqCst);
        }
        result
    }
}

#[async_trait]
impl<'a> InteractionResponder for TrackedResponder<'a> {
    async fn open_form(&self, form: &FormView) -> Result<(), ChatPlatformError> {
        self.mark(self.inner.open_form(form).await)
    }

    async fn defer_private(&self) -> Result<(), ChatPlatformError> {
        self.mark(self.inner.defer_private().await)
    }

    async fn acknowledge_update(&self) -> Result<(), ChatPlatformError> {
        self.mark(self.inner.acknowledge_update().await)
    }

    async fn send_private(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.inner.send_private(content).await
    }

    async fn send_private_selection(
        &self,
        content: &str,
        selection: &SelectionView,
    ) -> Result<(), ChatPlatformError> {
        self.inner.send_private_selection(content, selection).await
    }

    async fn replace_original(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.inner.replace_original(content).await
    }
}

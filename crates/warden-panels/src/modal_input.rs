//! Modal input capture: short text forms with presence validation.

use std::collections::BTreeMap;
use std::future::Future;

use warden_core::{
    FormField, FormView, InteractionEvent, InteractionPayload, InteractionResponder, WorkflowError,
};

use crate::action_router::HandlerOutcome;
use crate::user_replies::{deliver_private, failure_reply, missing_field};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Submitted values, trimmed, blank entries dropped.
pub struct FormValues {
    values: BTreeMap<String, String>,
}

impl FormValues {
    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).map(String::as_str)
    }

    /// Value of a field already validated as required.
    pub fn value(&self, field_id: &str) -> &str {
        self.get(field_id).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ModalInput {
    view: FormView,
}

impl ModalInput {
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            view: FormView {
                custom_id: custom_id.into(),
                title: title.into(),
                fields: Vec::new(),
            },
        }
    }

    pub fn field(mut self, id: &str, label: &str, placeholder: &str, required: bool) -> Self {
        self.view.fields.push(FormField {
            id: id.to_string(),
            label: label.to_string(),
            placeholder: placeholder.to_string(),
            required,
        });
        self
    }

    pub fn view(&self) -> &FormView {
        &self.view
    }

    pub fn custom_id(&self) -> &str {
        &self.view.custom_id
    }

    pub async fn open(
        &self,
        responder: &dyn InteractionResponder,
    ) -> Result<HandlerOutcome, WorkflowError> {
        responder.open_form(&self.view).await?;
        Ok(HandlerOutcome::FormOpened)
    }

    /// Presence check only. Returns the label of the first missing required
    /// field.
    pub fn validate(&self, submitted: &BTreeMap<String, String>) -> Result<FormValues, String> {
        let mut values = BTreeMap::new();
        for field in &self.view.fields {
            let value = submitted
                .get(&field.id)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty());
            match value {
                Some(value) => {
                    values.insert(field.id.clone(), value.to_string());
                }
                None if field.required => return Err(field.label.clone()),
                None => {}
            }
        }
        Ok(FormValues { values })
    }

    /// Runs one submission: acknowledge privately, validate, call
    /// `completion`, then deliver exactly one private follow-up with either
    /// the completion's message or the failure text.
    pub async fn complete<F, Fut>(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
        completion: F,
    ) -> Result<HandlerOutcome, WorkflowError>
    where
        F: FnOnce(FormValues) -> Fut + Send,
        Fut: Future<Output = Result<String, WorkflowError>> + Send,
    {
        let InteractionPayload::FormSubmit { values } = &event.payload else {
            return Err(WorkflowError::unexpected(format!(
                "form {} received a {} event",
                self.view.custom_id,
                event.kind().as_str()
            )));
        };
        responder.defer_private().await?;

        let values = match self.validate(values) {
            Ok(values) => values,
            Err(label) => {
                deliver_private(responder, &missing_field(&label)).await?;
                return Ok(HandlerOutcome::Rejected);
            }
        };

        match completion(values).await {
            Ok(message) => {
                deliver_private(responder, &message).await?;
                Ok(HandlerOutcome::Completed)
            }
            Err(error) => {
                tracing::warn!(
                    form = %self.view.custom_id,
                    user_id = %event.user_id,
                    error = %error,
                    "form completion failed"
                );
                deliver_private(responder, &failure_reply(&error)).await?;
                Ok(HandlerOutcome::Failed)
            }
        }
    }
}

//! In-memory collaborators for exercising the panel engine without a chat
//! platform or a document service.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{ChatPlatformError, PermissionServiceError};
use crate::interaction::{FormView, InteractionResponder, SelectionView};
use crate::panel::PanelDefinition;
use crate::permission::{CopiedDocument, PermissionRecord, PermissionRole, PermissionService};
use crate::platform::{ChannelMessage, PanelChannels};

#[derive(Default)]
/// Document service double that validates emails the way the real service
/// does (it rejects anything without an `@`).
pub struct InMemoryPermissionService {
    documents: Mutex<BTreeMap<String, Vec<PermissionRecord>>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
    remove_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl InMemoryPermissionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document owned by `owner@warden.test`.
    pub fn with_document(self, document_id: &str) -> Self {
        let owner = PermissionRecord {
            id: format!("owner-{document_id}"),
            email: "owner@warden.test".to_string(),
            role: PermissionRole::Other("owner".to_string()),
        };
        self.documents
            .lock()
            .expect("documents lock")
            .insert(document_id.to_string(), vec![owner]);
        self
    }

    pub fn seed_permission(&self, document_id: &str, record: PermissionRecord) {
        self.documents
            .lock()
            .expect("documents lock")
            .entry(document_id.to_string())
            .or_default()
            .push(record);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn permissions(&self, document_id: &str) -> Vec<PermissionRecord> {
        self.documents
            .lock()
            .expect("documents lock")
            .get(document_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), PermissionServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PermissionServiceError::ServiceUnavailable(
                "service account credentials rejected".to_string(),
            ));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{id}")
    }
}

fn file_not_found(document_id: &str) -> PermissionServiceError {
    PermissionServiceError::RemoteError {
        status: 404,
        detail: format!("File not found: {document_id}."),
    }
}

#[async_trait]
impl PermissionService for InMemoryPermissionService {
    async fn list_editors(
        &self,
        document_id: &str,
    ) -> Result<Vec<PermissionRecord>, PermissionServiceError> {
        self.check_available()?;
        let documents = self.documents.lock().expect("documents lock");
        let records = documents
            .get(document_id)
            .ok_or_else(|| file_not_found(document_id))?;
        Ok(records
            .iter()
            .filter(|record| record.is_removable_editor())
            .cloned()
            .collect())
    }

    async fn add_editor(
        &self,
        document_id: &str,
        email: &str,
    ) -> Result<(), PermissionServiceError> {
        self.check_available()?;
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if !email.contains('@') {
            return Err(PermissionServiceError::RemoteError {
                status: 400,
                detail: "Invalid email or User ID".to_string(),
            });
        }
        let id = self.next_id("perm");
        let mut documents = self.documents.lock().expect("documents lock");
        let records = documents
            .get_mut(document_id)
            .ok_or_else(|| file_not_found(document_id))?;
        records.push(PermissionRecord {
            id,
            email: email.to_string(),
            role: PermissionRole::Editor,
        });
        Ok(())
    }

    async fn remove_editor(
        &self,
        document_id: &str,
        permission_id: &str,
    ) -> Result<String, PermissionServiceError> {
        self.check_available()?;
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.lock().expect("documents lock");
        let records = documents
            .get_mut(document_id)
            .ok_or_else(|| file_not_found(document_id))?;
        let position = records
            .iter()
            .position(|record| record.id == permission_id)
            .ok_or_else(|| PermissionServiceError::RemoteError {
                status: 404,
                detail: format!("Permission not found: {permission_id}."),
            })?;
        if !records[position].role.is_editor() {
            return Err(PermissionServiceError::RemoteError {
                status: 403,
                detail: format!(
                    "Permission {permission_id} has role '{}' and cannot be removed.",
                    records[position].role.as_service_str()
                ),
            });
        }
        Ok(records.remove(position).email)
    }

    async fn copy_document(
        &self,
        document_id: &str,
        new_name: &str,
    ) -> Result<CopiedDocument, PermissionServiceError> {
        self.check_available()?;
        let mut documents = self.documents.lock().expect("documents lock");
        if !documents.contains_key(document_id) {
            return Err(file_not_found(document_id));
        }
        let file_id = self.next_id("copy");
        documents.insert(file_id.clone(), Vec::new());
        let copy = CopiedDocument {
            link: format!("https://docs.google.com/document/d/{file_id}/edit"),
            name: new_name.to_string(),
            file_id,
        };
        Ok(copy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: String,
    pub author_id: String,
    pub embed_title: Option<String>,
    pub panel: Option<PanelDefinition>,
}

#[derive(Default)]
/// Channel double. Messages are kept oldest first per channel.
pub struct RecordingChannels {
    bot_user_id: String,
    channels: Mutex<BTreeMap<String, Vec<StoredMessage>>>,
    denied: Mutex<BTreeSet<String>>,
    next_id: AtomicU64,
    sends: AtomicUsize,
    edits: AtomicUsize,
}

impl RecordingChannels {
    pub fn new(bot_user_id: &str) -> Self {
        Self {
            bot_user_id: bot_user_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_channel(self, channel_id: &str) -> Self {
        self.channels
            .lock()
            .expect("channels lock")
            .insert(channel_id.to_string(), Vec::new());
        self
    }

    /// Channel exists but every read and write is refused.
    pub fn deny_channel(&self, channel_id: &str) {
        self.denied
            .lock()
            .expect("denied lock")
            .insert(channel_id.to_string());
    }

    pub fn seed_message(&self, channel_id: &str, author_id: &str, embed_title: Option<&str>) -> String {
        let id = self.allocate_id();
        self.channels
            .lock()
            .expect("channels lock")
            .entry(channel_id.to_string())
            .or_default()
            .push(StoredMessage {
                id: id.clone(),
                author_id: author_id.to_string(),
                embed_title: embed_title.map(str::to_string),
                panel: None,
            });
        id
    }

    pub fn messages(&self, channel_id: &str) -> Vec<StoredMessage> {
        self.channels
            .lock()
            .expect("channels lock")
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn edits(&self) -> usize {
        self.edits.load(Ordering::SeqCst)
    }

    fn allocate_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1_000).to_string()
    }

    fn check_access(&self, channel_id: &str) -> Result<(), ChatPlatformError> {
        if !self
            .channels
            .lock()
            .expect("channels lock")
            .contains_key(channel_id)
        {
            return Err(ChatPlatformError::ChannelUnavailable {
                channel_id: channel_id.to_string(),
                reason: "Unknown Channel".to_string(),
            });
        }
        if self.denied.lock().expect("denied lock").contains(channel_id) {
            return Err(ChatPlatformError::PermissionDenied {
                channel_id: channel_id.to_string(),
                reason: "Missing Access".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PanelChannels for RecordingChannels {
    async fn ensure_postable(&self, channel_id: &str) -> Result<(), ChatPlatformError> {
        if self
            .channels
            .lock()
            .expect("channels lock")
            .contains_key(channel_id)
        {
            Ok(())
        } else {
            Err(ChatPlatformError::ChannelUnavailable {
                channel_id: channel_id.to_string(),
                reason: "Unknown Channel".to_string(),
            })
        }
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, ChatPlatformError> {
        self.check_access(channel_id)?;
        Ok(self
            .messages(channel_id)
            .into_iter()
            .rev()
            .take(usize::from(limit))
            .map(|message| ChannelMessage {
                id: message.id,
                author_id: message.author_id,
                embed_title: message.embed_title,
            })
            .collect())
    }

    async fn send_panel(&self, panel: &PanelDefinition) -> Result<String, ChatPlatformError> {
        self.check_access(&panel.channel_id)?;
        self.sends.fetch_add(1, Ordering::SeqCst);
        let id = self.allocate_id();
        self.channels
            .lock()
            .expect("channels lock")
            .entry(panel.channel_id.clone())
            .or_default()
            .push(StoredMessage {
                id: id.clone(),
                author_id: self.bot_user_id.clone(),
                embed_title: Some(panel.title.clone()),
                panel: Some(panel.clone()),
            });
        Ok(id)
    }

    async fn edit_panel(
        &self,
        panel: &PanelDefinition,
        message_id: &str,
    ) -> Result<(), ChatPlatformError> {
        self.check_access(&panel.channel_id)?;
        let mut channels = self.channels.lock().expect("channels lock");
        let message = channels
            .get_mut(&panel.channel_id)
            .and_then(|messages| messages.iter_mut().find(|message| message.id == message_id))
            .ok_or_else(|| ChatPlatformError::Transport("Unknown Message".to_string()))?;
        message.embed_title = Some(panel.title.clone());
        message.panel = Some(panel.clone());
        self.edits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderCall {
    OpenForm(FormView),
    DeferPrivate,
    AcknowledgeUpdate,
    SendPrivate(String),
    SendPrivateSelection(String, SelectionView),
    ReplaceOriginal(String),
}

#[derive(Default)]
/// Records every response primitive a handler invokes.
pub struct RecordingResponder {
    calls: Mutex<Vec<ResponderCall>>,
    expired: AtomicBool,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every follow-up fail as if the interaction token had expired.
    pub fn expire(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ResponderCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Content of every private follow-up, in order.
    pub fn private_messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ResponderCall::SendPrivate(content)
                | ResponderCall::SendPrivateSelection(content, _) => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn last_selection(&self) -> Option<SelectionView> {
        self.calls().into_iter().rev().find_map(|call| match call {
            ResponderCall::SendPrivateSelection(_, selection) => Some(selection),
            _ => None,
        })
    }

    fn record(&self, call: ResponderCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn follow_up(&self, call: ResponderCall) -> Result<(), ChatPlatformError> {
        if self.expired.load(Ordering::SeqCst) {
            return Err(ChatPlatformError::InteractionExpired);
        }
        self.record(call);
        Ok(())
    }
}

#[async_trait]
impl InteractionResponder for RecordingResponder {
    async fn open_form(&self, form: &FormView) -> Result<(), ChatPlatformError> {
        self.record(ResponderCall::OpenForm(form.clone()));
        Ok(())
    }

    async fn defer_private(&self) -> Result<(), ChatPlatformError> {
        self.record(ResponderCall::DeferPrivate);
        Ok(())
    }

    async fn acknowledge_update(&self) -> Result<(), ChatPlatformError> {
        self.record(ResponderCall::AcknowledgeUpdate);
        Ok(())
    }

    async fn send_private(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.follow_up(ResponderCall::SendPrivate(content.to_string()))
    }

    async fn send_private_selection(
        &self,
        content: &str,
        selection: &SelectionView,
    ) -> Result<(), ChatPlatformError> {
        self.follow_up(ResponderCall::SendPrivateSelection(
            content.to_string(),
            selection.clone(),
        ))
    }

    async fn replace_original(&self, content: &str) -> Result<(), ChatPlatformError> {
        self.follow_up(ResponderCall::ReplaceOriginal(content.to_string()))
    }
}

//! Drive v3 permission and copy operations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use warden_core::{
    CopiedDocument, PermissionRecord, PermissionRole, PermissionService, PermissionServiceError,
};

use crate::service_account::AccessTokenSource;

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const LIST_FIELDS: &str = "nextPageToken,permissions(id,emailAddress,role,type)";
const GET_FIELDS: &str = "id,emailAddress,role";
const COPY_FIELDS: &str = "id,name,webViewLink";
const LIST_PAGE_SIZE: &str = "100";
const ERROR_DETAIL_MAX_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrivePermission {
    id: String,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    role: String,
}

impl DrivePermission {
    fn into_record(self) -> PermissionRecord {
        PermissionRecord {
            id: self.id,
            email: self.email_address.unwrap_or_default(),
            role: PermissionRole::from_service(&self.role),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrivePermissionList {
    #[serde(default)]
    permissions: Vec<DrivePermission>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Builds the HTTP client shared by the Drive client and the token source.
pub fn build_http_client(request_timeout_ms: u64) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static("warden-drive"),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_millis(request_timeout_ms.max(1)))
        .build()
        .context("failed to create drive http client")
}

#[derive(Clone)]
pub struct GoogleDriveClient {
    http: reqwest::Client,
    api_base: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GoogleDriveClient {
    pub fn new(http: reqwest::Client, api_base: &str, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn file_url(&self, document_id: &str, suffix: &str) -> String {
        format!("{}/files/{}{}", self.api_base, document_id.trim(), suffix)
    }

    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PermissionServiceError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await.map_err(|error| {
            PermissionServiceError::ServiceUnavailable(format!(
                "drive {operation} request failed: {error}"
            ))
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(operation, status = status.as_u16(), "drive request rejected");
        Err(PermissionServiceError::RemoteError {
            status: status.as_u16(),
            detail: drive_error_detail(&body),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PermissionServiceError> {
        let response = self.send(operation, request).await?;
        let status = response.status().as_u16();
        response
            .json::<T>()
            .await
            .map_err(|error| PermissionServiceError::RemoteError {
                status,
                detail: format!("failed to decode drive {operation} response: {error}"),
            })
    }
}

/// Extracts `error.message` from a Drive error payload, falling back to the
/// raw body.
fn drive_error_detail(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match message {
        Some(message) if !message.trim().is_empty() => message,
        _ if body.trim().is_empty() => "empty error response".to_string(),
        _ => truncate_for_error(body.trim(), ERROR_DETAIL_MAX_CHARS),
    }
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Only writer grants are removable; owners and other roles are refused
/// before anything is deleted.
fn not_an_editor_grant(record: &PermissionRecord) -> PermissionServiceError {
    PermissionServiceError::RemoteError {
        status: 403,
        detail: format!(
            "Permission {} has role '{}' and cannot be removed.",
            record.id,
            record.role.as_service_str()
        ),
    }
}

fn document_link(file_id: &str) -> String {
    format!("https://docs.google.com/document/d/{file_id}/edit")
}

#[async_trait]
impl PermissionService for GoogleDriveClient {
    async fn list_editors(
        &self,
        document_id: &str,
    ) -> Result<Vec<PermissionRecord>, PermissionServiceError> {
        let url = self.file_url(document_id, "/permissions");
        let mut editors = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("fields", LIST_FIELDS),
                ("supportsAllDrives", "true"),
                ("pageSize", LIST_PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: DrivePermissionList = self
                .send_json("permissions.list", self.http.get(&url).query(&query))
                .await?;
            editors.extend(
                page.permissions
                    .into_iter()
                    .map(DrivePermission::into_record)
                    .filter(PermissionRecord::is_removable_editor),
            );
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(editors)
    }

    async fn add_editor(
        &self,
        document_id: &str,
        email: &str,
    ) -> Result<(), PermissionServiceError> {
        let request = self
            .http
            .post(self.file_url(document_id, "/permissions"))
            .query(&[("sendNotificationEmail", "true"), ("supportsAllDrives", "true")])
            .json(&json!({
                "type": "user",
                "role": PermissionRole::Editor.as_service_str(),
                "emailAddress": email,
            }));
        self.send("permissions.create", request).await?;
        Ok(())
    }

    async fn remove_editor(
        &self,
        document_id: &str,
        permission_id: &str,
    ) -> Result<String, PermissionServiceError> {
        let url = self.file_url(document_id, &format!("/permissions/{}", permission_id.trim()));
        let permission: DrivePermission = self
            .send_json(
                "permissions.get",
                self.http
                    .get(&url)
                    .query(&[("fields", GET_FIELDS), ("supportsAllDrives", "true")]),
            )
            .await?;
        let record = permission.into_record();
        if !record.role.is_editor() {
            return Err(not_an_editor_grant(&record));
        }
        self.send(
            "permissions.delete",
            self.http.delete(&url).query(&[("supportsAllDrives", "true")]),
        )
        .await?;
        Ok(if record.email.is_empty() {
            record.id
        } else {
            record.email
        })
    }

    async fn copy_document(
        &self,
        document_id: &str,
        new_name: &str,
    ) -> Result<CopiedDocument, PermissionServiceError> {
        let request = self
            .http
            .post(self.file_url(document_id, "/copy"))
            .query(&[("fields", COPY_FIELDS), ("supportsAllDrives", "true")])
            .json(&json!({ "name": new_name }));
        let file: DriveFile = self.send_json("files.copy", request).await?;
        let link = file
            .web_view_link
            .filter(|link| !link.trim().is_empty())
            .unwrap_or_else(|| document_link(&file.id));
        Ok(CopiedDocument {
            file_id: file.id,
            name: file.name,
            link,
        })
    }
}

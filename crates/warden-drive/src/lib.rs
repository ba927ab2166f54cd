//! Google Drive v3 permission client.
//!
//! Implements [`warden_core::PermissionService`] over the Drive REST API,
//! authenticating with a service-account key exchanged for a short-lived
//! bearer token before every operation.

mod drive_client;
mod service_account;

pub use drive_client::{build_http_client, GoogleDriveClient, DEFAULT_DRIVE_API_BASE};
pub use service_account::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource,
    DEFAULT_TOKEN_URI, DRIVE_SCOPES,
};

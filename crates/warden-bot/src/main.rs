mod bootstrap_helpers;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use warden_core::PermissionService;
use warden_discord::run_discord_bot;
use warden_drive::{build_http_client, GoogleDriveClient, ServiceAccountTokenSource};
use warden_panels::PanelCatalog;

use crate::bootstrap_helpers::init_tracing;
use crate::config::{AppConfig, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).inspect_err(|error| {
        tracing::error!(error = %error, "configuration rejected");
    })?;
    run(config).await
}

async fn run(config: AppConfig) -> Result<()> {
    let http = build_http_client(config.http_timeout_ms)?;
    let tokens = Arc::new(ServiceAccountTokenSource::new(
        config.service_account.clone(),
        config.token_uri.clone(),
        http.clone(),
    ));
    let service: Arc<dyn PermissionService> = Arc::new(GoogleDriveClient::new(
        http,
        &config.drive_api_base,
        tokens,
    ));

    let catalog = PanelCatalog::new(config.documents.clone(), config.panel_targets.clone());
    let router = catalog
        .build_router(service)
        .context("failed to register panel controls")?;
    tracing::info!(
        documents = catalog.documents().len(),
        service_account = %config.service_account.client_email,
        "starting warden"
    );

    run_discord_bot(&config.discord_token, Arc::new(router), catalog.panels()).await
}

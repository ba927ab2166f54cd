//! Startup configuration, read once from flags, the environment and `.env`.

use clap::Parser;
use thiserror::Error;
use warden_core::DocumentTarget;
use warden_drive::{ServiceAccountKey, DEFAULT_DRIVE_API_BASE};
use warden_panels::PanelTargets;

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "warden",
    about = "Discord panels granting, revoking and duplicating Google Docs access",
    version
)]
pub(crate) struct Cli {
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true, help = "Discord bot token.")]
    pub discord_token: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_CREDENTIALS",
        hide_env_values = true,
        help = "Service-account JSON key used for the Drive API."
    )]
    pub google_credentials: Option<String>,

    #[arg(
        long,
        env = "FICHE_TRAVAIL_DOC_ID",
        help = "File id of the \"Fiche de Travail\" document."
    )]
    pub fiche_travail_doc_id: Option<String>,

    #[arg(long, env = "DIRECTION_DOC_ID", help = "File id of the \"Direction\" document.")]
    pub direction_doc_id: Option<String>,

    #[arg(
        long,
        env = "ADD_PANEL_CHANNEL_ID",
        help = "Channel hosting the add-editor panel."
    )]
    pub add_panel_channel_id: Option<String>,

    #[arg(
        long,
        env = "DELETE_PANEL_CHANNEL_ID",
        help = "Channel hosting the remove-editor panel."
    )]
    pub delete_panel_channel_id: Option<String>,

    #[arg(
        long,
        env = "COPY_PANEL_CHANNEL_ID",
        help = "Channel hosting the copy-document panel."
    )]
    pub copy_panel_channel_id: Option<String>,

    #[arg(
        long,
        env = "WARDEN_DRIVE_API_BASE",
        default_value = DEFAULT_DRIVE_API_BASE,
        help = "Base URL of the Drive v3 REST API."
    )]
    pub drive_api_base: String,

    #[arg(
        long,
        env = "WARDEN_TOKEN_URI",
        help = "OAuth token endpoint overriding the key's token_uri."
    )]
    pub token_uri: Option<String>,

    #[arg(
        long,
        env = "WARDEN_HTTP_TIMEOUT_MS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout in milliseconds for Drive and token requests."
    )]
    pub http_timeout_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("missing required configuration value {name}")]
    ConfigMissing { name: &'static str },
    #[error("invalid configuration value {name}: {reason}")]
    ConfigInvalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub(crate) struct AppConfig {
    pub discord_token: String,
    pub service_account: ServiceAccountKey,
    pub documents: Vec<DocumentTarget>,
    pub panel_targets: PanelTargets,
    pub drive_api_base: String,
    pub token_uri: Option<String>,
    pub http_timeout_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("discord_token", &"<redacted>")
            .field("service_account", &self.service_account)
            .field("documents", &self.documents)
            .field("panel_targets", &self.panel_targets)
            .field("drive_api_base", &self.drive_api_base)
            .field("token_uri", &self.token_uri)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .finish()
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::ConfigMissing { name })
}

fn required_channel(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    let value = required(value, name)?;
    match value.parse::<u64>() {
        Ok(id) if id > 0 => Ok(value),
        _ => Err(ConfigError::ConfigInvalid {
            name,
            reason: format!("'{value}' is not a channel id"),
        }),
    }
}

impl AppConfig {
    pub(crate) fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let discord_token = required(cli.discord_token, "DISCORD_TOKEN")?;
        let credentials = required(cli.google_credentials, "GOOGLE_CREDENTIALS")?;
        let service_account = ServiceAccountKey::from_json(&credentials).map_err(|error| {
            ConfigError::ConfigInvalid {
                name: "GOOGLE_CREDENTIALS",
                reason: error.to_string(),
            }
        })?;
        let fiche_travail = required(cli.fiche_travail_doc_id, "FICHE_TRAVAIL_DOC_ID")?;
        let direction = required(cli.direction_doc_id, "DIRECTION_DOC_ID")?;
        let panel_targets = PanelTargets {
            add_channel_id: required_channel(cli.add_panel_channel_id, "ADD_PANEL_CHANNEL_ID")?,
            remove_channel_id: required_channel(
                cli.delete_panel_channel_id,
                "DELETE_PANEL_CHANNEL_ID",
            )?,
            copy_channel_id: required_channel(cli.copy_panel_channel_id, "COPY_PANEL_CHANNEL_ID")?,
        };
        Ok(Self {
            discord_token,
            service_account,
            documents: vec![
                DocumentTarget::new("fiche", "Fiche de Travail", fiche_travail),
                DocumentTarget::new("direction", "Direction", direction),
            ],
            panel_targets,
            drive_api_base: cli.drive_api_base,
            token_uri: cli.token_uri.filter(|value| !value.trim().is_empty()),
            http_timeout_ms: cli.http_timeout_ms,
        })
    }
}

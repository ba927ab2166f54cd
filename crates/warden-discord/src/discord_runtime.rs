//! Gateway event handler and client bootstrap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Context as _;
use serenity::all::{
    Client, Context, EventHandler, GatewayIntents, Interaction, Message, Ready, UserId,
};
use serenity::async_trait;
use tracing::{debug, info, warn};
use warden_core::PanelDefinition;
use warden_panels::{ActionRouter, PanelOutcome, PanelReconciler};

use crate::discord_channels::SerenityPanelChannels;
use crate::discord_events::{component_event, modal_event, ping_reply};
use crate::discord_responder::SerenityResponder;

/// Routes gateway events into the panel engine.
pub struct WardenEventHandler {
    router: Arc<ActionRouter>,
    panels: Vec<PanelDefinition>,
    reconciled: AtomicBool,
    own_user_id: OnceLock<UserId>,
}

impl WardenEventHandler {
    pub fn new(router: Arc<ActionRouter>, panels: Vec<PanelDefinition>) -> Self {
        Self {
            router,
            panels,
            reconciled: AtomicBool::new(false),
            own_user_id: OnceLock::new(),
        }
    }

    fn is_own_message(&self, message: &Message) -> bool {
        self.own_user_id.get() == Some(&message.author.id)
    }
}

#[async_trait]
impl EventHandler for WardenEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            user_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "connected to discord"
        );
        let _ = self.own_user_id.set(ready.user.id);

        // Gateway resumes deliver `ready` again; panels are reconciled once per process.
        if self.reconciled.swap(true, Ordering::SeqCst) {
            debug!("panels already reconciled for this process");
            return;
        }

        let channels = Arc::new(SerenityPanelChannels::new(ctx.http.clone()));
        let reports = PanelReconciler::new(channels)
            .reconcile_all(&self.router, &ready.user.id.to_string(), &self.panels)
            .await;
        let skipped = reports
            .iter()
            .filter(|report| matches!(report.outcome, PanelOutcome::Skipped { .. }))
            .count();
        info!(
            panels = reports.len(),
            skipped, "panel reconciliation finished"
        );
    }

    async fn message(&self, ctx: Context, message: Message) {
        if self.is_own_message(&message) {
            return;
        }
        let Some(reply) = ping_reply(&message.content) else {
            return;
        };
        if let Err(error) = message.channel_id.say(&ctx.http, reply).await {
            warn!(
                channel_id = %message.channel_id,
                error = %error,
                "failed to answer ping"
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Component(component) => {
                let Some(event) = component_event(&component) else {
                    debug!(
                        custom_id = %component.data.custom_id,
                        "ignoring unsupported component kind"
                    );
                    return;
                };
                let responder = SerenityResponder::component(ctx.http.clone(), component);
                self.router.dispatch(&event, &responder).await;
            }
            Interaction::Modal(modal) => {
                let event = modal_event(&modal);
                let responder = SerenityResponder::modal(ctx.http.clone(), modal);
                self.router.dispatch(&event, &responder).await;
            }
            _ => {}
        }
    }
}

pub fn gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// Connects to the gateway and serves events until shutdown.
///
/// The router must already hold every control the panels carry.
pub async fn run_discord_bot(
    token: &str,
    router: Arc<ActionRouter>,
    panels: Vec<PanelDefinition>,
) -> anyhow::Result<()> {
    let mut client = Client::builder(token, gateway_intents())
        .event_handler(WardenEventHandler::new(router, panels))
        .await
        .context("failed to build discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    client
        .start()
        .await
        .context("discord gateway connection failed")
}

//! Discord adapter for the warden panel engine.
//!
//! Connects to the gateway with `serenity`, reconciles the panels once the
//! session is ready, answers `!ping`, and turns component and modal
//! interactions into platform-neutral events for the action router.

mod discord_channels;
mod discord_events;
mod discord_render;
mod discord_responder;
mod discord_runtime;

pub use discord_channels::SerenityPanelChannels;
pub use discord_events::{component_event, modal_event, ping_reply};
pub use discord_responder::SerenityResponder;
pub use discord_runtime::{gateway_intents, run_discord_bot, WardenEventHandler};

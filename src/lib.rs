//! # Moonshine Client - Session Reconciliation for a Browser RPG
//!
//! Client-side state layer for the Moonshine role-playing game. The server is authoritative
//! for everything; this crate keeps a local view of a duel and of the player's travel across
//! a location map consistent with it while giving immediate feedback between server replies.
//!
//! ## Features
//!
//! - **Duel State**: Every fight response is normalized into a complete [`combat::CombatSession`]
//!   that replaces the previous one whole; finished fights accept no further input.
//! - **Travel Countdown**: A local per-second countdown predicts arrival while a slower poll of
//!   the player's real position remains the only source of which cell is occupied.
//! - **Cancellable Timers**: Every poll and countdown is a [`poller::TimerHandle`]; closing a screen
//!   stops its timers and nothing is written afterwards.
//! - **Online Roster**: Slow background refresh of who is online.
//! - **Image Prefetch**: Location art is requested at most once per process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use moonshine_client::api::{credentials::Credentials, http::HttpGameApi};
//! use moonshine_client::config::Config;
//! use moonshine_client::travel::{MapScreen, TravelSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("moonshine.toml").await?;
//!     let credentials = Credentials::load(config.api.token_file.as_deref()).await;
//!     let api = Arc::new(HttpGameApi::new(&config.api, credentials));
//!
//!     let map = MapScreen::open(api, "wayward_pines", TravelSettings::from_config(&config)).await?;
//!     map.click_cell("12cell").await?;
//!     map.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`api`] - error type, endpoint traits, HTTP implementation and credentials
//! - [`combat`] - fight snapshot normalization and the duel state machine
//! - [`travel`] - map grid, player position and the travel countdown
//! - [`roster`] - online player list
//! - [`poller`] - cancellable periodic tasks
//! - [`prefetch`] - process-wide image prefetch deduplication
//! - [`config`] - configuration loading and defaults
//! - [`logutil`] - log-safe formatting helpers
//! - [`metrics`] - in-process counters

pub mod api;
pub mod combat;
pub mod config;
pub mod logutil;
pub mod metrics;
pub mod poller;
pub mod prefetch;
pub mod roster;
pub mod travel;

//! # Game API Boundary
//!
//! The server is the authoritative source for every piece of state this crate tracks. This
//! module defines the request/response seams the reconciliation layer consumes:
//!
//! - [`FightApi`] - current fight snapshot, attack submission, starting a fight
//! - [`TravelApi`] - map cells, cell movement, the player's own location record
//! - [`RosterApi`] - the online player list
//!
//! [`http::HttpGameApi`] implements all three over REST with a bearer credential
//! ([`credentials::Credentials`]). Tests substitute in-memory implementations.
//!
//! Every method returns a `Send` future so screens can drive them from spawned timer tasks.

pub mod credentials;
pub mod http;

use std::future::Future;

use thiserror::Error;

use crate::combat::FightPayload;
use crate::roster::OnlinePlayer;
use crate::travel::{Cell, MoveResponse, UserLocation};

/// Errors surfaced by the API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Wrapper around transport-level failures (connect, TLS, body read).
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status. `message` is the server's `{"error": ...}` text when present.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Only produced when `api.request_timeout_secs` is configured.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// No bearer token in the environment or the token file.
    #[error("no bearer credential available")]
    MissingCredential,
}

impl ApiError {
    /// Message suitable for showing to the player.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Timeout(_) => "The server did not answer in time".to_string(),
            ApiError::MissingCredential => "Not signed in".to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) => {
                "Unable to reach the game server".to_string()
            }
        }
    }

    /// True when the server answered and refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

/// Fight endpoints.
pub trait FightApi: Send + Sync {
    /// Current fight snapshot.
    fn fetch_fight(&self) -> impl Future<Output = Result<FightPayload, ApiError>> + Send;

    /// Resolve one round; the response has the same shape as [`FightApi::fetch_fight`].
    fn submit_attack(
        &self,
        attack_point: &str,
        defense_point: &str,
    ) -> impl Future<Output = Result<FightPayload, ApiError>> + Send;

    /// Attack a bot standing in the player's location, opening a new fight.
    fn engage_bot(&self, bot_slug: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Map and position endpoints.
pub trait TravelApi: Send + Sync {
    fn fetch_cells(
        &self,
        location_slug: &str,
    ) -> impl Future<Output = Result<Vec<Cell>, ApiError>> + Send;

    fn move_to_cell(
        &self,
        location_slug: &str,
        cell_slug: &str,
    ) -> impl Future<Output = Result<MoveResponse, ApiError>> + Send;

    /// The current user record, reduced to the fields that locate the player.
    fn fetch_user(&self) -> impl Future<Output = Result<UserLocation, ApiError>> + Send;
}

/// Online roster endpoint.
pub trait RosterApi: Send + Sync {
    fn fetch_online_players(
        &self,
    ) -> impl Future<Output = Result<Vec<OnlinePlayer>, ApiError>> + Send;
}

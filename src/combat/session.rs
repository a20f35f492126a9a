use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::watch;

use super::normalize::normalize;
use super::types::{CombatPhase, CombatSession};
use crate::api::{ApiError, FightApi};
use crate::logutil::escape_log;
use crate::metrics;

#[derive(Debug, Error)]
pub enum CombatError {
    #[error("no fight loaded")]
    NotLoaded,

    /// The fight has a winner; a new fight needs a fresh screen.
    #[error("fight is over")]
    Terminal,

    #[error("attack and defense points are both required")]
    MissingPoints,

    #[error("point '{0}' is not offered in this round")]
    UnknownPoint(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// # Duel Screen State
///
/// Owns one [`CombatSession`] and the single mutating operation on it. Every server response
/// is normalized into a new session and swapped in whole; on failure the previous session
/// stays in place untouched. Observers from [`CombatScreen::subscribe`] only ever see complete
/// sessions.
///
/// `submit_attack` takes `&mut self`, so a second submission cannot start while one is in
/// flight.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use moonshine_client::api::FightApi;
/// # use moonshine_client::combat::CombatScreen;
/// # async fn demo<A: FightApi>(api: Arc<A>) -> Result<(), moonshine_client::combat::CombatError> {
/// let mut screen = CombatScreen::new(api);
/// screen.load().await?;
/// screen.select_attack_point("head")?;
/// screen.select_defense_point("legs")?;
/// screen.attack().await?;
/// # Ok(())
/// # }
/// ```
pub struct CombatScreen<A> {
    api: Arc<A>,
    session: Option<Arc<CombatSession>>,
    updates: watch::Sender<Option<Arc<CombatSession>>>,
}

impl<A: FightApi> CombatScreen<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            api,
            session: None,
            updates,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.session
            .as_ref()
            .map_or(CombatPhase::Awaiting, |s| s.phase())
    }

    /// The current session, shared; it never changes after being handed out.
    pub fn session(&self) -> Option<Arc<CombatSession>> {
        self.session.clone()
    }

    /// Receive every whole-session replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CombatSession>>> {
        self.updates.subscribe()
    }

    /// Fetch the current fight. Allowed while awaiting or active; a finished fight is never
    /// reopened.
    pub async fn load(&mut self) -> Result<CombatPhase, CombatError> {
        if self.phase() == CombatPhase::Terminal {
            return Err(CombatError::Terminal);
        }
        let payload = self.api.fetch_fight().await.map_err(|e| {
            warn!("Failed to fetch fight: {}", e);
            e
        })?;
        let next = normalize(&payload, self.session.as_deref());
        debug!(
            "fight loaded: {} rounds, {} points",
            next.rounds.len(),
            next.available_points.len()
        );
        Ok(self.replace(next))
    }

    pub fn select_attack_point(&mut self, point: &str) -> Result<(), CombatError> {
        let mut next = self.selectable_copy(point)?;
        next.selected_attack_point = Some(point.to_string());
        self.replace(next);
        Ok(())
    }

    pub fn select_defense_point(&mut self, point: &str) -> Result<(), CombatError> {
        let mut next = self.selectable_copy(point)?;
        next.selected_defense_point = Some(point.to_string());
        self.replace(next);
        Ok(())
    }

    /// Submit the currently selected points.
    pub async fn attack(&mut self) -> Result<CombatPhase, CombatError> {
        let (attack, defense) = match self.session.as_deref() {
            Some(s) => (
                s.selected_attack_point.clone().unwrap_or_default(),
                s.selected_defense_point.clone().unwrap_or_default(),
            ),
            None => return Err(CombatError::NotLoaded),
        };
        self.submit_attack(&attack, &defense).await
    }

    /// Resolve one round on the server and replace the session with its answer.
    ///
    /// Points are not checked against `available_points`; the server decides. Refused locally,
    /// without a request, when no fight is loaded, the fight is over, or a point is empty.
    pub async fn submit_attack(
        &mut self,
        attack_point: &str,
        defense_point: &str,
    ) -> Result<CombatPhase, CombatError> {
        match self.phase() {
            CombatPhase::Awaiting => {
                metrics::inc_attacks_refused_locally();
                return Err(CombatError::NotLoaded);
            }
            CombatPhase::Terminal => {
                metrics::inc_attacks_refused_locally();
                return Err(CombatError::Terminal);
            }
            CombatPhase::Active => {}
        }
        if attack_point.is_empty() || defense_point.is_empty() {
            metrics::inc_attacks_refused_locally();
            return Err(CombatError::MissingPoints);
        }

        metrics::inc_attacks_submitted();
        let payload = match self.api.submit_attack(attack_point, defense_point).await {
            Ok(payload) => payload,
            Err(e) => {
                metrics::inc_attacks_failed();
                warn!(
                    "Attack {}/{} failed: {}",
                    escape_log(attack_point),
                    escape_log(defense_point),
                    e
                );
                return Err(e.into());
            }
        };

        let next = normalize(&payload, self.session.as_deref());
        if let Some(winner) = &next.winner {
            info!("Fight finished, winner: {}", escape_log(&winner.name));
        }
        Ok(self.replace(next))
    }

    fn selectable_copy(&self, point: &str) -> Result<CombatSession, CombatError> {
        let current = self.session.as_deref().ok_or(CombatError::NotLoaded)?;
        if current.is_terminal() {
            return Err(CombatError::Terminal);
        }
        if !current.has_point(point) {
            return Err(CombatError::UnknownPoint(point.to_string()));
        }
        Ok(current.clone())
    }

    fn replace(&mut self, next: CombatSession) -> CombatPhase {
        let phase = next.phase();
        let next = Arc::new(next);
        self.session = Some(next.clone());
        self.updates.send_replace(Some(next));
        phase
    }
}

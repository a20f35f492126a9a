use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::{resolve_player_cell, target_display_name, Cell, CellGrid, UserLocation};
use crate::api::{ApiError, TravelApi};
use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics;
use crate::poller::{self, FirstRun, TimerHandle};

/// Server answer to a move request. A `null` body (already there) decodes to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveResponse {
    pub message: Option<String>,
    pub path_length: i64,
    pub target_cell: Option<String>,
    pub time_per_cell: Option<i64>,
}

#[derive(Debug, Error)]
pub enum TravelError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TravelError {
    pub fn user_message(&self) -> String {
        match self {
            TravelError::Api(e) => e.user_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TravelPhase {
    #[default]
    Idle,
    /// A move request is in flight.
    Pending,
    /// The server accepted a move; the local countdown is running.
    Counting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movement {
    /// Display name of the destination.
    pub target_cell: String,
    pub target_slug: String,
    pub total_time_seconds: u64,
}

/// Map screen state. `player_cell_slug` is only ever written from server responses;
/// `movement` and `remaining_time_seconds` are the local prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelState {
    pub phase: TravelPhase,
    pub grid: CellGrid,
    pub player_cell_slug: Option<String>,
    pub movement: Option<Movement>,
    pub remaining_time_seconds: u64,
}

impl TravelState {
    pub fn is_player_here(&self, cell: &Cell) -> bool {
        self.player_cell_slug.as_deref() == Some(cell.slug.as_str())
    }

    /// One countdown step. The tick that takes the countdown to zero clears the movement.
    fn tick(&mut self) -> Tick {
        if self.movement.is_none() {
            return Tick::Stale;
        }
        if self.remaining_time_seconds <= 1 {
            self.remaining_time_seconds = 0;
            self.movement = None;
            self.phase = TravelPhase::Idle;
            Tick::Expired
        } else {
            self.remaining_time_seconds -= 1;
            Tick::Counting
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Counting,
    Expired,
    Stale,
}

enum CountdownStep {
    Continue,
    Stop,
    Arrived(Result<UserLocation, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    AlreadyHere,
    /// Another move is pending or counting down.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing was sent.
    Ignored(IgnoreReason),
    /// Accepted with a travel time; the countdown is running.
    Started(Movement),
    /// Accepted with no travel time.
    Arrived,
}

#[derive(Debug, Clone)]
pub struct TravelSettings {
    pub position_interval: Duration,
    pub countdown_tick: Duration,
    pub default_time_per_cell: u64,
    /// Location slug → cell the player occupies while the server reports the bare location.
    pub default_cells: HashMap<String, String>,
}

impl Default for TravelSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl TravelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            position_interval: Duration::from_millis(config.polling.position_interval_ms),
            countdown_tick: Duration::from_millis(config.polling.countdown_tick_ms),
            default_time_per_cell: config.travel.default_time_per_cell,
            default_cells: config.travel.default_cells.clone(),
        }
    }
}

/// Read-only view of a map screen's state, usable after the screen is gone.
#[derive(Debug, Clone)]
pub struct TravelObserver {
    state: Arc<Mutex<TravelState>>,
}

impl TravelObserver {
    pub fn snapshot(&self) -> TravelState {
        lock(&self.state).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a `Pending` map to `Idle` if the click future is dropped before the move response
/// has been applied.
struct PendingGuard<'a> {
    state: &'a Mutex<TravelState>,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a Mutex<TravelState>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = lock(self.state);
            if state.phase == TravelPhase::Pending {
                state.phase = TravelPhase::Idle;
            }
        }
    }
}

struct MapShared<A> {
    api: Arc<A>,
    location_slug: String,
    default_cells: HashMap<String, String>,
    state: Arc<Mutex<TravelState>>,
}

impl<A: TravelApi> MapShared<A> {
    fn apply_user(&self, user: &UserLocation) {
        let slug = resolve_player_cell(&self.location_slug, user, &self.default_cells);
        let mut state = lock(&self.state);
        if state.player_cell_slug.as_deref() != Some(slug.as_str()) {
            debug!(
                "player position on {}: {}",
                self.location_slug,
                escape_log(&slug)
            );
            state.player_cell_slug = Some(slug);
        }
        // the server is authoritative: arrival ends any countdown still running
        let arrived = state
            .movement
            .as_ref()
            .is_some_and(|m| state.player_cell_slug.as_deref() == Some(m.target_slug.as_str()));
        if arrived {
            debug!(
                "arrival confirmed with {}s left on the countdown",
                state.remaining_time_seconds
            );
            state.movement = None;
            state.remaining_time_seconds = 0;
            state.phase = TravelPhase::Idle;
            metrics::inc_countdowns_corrected();
        }
    }

    async fn refetch_position(&self) -> Result<(), ApiError> {
        let user = self.api.fetch_user().await?;
        self.apply_user(&user);
        Ok(())
    }
}

/// # Map Screen
///
/// Owns a location's [`TravelState`] for as long as the map is displayed.
///
/// Two independent timers run against it:
/// - the **position poll** (every `position_interval`, 2s by default) is the only writer of
///   `player_cell_slug`;
/// - the **countdown** (every `countdown_tick`, 1s) runs only while a move is counting down
///   and decrements `remaining_time_seconds`. When it reaches zero the movement is cleared
///   and one extra position fetch is made.
///
/// The countdown is advisory and never decides which cell is occupied. Whichever timer fires
/// last wins: a poll that reports the player already standing on the target ends the countdown
/// early, so the prediction never outlives the server's arrival by more than one poll interval.
///
/// [`MapScreen::close`] cancels both timers and waits for them; dropping the screen aborts
/// them. No state changes after either.
pub struct MapScreen<A: TravelApi + 'static> {
    shared: Arc<MapShared<A>>,
    settings: TravelSettings,
    position_poll: Option<TimerHandle>,
    countdown: Mutex<Option<TimerHandle>>,
}

impl<A: TravelApi + 'static> MapScreen<A> {
    /// Load the location's cells and start polling the player's position. Must be called
    /// from within a Tokio runtime.
    pub async fn open(
        api: Arc<A>,
        location_slug: &str,
        settings: TravelSettings,
    ) -> Result<Self, TravelError> {
        let cells = api.fetch_cells(location_slug).await.map_err(|e| {
            warn!(
                "Error loading cells for {}: {}",
                escape_log(location_slug),
                e
            );
            e
        })?;
        let grid = CellGrid::from_cells(cells);
        info!(
            "Map {} opened with {} cells",
            escape_log(location_slug),
            grid.len()
        );

        let shared = Arc::new(MapShared {
            api,
            location_slug: location_slug.to_string(),
            default_cells: settings.default_cells.clone(),
            state: Arc::new(Mutex::new(TravelState {
                grid,
                ..TravelState::default()
            })),
        });

        let fetch_shared = shared.clone();
        let apply_shared = shared.clone();
        let position_poll = poller::poll(
            &format!("position:{}", location_slug),
            settings.position_interval,
            move || {
                let shared = fetch_shared.clone();
                async move { shared.api.fetch_user().await }
            },
            move |user: UserLocation| apply_shared.apply_user(&user),
        );

        Ok(Self {
            shared,
            settings,
            position_poll: Some(position_poll),
            countdown: Mutex::new(None),
        })
    }

    pub fn location_slug(&self) -> &str {
        &self.shared.location_slug
    }

    pub fn snapshot(&self) -> TravelState {
        lock(&self.shared.state).clone()
    }

    pub fn observer(&self) -> TravelObserver {
        TravelObserver {
            state: self.shared.state.clone(),
        }
    }

    /// Ask the server to move the player to `cell_slug`.
    ///
    /// Ignored without a request when the player already stands there or another move is
    /// pending or counting down. On rejection the state returns to idle and the server's
    /// message is in the error.
    pub async fn click_cell(&self, cell_slug: &str) -> Result<MoveOutcome, TravelError> {
        {
            let mut state = lock(&self.shared.state);
            if state.phase != TravelPhase::Idle {
                metrics::inc_moves_ignored();
                return Ok(MoveOutcome::Ignored(IgnoreReason::Busy));
            }
            if state.player_cell_slug.as_deref() == Some(cell_slug) {
                metrics::inc_moves_ignored();
                return Ok(MoveOutcome::Ignored(IgnoreReason::AlreadyHere));
            }
            state.phase = TravelPhase::Pending;
        }
        let mut pending = PendingGuard::new(&self.shared.state);

        let response = match self
            .shared
            .api
            .move_to_cell(&self.shared.location_slug, cell_slug)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                drop(pending);
                metrics::inc_moves_rejected();
                warn!("Error moving to cell {}: {}", escape_log(cell_slug), e);
                return Err(e.into());
            }
        };

        let outcome = if response.path_length > 0 {
            let per_cell = response
                .time_per_cell
                .filter(|t| *t > 0)
                .map_or(self.settings.default_time_per_cell, |t| t as u64);
            let movement = Movement {
                target_cell: target_display_name(response.target_cell.as_deref(), cell_slug),
                target_slug: cell_slug.to_string(),
                total_time_seconds: (response.path_length as u64).saturating_mul(per_cell),
            };
            {
                let mut state = lock(&self.shared.state);
                state.remaining_time_seconds = movement.total_time_seconds;
                state.movement = Some(movement.clone());
                state.phase = TravelPhase::Counting;
            }
            let handle = self.start_countdown();
            let stale = lock(&self.countdown).replace(handle);
            drop(stale);
            metrics::inc_moves_started();
            info!(
                "Moving to {} ({} cells, {}s)",
                escape_log(&movement.target_cell),
                response.path_length,
                movement.total_time_seconds
            );
            MoveOutcome::Started(movement)
        } else {
            lock(&self.shared.state).phase = TravelPhase::Idle;
            MoveOutcome::Arrived
        };
        pending.disarm();

        if let Err(e) = self.shared.refetch_position().await {
            warn!("Position refresh after move failed: {}", e);
        }
        Ok(outcome)
    }

    fn start_countdown(&self) -> TimerHandle {
        let step_shared = self.shared.clone();
        let apply_shared = self.shared.clone();
        poller::spawn_loop(
            &format!("countdown:{}", self.shared.location_slug),
            self.settings.countdown_tick,
            FirstRun::AfterInterval,
            move || {
                let shared = step_shared.clone();
                async move {
                    let tick = lock(&shared.state).tick();
                    match tick {
                        Tick::Counting => CountdownStep::Continue,
                        Tick::Stale => CountdownStep::Stop,
                        Tick::Expired => {
                            metrics::inc_countdowns_expired();
                            CountdownStep::Arrived(shared.api.fetch_user().await)
                        }
                    }
                }
            },
            move |step| match step {
                CountdownStep::Continue => ControlFlow::Continue(()),
                CountdownStep::Stop => ControlFlow::Break(()),
                CountdownStep::Arrived(Ok(user)) => {
                    apply_shared.apply_user(&user);
                    ControlFlow::Break(())
                }
                CountdownStep::Arrived(Err(e)) => {
                    warn!("Position refresh after countdown failed: {}", e);
                    ControlFlow::Break(())
                }
            },
        )
    }

    /// Stop both timers and wait until they have exited.
    pub async fn close(mut self) {
        let countdown = lock(&self.countdown).take();
        for timer in self.position_poll.take().into_iter().chain(countdown) {
            debug!("stopping timer '{}'", timer.name());
            timer.cancel().await;
        }
        info!("Map {} closed", escape_log(&self.shared.location_slug));
    }
}

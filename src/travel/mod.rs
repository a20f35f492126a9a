//! # Travel Countdown Synchronization
//!
//! Moving between cells of a location's 8×8 map. The server computes the path and its cost
//! (path length × seconds per cell); the client shows a local countdown between polls of the
//! player's real position.
//!
//! - [`grid`] - cells, grid slots, player cell resolution
//! - [`predictor`] - [`MapScreen`] with the `Idle → Pending → Counting → Idle` machine
//!
//! The server always wins: the position poll is the sole source of which cell is occupied,
//! and the countdown is only a prediction that is reconciled within one poll interval.

pub mod grid;
pub mod predictor;

pub use grid::{
    grid_index, resolve_player_cell, target_display_name, Cell, CellGrid, LocationRef,
    UserLocation, GRID_SIDE, GRID_SLOTS,
};
pub use predictor::{
    IgnoreReason, MapScreen, MoveOutcome, MoveResponse, Movement, TravelError, TravelObserver,
    TravelPhase, TravelSettings, TravelState,
};

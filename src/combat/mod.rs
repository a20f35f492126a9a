//! # Combat Session Synchronization
//!
//! Turn-based duels against bots or other players. The server resolves every round; the
//! client keeps the last snapshot it was given and the player's attack/defense selections.
//!
//! - [`types`] - raw payload shapes and the defaulted [`CombatSession`]
//! - [`normalize`](mod@normalize) - payload → session, pure and idempotent
//! - [`session`] - [`CombatScreen`], the `Awaiting → Active → Terminal` state machine
//!
//! ## Reconciliation
//!
//! Round history, current HP and the winner depend on each other, so the session is never
//! patched field by field. Each response becomes a fresh [`CombatSession`] behind an `Arc`
//! and replaces the old one in a single assignment. A failed request replaces nothing.

pub mod normalize;
pub mod session;
pub mod types;

pub use normalize::{normalize, repair_selection};
pub use session::{CombatError, CombatScreen};
pub use types::{
    progress_percent, CombatPhase, CombatSession, DroppedItem, FightPayload, Fighter, ImageRef,
    RawFight, RawFighter, RoundRecord, WinnerKind,
};

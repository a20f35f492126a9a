//! Process-wide counters for the reconciliation layer.
//! Cheap atomics for the fixed events, plus per-poller tallies keyed by poll name.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

static ATTACKS_SUBMITTED: AtomicU64 = AtomicU64::new(0);
static ATTACKS_FAILED: AtomicU64 = AtomicU64::new(0);
static ATTACKS_REFUSED_LOCALLY: AtomicU64 = AtomicU64::new(0);
static MOVES_STARTED: AtomicU64 = AtomicU64::new(0);
static MOVES_REJECTED: AtomicU64 = AtomicU64::new(0);
static MOVES_IGNORED: AtomicU64 = AtomicU64::new(0);
static COUNTDOWNS_EXPIRED: AtomicU64 = AtomicU64::new(0);
static COUNTDOWNS_CORRECTED: AtomicU64 = AtomicU64::new(0);

static POLL_COUNTERS: OnceLock<Mutex<HashMap<String, PollCounter>>> = OnceLock::new();

pub fn inc_attacks_submitted() {
    ATTACKS_SUBMITTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_attacks_failed() {
    ATTACKS_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_attacks_refused_locally() {
    ATTACKS_REFUSED_LOCALLY.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_moves_started() {
    MOVES_STARTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_moves_rejected() {
    MOVES_REJECTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_moves_ignored() {
    MOVES_IGNORED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_countdowns_expired() {
    COUNTDOWNS_EXPIRED.fetch_add(1, Ordering::Relaxed);
}
/// The server reported arrival before the local countdown ran out.
pub fn inc_countdowns_corrected() {
    COUNTDOWNS_CORRECTED.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollCounter {
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
}

fn poll_counter_lock() -> &'static Mutex<HashMap<String, PollCounter>> {
    POLL_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_poll_success(name: &str) -> PollCounter {
    let mut guard = poll_counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let counter = guard.entry(name.to_string()).or_default();
    counter.successes = counter.successes.saturating_add(1);
    counter.consecutive_failures = 0;
    *counter
}

pub fn record_poll_failure(name: &str) -> PollCounter {
    let mut guard = poll_counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let counter = guard.entry(name.to_string()).or_default();
    counter.failures = counter.failures.saturating_add(1);
    counter.consecutive_failures = counter.consecutive_failures.saturating_add(1);
    *counter
}

pub fn poll_counters_snapshot() -> HashMap<String, PollCounter> {
    poll_counter_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub attacks_submitted: u64,
    pub attacks_failed: u64,
    pub attacks_refused_locally: u64,
    pub moves_started: u64,
    pub moves_rejected: u64,
    pub moves_ignored: u64,
    pub countdowns_expired: u64,
    pub countdowns_corrected: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        attacks_submitted: ATTACKS_SUBMITTED.load(Ordering::Relaxed),
        attacks_failed: ATTACKS_FAILED.load(Ordering::Relaxed),
        attacks_refused_locally: ATTACKS_REFUSED_LOCALLY.load(Ordering::Relaxed),
        moves_started: MOVES_STARTED.load(Ordering::Relaxed),
        moves_rejected: MOVES_REJECTED.load(Ordering::Relaxed),
        moves_ignored: MOVES_IGNORED.load(Ordering::Relaxed),
        countdowns_expired: COUNTDOWNS_EXPIRED.load(Ordering::Relaxed),
        countdowns_corrected: COUNTDOWNS_CORRECTED.load(Ordering::Relaxed),
    }
}

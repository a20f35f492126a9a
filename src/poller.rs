//! # Authoritative Poller
//!
//! Periodic refresh against the server. [`poll`] runs a fetch immediately and then once per
//! interval; successful results are handed to the owner's callback, failures are logged and
//! otherwise ignored so the previous state stays visible. There is no backoff: the next
//! scheduled tick is the retry.
//!
//! Every timer started here is owned through a [`TimerHandle`]. The owner cancels it exactly
//! once with [`TimerHandle::cancel`], which consumes the handle and waits for the loop to exit;
//! after it returns the callback is never invoked again. Dropping the handle also stops the
//! loop, so a screen that forgets to cancel cannot leak a timer into a destroyed view.

use std::fmt::Display;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::metrics;

/// When the first iteration of a timer loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRun {
    Immediately,
    AfterInterval,
}

/// Cancellation handle for a running timer loop.
#[derive(Debug)]
pub struct TimerHandle {
    name: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the loop has exited, either by cancellation or on its own.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the loop and wait for it to exit. An in-flight fetch is abandoned.
    pub async fn cancel(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("timer '{}' ended abnormally: {}", self.name, e);
                }
            }
        }
        debug!("timer '{}' cancelled", self.name);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Poll `fetch` immediately and then every `interval`, passing each success to `on_success`.
pub fn poll<T, E, F, Fut, S>(
    name: &str,
    interval: Duration,
    mut fetch: F,
    mut on_success: S,
) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    S: FnMut(T) + Send + 'static,
{
    let poll_name = name.to_string();
    spawn_loop(
        name,
        interval,
        FirstRun::Immediately,
        move || fetch(),
        move |result: Result<T, E>| {
            match result {
                Ok(data) => {
                    metrics::record_poll_success(&poll_name);
                    on_success(data);
                }
                Err(e) => {
                    let counter = metrics::record_poll_failure(&poll_name);
                    warn!(
                        "poll '{}' failed ({} in a row): {}",
                        poll_name, counter.consecutive_failures, e
                    );
                }
            }
            ControlFlow::Continue(())
        },
    )
}

/// Generic timer loop. Each iteration waits for the next tick, runs `step`, and hands its
/// output to `apply`; a `Break` from `apply` ends the loop. Cancellation is observed both
/// while waiting for a tick and while `step` is pending, so `apply` never runs after
/// [`TimerHandle::cancel`] has been requested.
pub fn spawn_loop<F, Fut, H>(
    name: &str,
    interval: Duration,
    first: FirstRun,
    mut step: F,
    mut apply: H,
) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send,
    H: FnMut(Fut::Output) -> ControlFlow<()> + Send + 'static,
{
    let period = interval.max(Duration::from_millis(1));
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let task_name = name.to_string();

    let task = tokio::spawn(async move {
        let start = match first {
            FirstRun::Immediately => Instant::now(),
            FirstRun::AfterInterval => Instant::now() + period,
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
            }
            let output = tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                output = step() => output,
            };
            if apply(output).is_break() {
                break;
            }
        }
        debug!("timer '{}' loop exited", task_name);
    });

    TimerHandle {
        name: name.to_string(),
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

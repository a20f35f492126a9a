//! Online player roster, refreshed on a slow poll (30s by default).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::RosterApi;
use crate::poller::{self, TimerHandle};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlinePlayer {
    pub id: String,
    pub name: String,
    pub level: i64,
}

/// Latest known list of online players. The list is replaced whole on each successful poll
/// and kept as is when a poll fails.
pub struct OnlineRoster {
    players: Arc<Mutex<Arc<Vec<OnlinePlayer>>>>,
    self_id: Option<String>,
    poll: Option<TimerHandle>,
}

impl OnlineRoster {
    /// Start polling. `self_id` is the local player's id, used by [`OnlineRoster::is_messageable`].
    pub fn start<A>(api: Arc<A>, interval: Duration, self_id: Option<String>) -> Self
    where
        A: RosterApi + 'static,
    {
        let players = Arc::new(Mutex::new(Arc::new(Vec::new())));
        let sink = players.clone();
        let poll = poller::poll(
            "online-players",
            interval,
            move || {
                let api = api.clone();
                async move { api.fetch_online_players().await }
            },
            move |list: Vec<OnlinePlayer>| {
                debug!("{} players online", list.len());
                *sink.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(list);
            },
        );
        Self {
            players,
            self_id,
            poll: Some(poll),
        }
    }

    pub fn players(&self) -> Arc<Vec<OnlinePlayer>> {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Players cannot address messages to themselves.
    pub fn is_messageable(&self, player: &OnlinePlayer) -> bool {
        self.self_id.as_deref() != Some(player.id.as_str())
    }

    pub async fn stop(mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FlakyRoster {
        calls: AtomicUsize,
    }

    impl RosterApi for FlakyRoster {
        async fn fetch_online_players(&self) -> Result<Vec<OnlinePlayer>, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                return Err(ApiError::Rejected {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            Ok((0..=n)
                .map(|i| OnlinePlayer {
                    id: format!("p{i}"),
                    name: format!("Player {i}"),
                    level: 1,
                })
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_last_list_when_poll_fails() {
        let api = Arc::new(FlakyRoster::default());
        let roster = OnlineRoster::start(api.clone(), Duration::from_secs(30), Some("p0".into()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(roster.players().len(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(roster.players().len(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(roster.players().len(), 3);

        let players = roster.players();
        assert!(!roster.is_messageable(&players[0]));
        assert!(roster.is_messageable(&players[1]));
        roster.stop().await;
    }
}

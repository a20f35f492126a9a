//! Test doubles for the game API.
//! Responses are scripted per endpoint; every call is counted so tests can assert that a
//! refused action never reached the server.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use moonshine_client::api::{ApiError, FightApi, TravelApi};
use moonshine_client::combat::{FightPayload, RawFight, RawFighter, RoundRecord};
use moonshine_client::travel::{Cell, MoveResponse, UserLocation};

#[derive(Default)]
pub struct FakeGame {
    pub fights: Mutex<VecDeque<Result<FightPayload, ApiError>>>,
    pub moves: Mutex<VecDeque<Result<MoveResponse, ApiError>>>,
    pub cells: Mutex<Vec<Cell>>,
    /// Slug reported by every `fetch_user` call.
    pub position: Mutex<String>,
    /// When set, move requests never complete.
    pub hang_moves: AtomicBool,
    pub fight_calls: AtomicUsize,
    pub attack_calls: AtomicUsize,
    pub move_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
}

impl FakeGame {
    pub fn at(position: &str) -> Self {
        let game = Self::default();
        game.set_position(position);
        *game.cells.lock().unwrap() = (1..=64).map(|i| cell(&format!("{i}cell"))).collect();
        game
    }

    pub fn set_position(&self, slug: &str) {
        *self.position.lock().unwrap() = slug.to_string();
    }

    pub fn push_fight(&self, response: Result<FightPayload, ApiError>) {
        self.fights.lock().unwrap().push_back(response);
    }

    pub fn push_move(&self, response: Result<MoveResponse, ApiError>) {
        self.moves.lock().unwrap().push_back(response);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn next_fight(&self) -> Result<FightPayload, ApiError> {
        self.fights
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(rejected(500, "no scripted fight")))
    }
}

impl FightApi for FakeGame {
    async fn fetch_fight(&self) -> Result<FightPayload, ApiError> {
        self.fight_calls.fetch_add(1, Ordering::SeqCst);
        self.next_fight()
    }

    async fn submit_attack(&self, _: &str, _: &str) -> Result<FightPayload, ApiError> {
        self.attack_calls.fetch_add(1, Ordering::SeqCst);
        self.next_fight()
    }

    async fn engage_bot(&self, _: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

impl TravelApi for FakeGame {
    async fn fetch_cells(&self, _: &str) -> Result<Vec<Cell>, ApiError> {
        Ok(self.cells.lock().unwrap().clone())
    }

    async fn move_to_cell(&self, _: &str, _: &str) -> Result<MoveResponse, ApiError> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_moves.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.moves
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(rejected(500, "no scripted move")))
    }

    async fn fetch_user(&self) -> Result<UserLocation, ApiError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        Ok(UserLocation {
            location_slug: Some(self.position.lock().unwrap().clone()),
            location: None,
        })
    }
}

pub fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::Rejected {
        status,
        message: message.to_string(),
    }
}

pub fn cell(slug: &str) -> Cell {
    Cell {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        name: slug.to_string(),
        image: format!("{slug}.jpg"),
        inactive: false,
    }
}

pub fn fighter(name: &str, hp: i64) -> RawFighter {
    RawFighter {
        name: Some(name.to_string()),
        level: Some(3),
        hp: Some(hp),
        exp: Some(40),
        exp_next: Some(100),
        avatar: None,
    }
}

pub fn round(player_damage: i64, bot_damage: i64, player_hp: i64, bot_hp: i64) -> RoundRecord {
    RoundRecord {
        player_damage: Some(player_damage),
        bot_damage: Some(bot_damage),
        player_attack_point: Some("head".to_string()),
        bot_attack_point: Some("legs".to_string()),
        player_hp: Some(player_hp),
        bot_hp: Some(bot_hp),
    }
}

/// A fight in progress with `rounds` in chronological order as the server sends them.
pub fn active_fight(rounds: Vec<RoundRecord>, current: RoundRecord) -> FightPayload {
    FightPayload {
        fight: Some(RawFight {
            rounds: Some(rounds),
            current_round: Some(current),
            player: Some(fighter("Ayla", 100)),
            bot: Some(fighter("Rat", 60)),
            ..RawFight::default()
        }),
        points: Some(vec!["head".into(), "legs".into(), "torso".into()]),
    }
}

pub fn finished_fight(winner: &str) -> FightPayload {
    let mut payload = active_fight(vec![round(20, 5, 80, 0)], round(0, 0, 80, 0));
    if let Some(fight) = payload.fight.as_mut() {
        fight.winner = Some(fighter(winner, 100));
        fight.winner_type = Some("player".to_string());
        fight.dropped_gold = Some(17);
    }
    payload
}

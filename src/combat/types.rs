//! Combat payload and session types.
//!
//! `Raw*` types mirror the server payload with every field optional; [`CombatSession`] is the
//! fully-defaulted local view produced by [`super::normalize`].

use serde::{Deserialize, Serialize};

/// Response body of both "fetch fight" and "submit attack".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FightPayload {
    pub fight: Option<RawFight>,
    pub points: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFight {
    pub rounds: Option<Vec<RoundRecord>>,
    pub current_round: Option<RoundRecord>,
    pub player: Option<RawFighter>,
    pub bot: Option<RawFighter>,
    pub winner: Option<RawFighter>,
    pub winner_type: Option<String>,
    pub dropped_gold: Option<i64>,
    pub dropped_item: Option<DroppedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFighter {
    pub name: Option<String>,
    pub level: Option<i64>,
    pub hp: Option<i64>,
    pub exp: Option<i64>,
    pub exp_next: Option<i64>,
    pub avatar: Option<ImageRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRef {
    pub url: Option<String>,
}

/// One resolved round. Every field is optional; the opening round of a fight carries HP only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRecord {
    pub player_damage: Option<i64>,
    pub bot_damage: Option<i64>,
    pub player_attack_point: Option<String>,
    pub bot_attack_point: Option<String>,
    pub player_hp: Option<i64>,
    pub bot_hp: Option<i64>,
}

impl RoundRecord {
    /// Rounds without damage are the fight's opening state, not an exchange of blows.
    pub fn is_resolved(&self) -> bool {
        self.player_damage.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroppedItem {
    pub name: Option<String>,
    pub image: Option<ImageRef>,
}

/// A combatant with every field defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fighter {
    pub name: String,
    pub level: i64,
    /// Maximum HP.
    pub hp: i64,
    pub exp: i64,
    pub exp_next: i64,
    pub avatar_url: Option<String>,
}

impl From<&RawFighter> for Fighter {
    fn from(raw: &RawFighter) -> Self {
        Self {
            name: raw.name.clone().unwrap_or_default(),
            level: raw.level.unwrap_or(0),
            hp: raw.hp.unwrap_or(0).max(0),
            exp: raw.exp.unwrap_or(0),
            exp_next: raw.exp_next.unwrap_or(0),
            avatar_url: raw.avatar.as_ref().and_then(|a| a.url.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerKind {
    Player,
    Bot,
}

impl WinnerKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "player" | "user" => Some(WinnerKind::Player),
            "bot" => Some(WinnerKind::Bot),
            _ => None,
        }
    }
}

/// Where a duel stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    /// No snapshot loaded yet.
    Awaiting,
    Active,
    /// A winner is known; absorbing.
    Terminal,
}

/// Local view of one duel, always built whole from a server snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatSession {
    /// Display order: most recent round first.
    pub rounds: Vec<RoundRecord>,
    /// The server's notion of the latest round.
    pub current_round: RoundRecord,
    pub player: Fighter,
    pub bot: Fighter,
    pub winner: Option<Fighter>,
    pub winner_type: Option<WinnerKind>,
    pub available_points: Vec<String>,
    pub selected_attack_point: Option<String>,
    pub selected_defense_point: Option<String>,
    pub dropped_gold: Option<i64>,
    pub dropped_item: Option<DroppedItem>,
}

impl CombatSession {
    pub fn phase(&self) -> CombatPhase {
        if self.winner.is_some() {
            CombatPhase::Terminal
        } else {
            CombatPhase::Active
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    pub fn has_point(&self, point: &str) -> bool {
        self.available_points.iter().any(|p| p == point)
    }

    pub fn player_hp_percent(&self) -> u8 {
        progress_percent(self.current_round.player_hp.unwrap_or(0), self.player.hp)
    }

    pub fn bot_hp_percent(&self) -> u8 {
        progress_percent(self.current_round.bot_hp.unwrap_or(0), self.bot.hp)
    }

    pub fn player_exp_percent(&self) -> u8 {
        progress_percent(self.player.exp, self.player.exp_next)
    }

    /// Two lines per resolved round, most recent round first.
    pub fn log_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for round in self.rounds.iter().filter(|r| r.is_resolved()) {
            lines.push(format!(
                "{} has dealt {} damage to {} in the {}.",
                self.player.name,
                round.player_damage.unwrap_or(0),
                self.bot.name,
                round.player_attack_point.as_deref().unwrap_or("-"),
            ));
            lines.push(format!(
                "{} has dealt {} damage to {} in the {}.",
                self.bot.name,
                round.bot_damage.unwrap_or(0),
                self.player.name,
                round.bot_attack_point.as_deref().unwrap_or("-"),
            ));
        }
        lines
    }
}

/// Percentage for progress bars. A non-positive maximum counts as 1; result is clamped to 0..=100.
pub fn progress_percent(current: i64, max: i64) -> u8 {
    let max = if max <= 0 { 1 } else { max };
    let pct = current.saturating_mul(100) / max;
    pct.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_handles_edges() {
        assert_eq!(progress_percent(50, 200), 25);
        assert_eq!(progress_percent(10, 0), 100);
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(-5, 10), 0);
        assert_eq!(progress_percent(300, 100), 100);
    }

    #[test]
    fn winner_kind_parses_loosely() {
        assert_eq!(WinnerKind::parse("Player"), Some(WinnerKind::Player));
        assert_eq!(WinnerKind::parse("bot"), Some(WinnerKind::Bot));
        assert_eq!(WinnerKind::parse("draw"), None);
    }

    #[test]
    fn log_lines_skip_opening_round() {
        let session = CombatSession {
            player: Fighter {
                name: "Ayla".into(),
                ..Fighter::default()
            },
            bot: Fighter {
                name: "Rat".into(),
                ..Fighter::default()
            },
            rounds: vec![
                RoundRecord {
                    player_damage: Some(7),
                    bot_damage: Some(2),
                    player_attack_point: Some("head".into()),
                    bot_attack_point: Some("legs".into()),
                    ..RoundRecord::default()
                },
                RoundRecord {
                    player_hp: Some(40),
                    bot_hp: Some(20),
                    ..RoundRecord::default()
                },
            ],
            ..CombatSession::default()
        };
        assert_eq!(
            session.log_lines(),
            vec![
                "Ayla has dealt 7 damage to Rat in the head.".to_string(),
                "Rat has dealt 2 damage to Ayla in the legs.".to_string(),
            ]
        );
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: FightPayload =
            serde_json::from_str(r#"{"fight":{"player":{"name":"Ayla"}}}"#).unwrap();
        let fight = payload.fight.unwrap();
        assert_eq!(fight.player.unwrap().name.as_deref(), Some("Ayla"));
        assert!(fight.rounds.is_none());
        assert!(payload.points.is_none());
    }
}

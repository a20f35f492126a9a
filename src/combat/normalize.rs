//! Snapshot normalization: raw fight payload in, complete [`CombatSession`] out.
//!
//! Pure. The only input besides the payload is the previous session, consulted for the
//! player's point selections so that still-valid choices survive a refresh.

use super::types::{CombatSession, Fighter, FightPayload, RoundRecord, WinnerKind};

pub fn normalize(payload: &FightPayload, previous: Option<&CombatSession>) -> CombatSession {
    let available_points = payload.points.clone().unwrap_or_default();
    let selected_attack_point = repair_selection(
        previous.and_then(|s| s.selected_attack_point.as_deref()),
        &available_points,
    );
    let selected_defense_point = repair_selection(
        previous.and_then(|s| s.selected_defense_point.as_deref()),
        &available_points,
    );

    let Some(fight) = payload.fight.as_ref() else {
        return CombatSession {
            available_points,
            selected_attack_point,
            selected_defense_point,
            ..CombatSession::default()
        };
    };

    let mut rounds = fight.rounds.clone().unwrap_or_default();
    rounds.reverse();

    let player = fight.player.as_ref().map(Fighter::from).unwrap_or_default();
    let bot = fight.bot.as_ref().map(Fighter::from).unwrap_or_default();
    let current_round = clamp_round(
        fight.current_round.clone().unwrap_or_default(),
        &player,
        &bot,
    );

    let winner = fight.winner.as_ref().map(Fighter::from);
    let (winner_type, dropped_gold, dropped_item) = if winner.is_some() {
        (
            fight.winner_type.as_deref().and_then(WinnerKind::parse),
            fight.dropped_gold,
            fight.dropped_item.clone(),
        )
    } else {
        (None, None, None)
    };

    CombatSession {
        rounds,
        current_round,
        player,
        bot,
        winner,
        winner_type,
        available_points,
        selected_attack_point,
        selected_defense_point,
        dropped_gold,
        dropped_item,
    }
}

/// Keep a selection that is still offered; otherwise fall back to the last offered point.
/// With nothing offered the previous selection is kept as is.
pub fn repair_selection(previous: Option<&str>, points: &[String]) -> Option<String> {
    let Some(last) = points.last() else {
        return previous.map(str::to_string);
    };
    match previous {
        Some(p) if points.iter().any(|candidate| candidate == p) => Some(p.to_string()),
        _ => Some(last.clone()),
    }
}

/// Current HP never exceeds max HP when max HP is known.
fn clamp_round(mut round: RoundRecord, player: &Fighter, bot: &Fighter) -> RoundRecord {
    if player.hp > 0 {
        round.player_hp = round.player_hp.map(|hp| hp.min(player.hp));
    }
    if bot.hp > 0 {
        round.bot_hp = round.bot_hp.map(|hp| hp.min(bot.hp));
    }
    round
}

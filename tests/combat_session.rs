use std::sync::Arc;

use moonshine_client::combat::{CombatError, CombatPhase, CombatScreen, WinnerKind};
use tokio_test::{assert_err, assert_ok};

mod common;
use common::{active_fight, finished_fight, rejected, round, FakeGame};

#[tokio::test]
async fn fresh_fight_selects_last_offered_point() {
    let api = Arc::new(FakeGame::default());
    api.push_fight(Ok(active_fight(vec![], round(0, 0, 100, 60))));
    let mut screen = CombatScreen::new(api);

    assert_eq!(screen.phase(), CombatPhase::Awaiting);
    assert_eq!(screen.load().await.unwrap(), CombatPhase::Active);

    let session = screen.session().unwrap();
    assert_eq!(session.selected_attack_point.as_deref(), Some("torso"));
    assert_eq!(session.selected_defense_point.as_deref(), Some("torso"));
}

#[tokio::test]
async fn attack_result_is_shown_newest_first() {
    let api = Arc::new(FakeGame::default());
    api.push_fight(Ok(active_fight(
        vec![round(5, 3, 97, 55)],
        round(5, 3, 97, 55),
    )));
    let mut answer = round(12, 9, 88, 43);
    answer.bot_attack_point = Some("torso".into());
    api.push_fight(Ok(active_fight(
        vec![round(5, 3, 97, 55), answer.clone()],
        answer,
    )));

    let mut screen = CombatScreen::new(api.clone());
    assert_ok!(screen.load().await);
    assert_ok!(screen.select_attack_point("head"));
    assert_ok!(screen.select_defense_point("legs"));
    let phase = assert_ok!(screen.attack().await);

    assert_eq!(phase, CombatPhase::Active);
    assert_eq!(FakeGame::count(&api.attack_calls), 1);
    let session = screen.session().unwrap();
    assert_eq!(session.rounds.len(), 2);
    assert_eq!(session.rounds[0].player_damage, Some(12));
    assert_eq!(session.current_round.player_hp, Some(88));
    assert_eq!(session.current_round.bot_hp, Some(43));
    // still-offered selections survive the refresh
    assert_eq!(session.selected_attack_point.as_deref(), Some("head"));
    assert_eq!(session.selected_defense_point.as_deref(), Some("legs"));
    assert_eq!(
        session.log_lines()[0],
        "Ayla has dealt 12 damage to Rat in the head."
    );
}

#[tokio::test]
async fn failed_attack_leaves_session_untouched() {
    let api = Arc::new(FakeGame::default());
    api.push_fight(Ok(active_fight(
        vec![round(5, 3, 97, 55)],
        round(5, 3, 97, 55),
    )));
    api.push_fight(Err(rejected(409, "round already resolved")));

    let mut screen = CombatScreen::new(api);
    screen.load().await.unwrap();
    let before = screen.session().unwrap();

    let err = assert_err!(screen.submit_attack("head", "legs").await);
    match err {
        CombatError::Api(e) => assert_eq!(e.user_message(), "round already resolved"),
        other => panic!("unexpected error: {other}"),
    }
    let after = screen.session().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(screen.phase(), CombatPhase::Active);
}

#[tokio::test]
async fn finished_fight_accepts_no_input() {
    let api = Arc::new(FakeGame::default());
    api.push_fight(Ok(active_fight(vec![], round(0, 0, 100, 60))));
    api.push_fight(Ok(finished_fight("Ayla")));

    let mut screen = CombatScreen::new(api.clone());
    screen.load().await.unwrap();
    assert_eq!(
        screen.submit_attack("head", "legs").await.unwrap(),
        CombatPhase::Terminal
    );

    let session = screen.session().unwrap();
    assert_eq!(session.winner.as_ref().map(|w| w.name.as_str()), Some("Ayla"));
    assert_eq!(session.winner_type, Some(WinnerKind::Player));
    assert_eq!(session.dropped_gold, Some(17));

    assert!(matches!(
        screen.submit_attack("head", "legs").await,
        Err(CombatError::Terminal)
    ));
    assert!(matches!(
        screen.select_attack_point("legs"),
        Err(CombatError::Terminal)
    ));
    assert!(matches!(screen.load().await, Err(CombatError::Terminal)));
    assert_eq!(FakeGame::count(&api.attack_calls), 1);
    assert_eq!(FakeGame::count(&api.fight_calls), 1);
    assert!(Arc::ptr_eq(&session, &screen.session().unwrap()));
}

#[tokio::test]
async fn attack_before_load_is_refused_locally() {
    let api = Arc::new(FakeGame::default());
    let mut screen = CombatScreen::new(api.clone());
    assert!(matches!(
        screen.submit_attack("head", "legs").await,
        Err(CombatError::NotLoaded)
    ));
    assert_eq!(FakeGame::count(&api.attack_calls), 0);
}

#[tokio::test]
async fn empty_payload_is_an_active_fight_without_fighters() {
    let api = Arc::new(FakeGame::default());
    api.push_fight(Ok(Default::default()));
    let mut screen = CombatScreen::new(api.clone());

    assert_eq!(screen.load().await.unwrap(), CombatPhase::Active);
    let session = screen.session().unwrap();
    assert!(session.rounds.is_empty());
    assert!(session.available_points.is_empty());
    assert_eq!(session.selected_attack_point, None);

    // nothing to select, so nothing can be submitted
    assert!(matches!(screen.attack().await, Err(CombatError::MissingPoints)));
    assert_eq!(FakeGame::count(&api.attack_calls), 0);
}

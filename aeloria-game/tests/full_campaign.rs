use aeloria_game::{
    ActionError, Campaign, CampaignConfig, CommanderClass, LogKind, Owner, Phase, Race, Resources,
    effective_garrison,
};

fn fresh(seed: u64) -> Campaign {
    Campaign::new(seed, CampaignConfig::default())
}

#[test]
fn opening_moves_follow_reference_numbers() {
    let mut game = fresh(0x5EED);
    assert_eq!(game.state().resources, Resources::new(500, 100, 50));

    let knight = game.recruit(CommanderClass::Knight, Race::Human).unwrap();
    assert_eq!(game.state().resources.gold, 300);
    let recruit = game.state().commander(knight).unwrap();
    assert_eq!(recruit.level, 1);
    assert_eq!(recruit.health, 120);
    assert_eq!(recruit.owner, Owner::Player);

    game.assign(knight, 1).unwrap();
    let city = game.state().map.node(1).unwrap();
    assert_eq!(effective_garrison(city, &game.state().commanders).total, 295);

    game.select_node(Some(1)).unwrap();
    let report = game.attack(3).unwrap();
    assert!(report.outcome.victory);
    assert_eq!(game.state().map.node(3).unwrap().owner, Owner::Player);
    // Combat ignores the displayed commander bonus.
    assert!((report.outcome.attacker_strength - 150.0).abs() < f64::EPSILON);

    let turn = game.end_turn().unwrap();
    assert_eq!(game.state().turn, 2);
    assert_eq!(game.state().phase, Phase::Player);
    // City (100/50/0) plus the captured resource node (50/100/25).
    assert_eq!(turn.income, Resources::new(150, 150, 25));
}

#[test]
fn turn_log_reads_in_order() {
    let mut game = fresh(3);
    game.end_turn().unwrap();
    let messages: Vec<&str> = game
        .state()
        .battle_log
        .iter()
        .map(|entry| entry.message.as_str())
        .collect();
    let enemy = messages
        .iter()
        .position(|m| *m == "Enemy turn begins")
        .unwrap();
    let income = messages
        .iter()
        .position(|m| m.starts_with("Income:"))
        .unwrap();
    let next = messages
        .iter()
        .position(|m| m.starts_with("Turn 2 begins"))
        .unwrap();
    assert!(enemy < income && income < next);
    assert!(
        game.state()
            .battle_log
            .iter()
            .all(|entry| !entry.message.contains("node 1"))
    );
}

#[test]
fn failed_recruitment_leaves_no_trace() {
    let mut game = fresh(4);
    game.recruit(CommanderClass::Warlord, Race::Orc).unwrap();
    let before = game.state().clone();
    let err = game
        .recruit(CommanderClass::Mage, Race::Elf)
        .unwrap_err();
    assert!(matches!(err, ActionError::InsufficientResources { .. }));
    assert_eq!(game.state(), &before);
}

#[test]
fn passive_player_eventually_loses() {
    let mut game = fresh(12);
    for _ in 0..60 {
        if game.state().game_over {
            break;
        }
        game.end_turn().unwrap();
    }
    assert!(game.state().game_over);
    assert_eq!(game.state().winner, Some(Owner::Enemy));
    assert!(
        game.state()
            .battle_log
            .iter()
            .any(|entry| entry.kind == LogKind::Defeat)
    );
    assert_eq!(game.end_turn().unwrap_err(), ActionError::GameOver);

    game.reset_game();
    assert!(!game.state().game_over);
    assert_eq!(game.state().resources, Resources::new(500, 100, 50));
    assert_eq!(game.state().commanders_of(Owner::Enemy).count(), 2);
}

#[test]
fn aggressive_player_can_win() {
    let mut game = fresh(21);
    game.with_state_mut(|state| {
        state.resources = Resources::new(50_000, 50_000, 50_000);
    });
    for _ in 0..40 {
        if game.state().game_over {
            break;
        }
        let held: Vec<_> = game
            .state()
            .map
            .nodes_owned_by(Owner::Player)
            .map(|node| node.id)
            .collect();
        for from in held {
            while game.upgrade_node(from).is_ok() {}
            for target in game.attackable_targets(from) {
                if game.state().game_over {
                    break;
                }
                game.select_node(Some(from)).unwrap();
                let _ = game.attack(target);
            }
        }
        if !game.state().game_over {
            game.end_turn().unwrap();
        }
    }
    assert!(game.state().game_over);
    assert_eq!(game.state().winner, Some(Owner::Player));
    assert!(game.check_victory_condition());
}

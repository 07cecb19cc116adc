use aeloria_game::persistence::{self, repair_if_corrupted};
use aeloria_game::{
    Campaign, CampaignConfig, CommanderClass, GameState, Integrity, Owner, Race, SCHEMA_VERSION,
    generate_canonical_map,
};
use serde_json::{Value, json};

fn played_state(seed: u64, turns: usize) -> GameState {
    let mut game = Campaign::new(seed, CampaignConfig::default());
    let id = game.recruit(CommanderClass::Ranger, Race::Elf).unwrap();
    game.assign(id, 1).unwrap();
    game.select_node(Some(1)).unwrap();
    game.attack(2).unwrap();
    for _ in 0..turns {
        if game.state().game_over {
            break;
        }
        game.end_turn().unwrap();
    }
    game.into_state()
}

/// The fields a save is expected to carry.
fn persisted_view(state: &GameState) -> GameState {
    let mut view = state.clone();
    view.selected_node = None;
    view.selected_commander = None;
    view.trim_log(CampaignConfig::default_battle_log_cap());
    view
}

#[test]
fn round_trip_preserves_persisted_fields() {
    for seed in [1, 7, 99, 4242] {
        let state = played_state(seed, 3);
        let payload = persistence::encode(&persistence::save(&state, 20)).unwrap();
        let (loaded, report) = persistence::load(&payload).unwrap();
        assert_eq!(report.integrity, Integrity::Verified);
        assert!(!report.repaired);
        assert_eq!(loaded, persisted_view(&state), "seed {seed}");
    }
}

#[test]
fn version_zero_save_is_migrated_and_keeps_ownership() {
    let state = played_state(5, 1);
    let mut body = serde_json::to_value(persistence::save(&state, 20)).unwrap();
    let object = body.as_object_mut().unwrap();
    object.remove("version");
    object.remove("seed");
    for node in object["nodes"].as_array_mut().unwrap() {
        node["connections"] = json!([]);
    }
    let payload = serde_json::to_string(&body).unwrap();

    let (loaded, report) = persistence::load(&payload).unwrap();
    assert_eq!(report.migrated_from, Some(0));
    assert_eq!(report.integrity, Integrity::Unchecked);
    assert!(!report.repaired);
    assert_eq!(loaded.seed, 0);
    assert!(
        loaded
            .map
            .connection_mismatches(&generate_canonical_map())
            .is_empty()
    );
    for node in state.map.nodes() {
        let restored = loaded.map.node(node.id).unwrap();
        assert_eq!(restored.owner, node.owner);
        assert_eq!(restored.garrison, node.garrison);
        assert_eq!(restored.tier(), node.tier());
    }
}

#[test]
fn corrupted_connections_are_repaired_on_load() {
    let state = played_state(8, 2);
    let mut snapshot = persistence::save(&state, 20);
    // One-sided shortcut from the player's city to the stronghold.
    snapshot
        .nodes
        .iter_mut()
        .find(|node| node.id == 1)
        .unwrap()
        .connections
        .push(10);
    let payload = persistence::encode(&snapshot).unwrap();
    let (mut loaded, report) = persistence::load(&payload).unwrap();
    assert!(report.repaired);
    assert!(!loaded.map.is_adjacent(1, 10));
    assert_eq!(loaded.map.edges().count(), 13);

    let once = loaded.clone();
    assert!(!repair_if_corrupted(&mut loaded));
    assert_eq!(loaded, once);
}

#[test]
fn one_sided_connection_loss_is_repaired_and_logged() {
    let state = played_state(12, 1);
    let mut snapshot = persistence::save(&state, 20);
    // The shrine forgets the fortress; the fortress still lists the shrine.
    snapshot
        .nodes
        .iter_mut()
        .find(|node| node.id == 5)
        .unwrap()
        .connections = vec![2, 6, 7];
    let payload = persistence::encode(&snapshot).unwrap();

    let (loaded, report) = persistence::load(&payload).unwrap();
    assert_eq!(report.integrity, Integrity::Verified);
    assert_eq!(report.dropped_references, 0);
    assert!(report.repaired);
    assert!(loaded.map.is_adjacent(5, 8));
    assert_eq!(loaded.map.edges().count(), 13);
    assert!(
        loaded
            .battle_log
            .last()
            .unwrap()
            .message
            .contains("repaired automatically")
    );
}

#[test]
fn checksum_mismatch_loads_with_repair_notice() {
    let state = played_state(9, 1);
    let payload = persistence::encode(&persistence::save(&state, 20)).unwrap();
    let mut envelope: Value = serde_json::from_str(&payload).unwrap();
    envelope["snapshot"]["resources"]["gold"] = json!(999_999);
    let tampered = serde_json::to_string(&envelope).unwrap();

    let (loaded, report) = persistence::load(&tampered).unwrap();
    assert_eq!(report.integrity, Integrity::Mismatch);
    assert!(report.repaired);
    assert_eq!(loaded.resources.gold, 999_999);
    assert!(
        loaded
            .battle_log
            .last()
            .unwrap()
            .message
            .contains("integrity check")
    );
}

#[test]
fn future_schema_is_rejected() {
    let state = played_state(2, 0);
    let mut body = serde_json::to_value(persistence::save(&state, 20)).unwrap();
    body["version"] = json!(SCHEMA_VERSION + 5);
    let payload = serde_json::to_string(&body).unwrap();
    assert!(matches!(
        persistence::load(&payload),
        Err(aeloria_game::SnapshotError::UnsupportedVersion { .. })
    ));
}

#[test]
fn loaded_campaign_replays_the_same_enemy_turn() {
    let state = played_state(31, 2);
    let payload = persistence::encode(&persistence::save(&state, 20)).unwrap();
    let (loaded, _) = persistence::load(&payload).unwrap();

    let mut played = Campaign::from_state(state, CampaignConfig::default());
    let mut resumed = Campaign::from_state(loaded, CampaignConfig::default());
    if played.state().game_over {
        return;
    }
    let a = played.end_turn().unwrap();
    let b = resumed.end_turn().unwrap();
    assert_eq!(a, b);
    assert_eq!(played.state().map, resumed.state().map);
    assert_eq!(
        played.state().commanders_of(Owner::Enemy).count(),
        resumed.state().commanders_of(Owner::Enemy).count()
    );
}

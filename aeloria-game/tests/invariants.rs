use aeloria_game::constants::{MAX_TIER, MIN_TIER};
use aeloria_game::persistence;
use aeloria_game::{Campaign, CampaignConfig, CommanderClass, GameState, NodeId, Race};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn assert_invariants(state: &GameState, context: &str) {
    for node in state.map.nodes() {
        assert!(
            (MIN_TIER..=MAX_TIER).contains(&node.tier()),
            "{context}: tier out of range on node {}",
            node.id
        );
        let stationed = state
            .commanders
            .iter()
            .filter(|c| c.assigned_node == Some(node.id))
            .count();
        assert!(
            stationed <= node.kind.commander_capacity(),
            "{context}: node {} over capacity",
            node.id
        );
        for other in state.map.neighbors(node.id) {
            assert!(state.map.neighbors(other).contains(&node.id));
        }
    }
    for commander in &state.commanders {
        if let Some(post) = commander.assigned_node {
            let node = state.map.node(post).unwrap();
            assert_eq!(
                node.owner, commander.owner,
                "{context}: commander {} posted on foreign node",
                commander.id
            );
        }
    }
}

fn random_action(game: &mut Campaign, rng: &mut SmallRng) {
    let node_ids: Vec<NodeId> = game.state().map.nodes().iter().map(|n| n.id).collect();
    let node = node_ids[rng.gen_range(0..node_ids.len())];
    let before = game.state().clone();
    let result = match rng.gen_range(0..7) {
        0 => {
            let class = CommanderClass::ALL[rng.gen_range(0..CommanderClass::ALL.len())];
            let race = Race::ALL[rng.gen_range(0..Race::ALL.len())];
            game.recruit(class, race).map(|_| ())
        }
        1 => {
            let ids: Vec<_> = game.state().commanders.iter().map(|c| c.id).collect();
            let id = ids[rng.gen_range(0..ids.len())];
            game.assign(id, node)
        }
        2 => {
            let ids: Vec<_> = game.state().commanders.iter().map(|c| c.id).collect();
            let id = ids[rng.gen_range(0..ids.len())];
            game.unassign(id).map(|_| ())
        }
        3 => game.upgrade_node(node).map(|_| ()),
        4 => {
            let target = node_ids[rng.gen_range(0..node_ids.len())];
            game.select_node(Some(node))
                .and_then(|()| game.attack(target).map(|_| ()))
        }
        5 => game.end_turn().map(|_| ()),
        _ => {
            game.repair_map_connections();
            Ok(())
        }
    };
    if result.is_err() {
        let mut expected = before;
        expected.selected_node = game.state().selected_node;
        assert_eq!(game.state(), &expected, "failed action mutated state");
    }
}

#[test]
fn random_play_preserves_invariants() {
    for seed in 0..12u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut game = Campaign::new(seed, CampaignConfig::default());
        for step in 0..250 {
            random_action(&mut game, &mut rng);
            assert_invariants(game.state(), &format!("seed {seed} step {step}"));
            if game.state().game_over {
                game.reset_game();
            }
        }
    }
}

#[test]
fn saves_of_random_play_round_trip() {
    for seed in 100..106u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut game = Campaign::new(seed, CampaignConfig::default());
        for _ in 0..60 {
            random_action(&mut game, &mut rng);
        }
        let payload =
            persistence::encode(&persistence::save(game.state(), 20)).unwrap();
        let (loaded, report) = persistence::load(&payload).unwrap();
        assert!(!report.repaired);
        assert_eq!(report.dropped_references, 0);
        assert_invariants(&loaded, &format!("seed {seed} reloaded"));
        assert_eq!(loaded.map, game.state().map);
        assert_eq!(loaded.commanders, game.state().commanders);
        assert_eq!(loaded.resources, game.state().resources);
    }
}

//! Replay, snapshotting and time travel against a real engine-written log:
//! determinism of the fold, snapshot-assisted hydration agreeing with the
//! cold fold at every sequence, and the correlation metadata of multi-event
//! moves.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use warfront::map;
use warfront::{
    DiceRoller, EventStore, GameEngine, GameState, GameStatus, InMemoryEventStore,
    InMemorySnapshotStore, Move, Outcome, Phase, PlacementStage, Replayer, SnapshotManager,
    SnapshotRecord, SnapshotStore,
};

#[derive(Clone, Default)]
struct SharedDice(Arc<Mutex<VecDeque<u8>>>);

impl SharedDice {
    fn load(&self, rolls: &[u8]) {
        self.0.lock().unwrap().extend(rolls.iter().copied());
    }
}

impl DiceRoller for SharedDice {
    fn roll(&mut self) -> u8 {
        self.0.lock().unwrap().pop_front().unwrap_or(1)
    }
}

const GAME: &str = "replay-1";

struct Table {
    engine: GameEngine<InMemoryEventStore, InMemorySnapshotStore>,
    dice: SharedDice,
}

impl Table {
    fn state(&self) -> GameState {
        self.engine.state(GAME).unwrap()
    }

    fn submit_ok(&self, player: &str, mv: Move) {
        match self.engine.submit(GAME, player, mv).unwrap() {
            Outcome::Applied { .. } => {}
            Outcome::Rejected(rejection) => panic!("move rejected: {rejection}"),
        }
    }
}

/// Lobby, full claiming and setup reinforcement, then one conquered
/// territory: enough history to exercise every projection arm.
fn played_table() -> Table {
    let dice = SharedDice::default();
    let engine = GameEngine::with_dice(
        InMemoryEventStore::new(),
        SnapshotManager::new(InMemorySnapshotStore::new()),
        Box::new(dice.clone()),
    );
    let table = Table { engine, dice };

    table.engine.create_match(GAME).unwrap();
    table.engine.join(GAME, "p1").unwrap();
    table.engine.join(GAME, "p2").unwrap();
    table.engine.start(GAME).unwrap();

    loop {
        let state = table.state();
        if state.game.phase != Phase::InitialPlacement(PlacementStage::Claiming) {
            break;
        }
        let player = state.current_player().unwrap().id.clone();
        let territory = state
            .territories
            .values()
            .find(|t| t.owner.is_none())
            .unwrap()
            .name
            .clone();
        table.submit_ok(&player, Move::PlaceArmies { territory, count: 1 });
    }
    loop {
        let state = table.state();
        if state.game.status != GameStatus::Setup {
            break;
        }
        let player = state.current_player().unwrap().id.clone();
        let territory = state
            .territories
            .values()
            .find(|t| t.is_owned_by(&player))
            .unwrap()
            .name
            .clone();
        table.submit_ok(&player, Move::PlaceArmies { territory, count: 1 });
    }

    // p1 deploys everything onto a border stack and takes one territory
    let state = table.state();
    let (from, to) = attackable_pair(&state);
    let pool = state.player("p1").unwrap().armies_available;
    table.submit_ok(
        "p1",
        Move::PlaceArmies {
            territory: from.clone(),
            count: pool,
        },
    );

    loop {
        let state = table.state();
        match state.game.phase {
            Phase::Attack => {
                table.dice.load(&[6, 6, 6]);
                table.submit_ok(
                    "p1",
                    Move::Attack {
                        from: from.clone(),
                        to: to.clone(),
                        dice: 3,
                    },
                );
            }
            Phase::AttackTransfer => break,
            phase => panic!("unexpected phase {phase}"),
        }
    }
    let min = table
        .state()
        .game
        .pending_transfer
        .as_ref()
        .unwrap()
        .min_armies;
    table.submit_ok("p1", Move::Transfer { count: min });
    table.submit_ok("p1", Move::EndAttack);
    table.submit_ok("p1", Move::EndTurn);
    table
}

/// A p1 territory bordering a p2 territory, in board order.
fn attackable_pair(state: &GameState) -> (String, String) {
    for territory in state.territories.values() {
        if !territory.is_owned_by("p1") {
            continue;
        }
        if let Some(enemy) =
            map::neighbors(&territory.name).find(|n| state.territory(n).unwrap().is_owned_by("p2"))
        {
            return (territory.name.clone(), enemy.to_string());
        }
    }
    panic!("no frontier on a fully claimed board");
}

// ============================================================================
// Determinism and hydration
// ============================================================================

#[test]
fn fold_is_deterministic_and_matches_the_live_state() {
    let table = played_table();
    let store = table.engine.event_store();

    let once = Replayer::new(store).hydrate(GAME).unwrap();
    let twice = Replayer::new(store).hydrate(GAME).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, table.state());
}

#[test]
fn time_travel_walks_the_whole_history() {
    let table = played_table();
    let store = table.engine.event_store();
    let replayer = Replayer::new(store);
    let last = store.latest_sequence(GAME).unwrap();

    assert_eq!(replayer.state_at(GAME, 0).unwrap(), GameState::new(GAME));

    // every prefix is a valid state; the board never loses armies to an
    // event that isn't combat
    let mut previous_total = replayer.state_at(GAME, 0).unwrap().army_total();
    for k in 1..=last {
        let state = replayer.state_at(GAME, k).unwrap();
        let records = store.read_after(GAME, k - 1).unwrap();
        let name = records.first().unwrap().event_name.clone();
        let total = state.army_total();
        if name != "territory_attacked" && name != "reinforcement_calculated"
            && name != "game_started"
        {
            assert_eq!(total, previous_total, "{name} changed the army total");
        }
        previous_total = total;
    }

    // past the end of the log clamps to the final state
    assert_eq!(
        replayer.state_at(GAME, last + 100).unwrap(),
        replayer.state_at(GAME, last).unwrap()
    );
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn snapshot_assisted_replay_agrees_at_every_sequence() {
    let table = played_table();
    let store = table.engine.event_store();
    let last = store.latest_sequence(GAME).unwrap();
    let cold = Replayer::new(store);

    // hand-placed snapshot in the middle of the log
    let middle = last / 2;
    let snapshots = InMemorySnapshotStore::new();
    snapshots
        .save_snapshot(SnapshotRecord::capture(&cold.state_at(GAME, middle).unwrap(), middle).unwrap())
        .unwrap();
    let assisted = Replayer::with_snapshots(store, &snapshots);

    for k in (0..=last).step_by(7).chain([middle - 1, middle, middle + 1, last]) {
        assert_eq!(
            assisted.state_at(GAME, k).unwrap(),
            cold.state_at(GAME, k).unwrap(),
            "diverged at sequence {k}"
        );
    }
}

#[test]
fn engine_written_snapshots_restore_cleanly() {
    let table = played_table();
    let snapshot = table
        .engine
        .snapshot_manager()
        .store()
        .get_snapshot(GAME)
        .unwrap()
        .expect("a log this long crossed the snapshot frequency");

    let restored = snapshot.restore().unwrap();
    let at_capture = Replayer::new(table.engine.event_store())
        .state_at(GAME, snapshot.sequence)
        .unwrap();
    assert_eq!(restored, at_capture);
}

// ============================================================================
// Record metadata
// ============================================================================

#[test]
fn one_move_shares_a_correlation_id_and_chains_causation() {
    let table = played_table();
    let store = table.engine.event_store();
    let records = store.read(GAME).unwrap();

    // the conquest transfer emitted territory_conquered + phase_changed
    let conquered_at = records
        .iter()
        .position(|r| r.event_name == "territory_conquered")
        .unwrap();
    let conquered = &records[conquered_at];
    let follow_up = &records[conquered_at + 1];
    assert_eq!(follow_up.event_name, "phase_changed");
    assert_eq!(follow_up.correlation_id, conquered.correlation_id);
    assert_eq!(follow_up.causation_id, Some(conquered.id));
    assert_eq!(conquered.causation_id, None);

    // actors: the player move is attributed, the system follow-up is not
    assert_eq!(conquered.actor.as_deref(), Some("p1"));
    assert_eq!(follow_up.actor, None);
}

#[test]
fn payloads_decode_to_the_named_event() {
    let table = played_table();
    let records = table.engine.event_store().read(GAME).unwrap();
    assert!(!records.is_empty());
    for record in &records {
        let event = record.decode().unwrap();
        assert_eq!(event.name(), record.event_name);
    }
}

//! Full two-player match driven end to end through the engine:
//! lobby -> claiming -> setup reinforcement -> turns of deploy / attack /
//! conquest transfer / fortify -> elimination -> victory. Dice are scripted
//! so the attacker always wins the roll-off, which makes the whole match
//! deterministic and lets the log be checked against replay afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use warfront::map;
use warfront::{
    DiceRoller, EventStore, GameEngine, GameState, GameStatus, InMemoryEventStore,
    InMemorySnapshotStore, Move, Outcome, Phase, PlacementStage, Rejection, Replayer,
    SnapshotManager, SnapshotStore, TERRITORY_COUNT,
};

/// Dice queue the test can refill while the engine holds the roller.
#[derive(Clone, Default)]
struct SharedDice(Arc<Mutex<VecDeque<u8>>>);

impl SharedDice {
    fn load(&self, rolls: &[u8]) {
        self.0.lock().unwrap().extend(rolls.iter().copied());
    }
}

impl DiceRoller for SharedDice {
    fn roll(&mut self) -> u8 {
        // unscripted rolls (the defender's) fall back to 1
        self.0.lock().unwrap().pop_front().unwrap_or(1)
    }
}

struct Table {
    engine: GameEngine<InMemoryEventStore, InMemorySnapshotStore>,
    dice: SharedDice,
}

const GAME: &str = "match-1";

impl Table {
    fn new() -> Self {
        let dice = SharedDice::default();
        let engine = GameEngine::with_dice(
            InMemoryEventStore::new(),
            SnapshotManager::new(InMemorySnapshotStore::new()),
            Box::new(dice.clone()),
        );
        Table { engine, dice }
    }

    fn state(&self) -> GameState {
        self.engine.state(GAME).unwrap()
    }

    fn submit_ok(&self, player: &str, mv: Move) {
        match self.engine.submit(GAME, player, mv.clone()).unwrap() {
            Outcome::Applied { .. } => {}
            Outcome::Rejected(rejection) => {
                panic!("{player} had {mv:?} rejected: {rejection}")
            }
        }
    }
}

fn open_table() -> Table {
    let table = Table::new();
    table.engine.create_match(GAME).unwrap();
    table.engine.join(GAME, "p1").unwrap();
    table.engine.join(GAME, "p2").unwrap();
    table.engine.start(GAME).unwrap();
    table
}

/// Claim round-robin (first unclaimed territory each slot), then drain both
/// setup pools one army at a time onto each player's first territory.
fn run_setup(table: &Table) {
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
}

/// A territory of `player` holding at least 2 armies with an enemy neighbor,
/// plus the target: the next attack in p1's steamroll.
fn find_attack(state: &GameState, player: &str) -> Option<(String, String, u8)> {
    for territory in state.territories.values() {
        if !territory.is_owned_by(player) || territory.armies < 2 {
            continue;
        }
        for neighbor in map::neighbors(&territory.name) {
            let target = state.territory(neighbor).unwrap();
            if target.owner.is_some() && !target.is_owned_by(player) {
                let dice = (territory.armies - 1).min(3) as u8;
                return Some((territory.name.clone(), neighbor.to_string(), dice));
            }
        }
    }
    None
}

/// A territory of `player` with an enemy neighbor, for deployments.
fn frontier(state: &GameState, player: &str) -> String {
    state
        .territories
        .values()
        .filter(|t| t.is_owned_by(player))
        .filter(|t| {
            map::neighbors(&t.name)
                .any(|n| !state.territory(n).unwrap().is_owned_by(player))
        })
        .max_by_key(|t| t.armies)
        .unwrap()
        .name
        .clone()
}

/// p1 deploys to the frontier and attacks until nothing can attack, always
/// winning the scripted roll-off and moving all-but-one army forward.
fn p1_turn(table: &Table) {
    let state = table.state();
    let pool = state.player("p1").unwrap().armies_available;
    table.submit_ok(
        "p1",
        Move::PlaceArmies {
            territory: frontier(&state, "p1"),
            count: pool,
        },
    );

    loop {
        let state = table.state();
        if state.game.status == GameStatus::Finished {
            return;
        }
        match state.game.phase {
            Phase::AttackTransfer => {
                let pending = state.game.pending_transfer.as_ref().unwrap();
                let count = state.territory(&pending.from).unwrap().armies - 1;
                table.submit_ok("p1", Move::Transfer { count });
            }
            Phase::Attack => match find_attack(&state, "p1") {
                Some((from, to, dice)) => {
                    table.dice.load(&vec![6; dice as usize]);
                    table.submit_ok("p1", Move::Attack { from, to, dice });
                }
                None => {
                    table.submit_ok("p1", Move::EndAttack);
                    table.submit_ok("p1", Move::EndTurn);
                    return;
                }
            },
            phase => panic!("p1 turn stuck in {phase}"),
        }
    }
}

/// p2 just deploys and passes.
fn p2_turn(table: &Table) {
    let state = table.state();
    let pool = state.player("p2").unwrap().armies_available;
    let territory = state
        .territories
        .values()
        .find(|t| t.is_owned_by("p2"))
        .unwrap()
        .name
        .clone();
    table.submit_ok("p2", Move::PlaceArmies { territory, count: pool });
    table.submit_ok("p2", Move::EndAttack);
    table.submit_ok("p2", Move::EndTurn);
}

// ============================================================================
// Lobby and setup
// ============================================================================

#[test]
fn setup_claims_the_whole_board_and_drains_both_pools() {
    let table = open_table();
    run_setup(&table);

    let state = table.state();
    assert_eq!(state.game.status, GameStatus::Playing);
    assert_eq!(state.game.phase, Phase::Deploy);
    assert_eq!(state.game.turn, 1);
    assert_eq!(state.current_player().unwrap().id, "p1");

    // alternating claims split the board evenly
    assert_eq!(state.owned_count("p1"), 21);
    assert_eq!(state.owned_count("p2"), 21);
    assert!(state.territories.values().all(|t| t.armies >= 1));

    // 40 armies each placed on the board, plus p1's first reinforcement pool
    let on_board: u32 = state.territories.values().map(|t| t.armies).sum();
    assert_eq!(on_board, 80);
    assert!(state.player("p1").unwrap().armies_available >= 3);
    assert_eq!(state.player("p2").unwrap().armies_available, 0);
}

#[test]
fn first_deploy_can_only_go_on_own_territory() {
    let table = open_table();
    run_setup(&table);

    let state = table.state();
    let enemy = state
        .territories
        .values()
        .find(|t| t.is_owned_by("p2"))
        .unwrap()
        .name
        .clone();
    let outcome = table
        .engine
        .submit(
            GAME,
            "p1",
            Move::PlaceArmies {
                territory: enemy,
                count: 1,
            },
        )
        .unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::NotYourTerritory));
}

// ============================================================================
// Full match to victory
// ============================================================================

#[test]
fn scripted_steamroll_ends_in_elimination_and_victory() {
    let table = open_table();
    run_setup(&table);

    let mut turns = 0;
    while table.state().game.status != GameStatus::Finished {
        turns += 1;
        assert!(turns < 400, "match did not converge");
        match table.state().current_player().unwrap().id.as_str() {
            "p1" => p1_turn(&table),
            _ => p2_turn(&table),
        }
    }

    let state = table.state();
    assert_eq!(state.game.winner.as_deref(), Some("p1"));
    assert!(state.player("p2").unwrap().eliminated);
    assert_eq!(state.owned_count("p1") as usize, TERRITORY_COUNT);

    // the table is closed
    let outcome = table.engine.submit(GAME, "p1", Move::EndTurn).unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::MatchNotInProgress));
}

#[test]
fn finished_match_replays_to_the_authoritative_state() {
    let table = open_table();
    run_setup(&table);
    while table.state().game.status != GameStatus::Finished {
        match table.state().current_player().unwrap().id.as_str() {
            "p1" => p1_turn(&table),
            _ => p2_turn(&table),
        }
    }

    let store = table.engine.event_store();
    let replayed = Replayer::new(store).hydrate(GAME).unwrap();
    assert_eq!(replayed, table.state());

    // a match this long crossed the snapshot frequency many times over
    let snapshots = table.engine.snapshot_manager().store();
    let snapshot = snapshots.get_snapshot(GAME).unwrap().unwrap();
    assert!(snapshot.sequence >= 50);

    // snapshot-assisted replay agrees with the cold fold
    let assisted = Replayer::with_snapshots(store, snapshots)
        .hydrate(GAME)
        .unwrap();
    assert_eq!(assisted, replayed);

    // the log itself is gapless from sequence 1
    let records = store.read(GAME).unwrap();
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.sequence, i as u64 + 1);
    }
}

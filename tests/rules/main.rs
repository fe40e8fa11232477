//! User-facing rejections through the engine: a refused move returns a
//! `Rejection` value, appends nothing, and leaves the match state byte for
//! byte where it was.

use warfront::{
    EventStore, GameEngine, InMemoryEventStore, InMemorySnapshotStore, Move, Rejection,
    SnapshotManager,
};

const GAME: &str = "rules-1";

fn engine() -> GameEngine<InMemoryEventStore, InMemorySnapshotStore> {
    GameEngine::new(
        InMemoryEventStore::new(),
        SnapshotManager::new(InMemorySnapshotStore::new()),
    )
}

fn claiming_engine() -> GameEngine<InMemoryEventStore, InMemorySnapshotStore> {
    let engine = engine();
    engine.create_match(GAME).unwrap();
    engine.join(GAME, "p1").unwrap();
    engine.join(GAME, "p2").unwrap();
    engine.start(GAME).unwrap();
    engine
}

fn rejection(
    engine: &GameEngine<InMemoryEventStore, InMemorySnapshotStore>,
    player: &str,
    mv: Move,
) -> Rejection {
    engine
        .submit(GAME, player, mv)
        .unwrap()
        .rejection()
        .expect("move should have been rejected")
}

#[test]
fn rejected_moves_change_nothing() {
    let engine = claiming_engine();
    engine
        .submit(
            GAME,
            "p1",
            Move::PlaceArmies {
                territory: "alaska".into(),
                count: 1,
            },
        )
        .unwrap();

    let before_state = engine.state(GAME).unwrap();
    let before_seq = engine.event_store().latest_sequence(GAME).unwrap();

    // p2 is on turn, tries to claim a taken territory
    let rej = rejection(
        &engine,
        "p2",
        Move::PlaceArmies {
            territory: "alaska".into(),
            count: 1,
        },
    );
    assert_eq!(rej, Rejection::TerritoryAlreadyClaimed);

    assert_eq!(engine.state(GAME).unwrap(), before_state);
    assert_eq!(
        engine.event_store().latest_sequence(GAME).unwrap(),
        before_seq
    );
}

#[test]
fn claiming_rejections() {
    let engine = claiming_engine();

    // out of turn
    assert_eq!(
        rejection(
            &engine,
            "p2",
            Move::PlaceArmies {
                territory: "alaska".into(),
                count: 1
            }
        ),
        Rejection::NotYourTurn
    );

    // one army per claim
    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::PlaceArmies {
                territory: "alaska".into(),
                count: 2
            }
        ),
        Rejection::OnePlacementPerSetupAction
    );

    // off the board
    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::PlaceArmies {
                territory: "atlantis".into(),
                count: 1
            }
        ),
        Rejection::UnknownTerritory
    );

    // zero armies
    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::PlaceArmies {
                territory: "alaska".into(),
                count: 0
            }
        ),
        Rejection::ZeroCount
    );
}

#[test]
fn play_phase_moves_are_refused_during_claiming() {
    let engine = claiming_engine();

    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::Attack {
                from: "alaska".into(),
                to: "alberta".into(),
                dice: 1
            }
        ),
        Rejection::WrongPhase
    );
    assert_eq!(
        rejection(&engine, "p1", Move::Transfer { count: 1 }),
        Rejection::WrongPhase
    );
    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::Fortify {
                from: "alaska".into(),
                to: "alberta".into(),
                count: 1
            }
        ),
        Rejection::WrongPhase
    );
    assert_eq!(rejection(&engine, "p1", Move::EndAttack), Rejection::WrongPhase);
    assert_eq!(rejection(&engine, "p1", Move::EndTurn), Rejection::WrongPhase);
}

#[test]
fn moves_before_start_are_refused() {
    let engine = engine();
    engine.create_match(GAME).unwrap();
    engine.join(GAME, "p1").unwrap();
    engine.join(GAME, "p2").unwrap();

    assert_eq!(
        rejection(
            &engine,
            "p1",
            Move::PlaceArmies {
                territory: "alaska".into(),
                count: 1
            }
        ),
        Rejection::MatchNotInProgress
    );
}

#[test]
fn rejection_reasons_are_stable_text() {
    assert_eq!(
        Rejection::NeedTwoTroopsToAttack.to_string(),
        "Need at least 2 troops to attack"
    );
    assert_eq!(Rejection::NotYourTurn.to_string(), "Not your turn");
    assert_eq!(
        Rejection::NotEnoughPlayers.to_string(),
        "Need at least 2 players to start"
    );
    assert_eq!(
        Rejection::TransferOutOfRange.to_string(),
        "Transfer size is out of range"
    );
}

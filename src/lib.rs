pub mod combat;
pub mod engine;
mod error;
pub mod events;
pub mod map;
pub mod projection;
pub mod reducer;
pub mod replay;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod store;

pub use combat::{CombatOutcome, DiceRoller, ScriptedDice, ThreadRngDice};
pub use engine::{GameEngine, Outcome, MAX_PLAYERS, MIN_PLAYERS};
pub use error::IntegrityError;
pub use events::{EventDraft, EventRecord, GameEvent, PayloadError};
pub use map::{Continent, TERRITORY_COUNT};
pub use replay::Replayer;
pub use rules::{Move, Rejection};
pub use snapshot::{
    InMemorySnapshotStore, SnapshotManager, SnapshotRecord, SnapshotStore,
    DEFAULT_SNAPSHOT_FREQUENCY,
};
pub use state::{
    GameState, GameStatus, MatchState, PendingTransfer, Phase, PlacementStage, Player, Territory,
};
pub use store::{append_best_effort, EventStore, InMemoryEventStore};

use crate::error::IntegrityError;
use crate::projection;
use crate::snapshot::SnapshotStore;
use crate::state::GameState;
use crate::store::EventStore;

/// Rebuilds match state from the event log, starting from the latest usable
/// snapshot when one exists. Snapshots are an optimization only: a missing or
/// too-new snapshot silently degrades to a full fold from sequence 1.
pub struct Replayer<'a> {
    events: &'a dyn EventStore,
    snapshots: Option<&'a dyn SnapshotStore>,
}

impl<'a> Replayer<'a> {
    pub fn new(events: &'a dyn EventStore) -> Self {
        Replayer {
            events,
            snapshots: None,
        }
    }

    pub fn with_snapshots(events: &'a dyn EventStore, snapshots: &'a dyn SnapshotStore) -> Self {
        Replayer {
            events,
            snapshots: Some(snapshots),
        }
    }

    /// Current state of the match: snapshot base plus the tail of the log.
    pub fn hydrate(&self, game_id: &str) -> Result<GameState, IntegrityError> {
        self.state_at(game_id, self.events.latest_sequence(game_id)?)
    }

    /// Current state folded over a caller-supplied authoritative baseline.
    /// `covered` is the last sequence the baseline already reflects; only the
    /// log tail after it is folded. Appends are best-effort, so a live match
    /// can outrun its log: audit tooling passes the authoritative rows here
    /// instead of trusting a cold fold.
    pub fn hydrate_from(
        &self,
        baseline: GameState,
        covered: u64,
    ) -> Result<GameState, IntegrityError> {
        let mut state = baseline;
        for record in self.events.read_after(&state.game.id, covered)? {
            let event = record.decode()?;
            projection::fold(&mut state, &event)?;
        }
        Ok(state)
    }

    /// State as of sequence `upto` inclusive. `upto` past the end of the log
    /// yields the final state; `upto == 0` is the empty pre-game board.
    pub fn state_at(&self, game_id: &str, upto: u64) -> Result<GameState, IntegrityError> {
        let (mut state, base) = self.base(game_id, upto)?;
        for record in self.events.read_after(game_id, base)? {
            if record.sequence > upto {
                break;
            }
            let event = record.decode()?;
            projection::fold(&mut state, &event)?;
        }
        Ok(state)
    }

    /// Pick the replay starting point: a snapshot at or before `upto`, or the
    /// empty board. Returns the state and the sequence it already covers.
    fn base(&self, game_id: &str, upto: u64) -> Result<(GameState, u64), IntegrityError> {
        if let Some(snapshots) = self.snapshots {
            if let Some(snapshot) = snapshots.snapshot_at_or_before(game_id, upto)? {
                return Ok((snapshot.restore()?, snapshot.sequence));
            }
        }
        Ok((GameState::new(game_id), 0))
    }
}

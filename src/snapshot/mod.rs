use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::error::IntegrityError;
use crate::state::GameState;

/// A point-in-time capture of a match: the full game state as of `sequence`.
/// Replay from a snapshot folds only the records after that sequence.
#[derive(Clone, Debug)]
pub struct SnapshotRecord {
    pub game_id: String,
    pub sequence: u64,
    pub data: Vec<u8>,
}

impl SnapshotRecord {
    pub fn capture(state: &GameState, sequence: u64) -> Result<Self, IntegrityError> {
        let data = bitcode::serialize(state)
            .map_err(|e| IntegrityError::Snapshot(format!("serialize: {e}")))?;
        Ok(SnapshotRecord {
            game_id: state.game.id.clone(),
            sequence,
            data,
        })
    }

    pub fn restore(&self) -> Result<GameState, IntegrityError> {
        bitcode::deserialize(&self.data)
            .map_err(|e| IntegrityError::Snapshot(format!("deserialize: {e}")))
    }
}

/// Snapshot persistence. Snapshots accumulate per match and are never
/// overwritten, so time travel can start from the nearest one at or before
/// any target sequence.
pub trait SnapshotStore: Send + Sync {
    /// Latest snapshot for the match.
    fn get_snapshot(&self, game_id: &str) -> Result<Option<SnapshotRecord>, IntegrityError>;

    /// Newest snapshot with `sequence <= upto`.
    fn snapshot_at_or_before(
        &self,
        game_id: &str,
        upto: u64,
    ) -> Result<Option<SnapshotRecord>, IntegrityError>;

    fn save_snapshot(&self, record: SnapshotRecord) -> Result<(), IntegrityError>;

    /// Drop every snapshot of a match. Returns true if any existed.
    fn delete_snapshots(&self, game_id: &str) -> Result<bool, IntegrityError>;
}

/// In-memory snapshot store backed by `Arc<RwLock<HashMap>>`, one sequence-
/// ordered map per match. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct InMemorySnapshotStore {
    storage: Arc<RwLock<HashMap<String, BTreeMap<u64, SnapshotRecord>>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        InMemorySnapshotStore {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn get_snapshot(&self, game_id: &str) -> Result<Option<SnapshotRecord>, IntegrityError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| IntegrityError::LockPoisoned("snapshot read"))?;
        Ok(storage
            .get(game_id)
            .and_then(|taken| taken.values().next_back())
            .cloned())
    }

    fn snapshot_at_or_before(
        &self,
        game_id: &str,
        upto: u64,
    ) -> Result<Option<SnapshotRecord>, IntegrityError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| IntegrityError::LockPoisoned("snapshot read"))?;
        Ok(storage
            .get(game_id)
            .and_then(|taken| taken.range(..=upto).next_back())
            .map(|(_, record)| record.clone()))
    }

    fn save_snapshot(&self, record: SnapshotRecord) -> Result<(), IntegrityError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| IntegrityError::LockPoisoned("snapshot write"))?;
        storage
            .entry(record.game_id.clone())
            .or_default()
            .insert(record.sequence, record);
        Ok(())
    }

    fn delete_snapshots(&self, game_id: &str) -> Result<bool, IntegrityError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| IntegrityError::LockPoisoned("snapshot write"))?;
        Ok(storage.remove(game_id).is_some())
    }
}

pub const DEFAULT_SNAPSHOT_FREQUENCY: u64 = 50;

/// Frequency-gated snapshot writer. Snapshots ride the append path but are
/// best-effort: a failed capture is logged and play continues, since the
/// event log alone can always rebuild the state.
pub struct SnapshotManager<S> {
    store: S,
    frequency: u64,
}

impl<S: SnapshotStore> SnapshotManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_frequency(store, DEFAULT_SNAPSHOT_FREQUENCY)
    }

    pub fn with_frequency(store: S, frequency: u64) -> Self {
        SnapshotManager {
            store,
            frequency: frequency.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot `state` once more than `frequency` events landed since the
    /// last snapshot. Returns whether a snapshot was written.
    pub fn maybe_capture(
        &self,
        state: &GameState,
        sequence: u64,
    ) -> Result<bool, IntegrityError> {
        let last = self
            .store
            .get_snapshot(&state.game.id)?
            .map(|s| s.sequence)
            .unwrap_or(0);
        if sequence <= last + self.frequency {
            return Ok(false);
        }
        self.store
            .save_snapshot(SnapshotRecord::capture(state, sequence)?)?;
        Ok(true)
    }

    /// `maybe_capture` with failures logged and swallowed.
    pub fn capture_best_effort(&self, state: &GameState, sequence: u64) {
        if let Err(err) = self.maybe_capture(state, sequence) {
            tracing::warn!(game_id = %state.game.id, error = %err, "snapshot skipped");
        }
    }
}

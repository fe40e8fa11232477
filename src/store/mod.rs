use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::IntegrityError;
use crate::events::{EventDraft, EventRecord, GameEvent};
use crate::state::{GameStatus, Phase, PlacementStage};

/// Append-only event log keyed by match id. Sequence numbers are assigned by
/// the store, start at 1 and are gapless per match. Appends validate the
/// event payload and its phase transition against the stream's tail before
/// anything is written.
pub trait EventStore: Send + Sync {
    fn append(&self, draft: EventDraft) -> Result<EventRecord, IntegrityError>;

    /// Append a correlated batch atomically: every draft is validated against
    /// the stream as it would look mid-batch, and nothing is written unless
    /// all of them pass.
    fn append_batch(&self, drafts: Vec<EventDraft>) -> Result<Vec<EventRecord>, IntegrityError>;

    fn read(&self, game_id: &str) -> Result<Vec<EventRecord>, IntegrityError>;

    /// Records with `sequence > after`, in sequence order.
    fn read_after(&self, game_id: &str, after: u64) -> Result<Vec<EventRecord>, IntegrityError>;

    fn latest_sequence(&self, game_id: &str) -> Result<u64, IntegrityError>;
}

/// Per-stream cursor kept alongside the records so appends can check phase
/// transitions without rebuilding game state.
#[derive(Clone, Debug)]
struct Stream {
    records: Vec<EventRecord>,
    phase: Phase,
    status: GameStatus,
}

impl Stream {
    fn new() -> Self {
        Stream {
            records: Vec::new(),
            phase: Phase::InitialPlacement(PlacementStage::Claiming),
            status: GameStatus::Waiting,
        }
    }

    fn admit(&mut self, event: &GameEvent) -> Result<(), IntegrityError> {
        event.validate()?;
        event.validate_transition(self.phase, self.status)?;

        match event {
            GameEvent::GameStarted { .. } => self.status = GameStatus::Setup,
            GameEvent::GameFinished { .. } => self.status = GameStatus::Finished,
            GameEvent::PhaseChanged { from, to } => {
                self.phase = *to;
                if *from == Phase::InitialPlacement(PlacementStage::Reinforcing)
                    && *to == Phase::Deploy
                {
                    self.status = GameStatus::Playing;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<String, Stream>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        InMemoryEventStore {
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, draft: EventDraft) -> Result<EventRecord, IntegrityError> {
        let mut records = self.append_batch(vec![draft])?;
        records
            .pop()
            .ok_or_else(|| IntegrityError::Payload("empty append".into()))
    }

    fn append_batch(&self, drafts: Vec<EventDraft>) -> Result<Vec<EventRecord>, IntegrityError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let game_id = drafts[0].game_id.clone();
        if drafts.iter().any(|d| d.game_id != game_id) {
            return Err(IntegrityError::Payload(
                "batch spans multiple matches".into(),
            ));
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| IntegrityError::LockPoisoned("append"))?;
        let stream = streams.entry(game_id).or_insert_with(Stream::new);

        // dry-run the whole batch against a scratch cursor and seal every
        // payload before anything is written
        let mut cursor = Stream {
            records: Vec::new(),
            phase: stream.phase,
            status: stream.status,
        };
        let mut sequence = stream.records.len() as u64;
        let mut sealed = Vec::with_capacity(drafts.len());
        for draft in drafts {
            cursor.admit(&draft.event)?;
            sequence += 1;
            let event = draft.event.clone();
            sealed.push((event, EventRecord::seal(draft, sequence)?));
        }

        let mut appended = Vec::with_capacity(sealed.len());
        for (event, record) in sealed {
            stream.admit(&event)?;
            stream.records.push(record.clone());
            appended.push(record);
        }
        Ok(appended)
    }

    fn read(&self, game_id: &str) -> Result<Vec<EventRecord>, IntegrityError> {
        self.read_after(game_id, 0)
    }

    fn read_after(&self, game_id: &str, after: u64) -> Result<Vec<EventRecord>, IntegrityError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| IntegrityError::LockPoisoned("read"))?;
        let stream = streams
            .get(game_id)
            .ok_or_else(|| IntegrityError::UnknownMatch(game_id.to_string()))?;

        // contiguity is a store invariant; re-check on the way out so a
        // corrupted stream never feeds the projector
        let mut expected = after;
        let mut out = Vec::new();
        for record in &stream.records {
            if record.sequence <= after {
                continue;
            }
            expected += 1;
            if record.sequence < expected {
                return Err(IntegrityError::DuplicateSequence {
                    game_id: game_id.to_string(),
                    sequence: record.sequence,
                });
            }
            if record.sequence > expected {
                return Err(IntegrityError::SequenceGap {
                    game_id: game_id.to_string(),
                    expected,
                    actual: record.sequence,
                });
            }
            out.push(record.clone());
        }
        Ok(out)
    }

    fn latest_sequence(&self, game_id: &str) -> Result<u64, IntegrityError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| IntegrityError::LockPoisoned("read"))?;
        let stream = streams
            .get(game_id)
            .ok_or_else(|| IntegrityError::UnknownMatch(game_id.to_string()))?;
        Ok(stream.records.len() as u64)
    }
}

/// Best-effort append: failures are logged and swallowed, yielding an empty
/// record list. Callers on this path have already committed the
/// authoritative state and must not roll it back over audit logging.
pub fn append_best_effort(store: &dyn EventStore, drafts: Vec<EventDraft>) -> Vec<EventRecord> {
    match store.append_batch(drafts) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(error = %err, "best-effort append dropped");
            Vec::new()
        }
    }
}

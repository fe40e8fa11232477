use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::combat::{DiceRoller, ThreadRngDice};
use crate::error::IntegrityError;
use crate::events::{EventDraft, EventRecord, GameEvent};
use crate::projection;
use crate::reducer;
use crate::rules::{self, Move, Rejection};
use crate::snapshot::{SnapshotManager, SnapshotStore};
use crate::state::{initial_pool, GameState, GameStatus};
use crate::store::{append_best_effort, EventStore};

pub const MAX_PLAYERS: usize = 6;
pub const MIN_PLAYERS: usize = 2;

/// What a command did. Rules violations are data, not errors: only
/// corruption and lock failures surface as `Err`.
///
/// `records` is what actually landed in the log. Appends are best-effort
/// behind the authoritative state commit, so after a store failure an
/// applied move carries an empty record list.
#[derive(Debug)]
pub enum Outcome {
    Applied { records: Vec<EventRecord> },
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Rejected(rejection) => Some(*rejection),
            Outcome::Applied { .. } => None,
        }
    }
}

/// Authoritative match host. Commands validate against in-memory state and
/// commit the successor state under one mutex per match, serializing writers
/// while leaving other matches free. The event log and snapshots trail the
/// commit best-effort: gameplay never blocks on, or rolls back for, them.
pub struct GameEngine<E, S> {
    events: E,
    snapshots: SnapshotManager<S>,
    matches: RwLock<HashMap<String, Arc<Mutex<GameState>>>>,
    dice: Mutex<Box<dyn DiceRoller + Send>>,
}

impl<E: EventStore, S: SnapshotStore> GameEngine<E, S> {
    pub fn new(events: E, snapshots: SnapshotManager<S>) -> Self {
        Self::with_dice(events, snapshots, Box::new(ThreadRngDice))
    }

    /// Inject the dice source. Tests script it; production rolls thread-rng.
    pub fn with_dice(
        events: E,
        snapshots: SnapshotManager<S>,
        dice: Box<dyn DiceRoller + Send>,
    ) -> Self {
        GameEngine {
            events,
            snapshots,
            matches: RwLock::new(HashMap::new()),
            dice: Mutex::new(dice),
        }
    }

    pub fn event_store(&self) -> &E {
        &self.events
    }

    pub fn snapshot_manager(&self) -> &SnapshotManager<S> {
        &self.snapshots
    }

    /// Clone of the authoritative state, for read paths.
    pub fn state(&self, game_id: &str) -> Result<GameState, IntegrityError> {
        let handle = self
            .match_handle(game_id)?
            .ok_or_else(|| IntegrityError::UnknownMatch(game_id.to_string()))?;
        let state = handle
            .lock()
            .map_err(|_| IntegrityError::LockPoisoned("match state"))?;
        Ok(state.clone())
    }

    pub fn create_match(&self, game_id: &str) -> Result<Outcome, IntegrityError> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| IntegrityError::LockPoisoned("match table"))?;
        if matches.contains_key(game_id) {
            return Ok(Outcome::Rejected(Rejection::MatchAlreadyExists));
        }

        let state = GameState::new(game_id);
        let records = self.commit_lifecycle(
            &state,
            vec![GameEvent::GameCreated {
                game_id: game_id.to_string(),
            }],
        );
        matches.insert(game_id.to_string(), Arc::new(Mutex::new(state)));
        tracing::info!(game_id, "match created");
        Ok(Outcome::Applied { records })
    }

    pub fn join(&self, game_id: &str, player_id: &str) -> Result<Outcome, IntegrityError> {
        self.lifecycle(game_id, |state| {
            if state.game.status != GameStatus::Waiting {
                return Err(Rejection::NotAcceptingPlayers);
            }
            if state.players.len() >= MAX_PLAYERS {
                return Err(Rejection::MatchFull);
            }
            if state.player(player_id).is_some() {
                return Err(Rejection::AlreadyJoined);
            }
            Ok(vec![GameEvent::PlayerJoined {
                player_id: player_id.to_string(),
                turn_order: state.players.len() as u8,
            }])
        })
    }

    pub fn start(&self, game_id: &str) -> Result<Outcome, IntegrityError> {
        self.lifecycle(game_id, |state| {
            if state.game.status != GameStatus::Waiting {
                return Err(Rejection::NotAcceptingPlayers);
            }
            if state.players.len() < MIN_PLAYERS {
                return Err(Rejection::NotEnoughPlayers);
            }
            Ok(vec![GameEvent::GameStarted {
                player_count: state.players.len() as u32,
                armies_per_player: initial_pool(state.players.len()),
            }])
        })
    }

    /// Validate and apply a player move, appending its events atomically.
    pub fn submit(
        &self,
        game_id: &str,
        player_id: &str,
        mv: Move,
    ) -> Result<Outcome, IntegrityError> {
        let handle = match self.match_handle(game_id)? {
            Some(handle) => handle,
            None => return Ok(Outcome::Rejected(Rejection::UnknownMatch)),
        };
        let mut state = handle
            .lock()
            .map_err(|_| IntegrityError::LockPoisoned("match state"))?;

        if let Err(rejection) = rules::validate(&state, player_id, &mv) {
            tracing::debug!(game_id, player_id, %rejection, "move rejected");
            return Ok(Outcome::Rejected(rejection));
        }

        let applied = {
            let mut dice = self
                .dice
                .lock()
                .map_err(|_| IntegrityError::LockPoisoned("dice"))?;
            reducer::apply(&state, player_id, &mv, dice.as_mut())?
        };

        *state = applied.state;
        let records = append_best_effort(&self.events, applied.events);

        if let Some(last) = records.last() {
            self.snapshots.capture_best_effort(&state, last.sequence);
        }
        tracing::info!(
            game_id,
            player_id,
            events = records.len(),
            "move applied"
        );
        Ok(Outcome::Applied { records })
    }

    fn match_handle(&self, game_id: &str) -> Result<Option<Arc<Mutex<GameState>>>, IntegrityError> {
        let matches = self
            .matches
            .read()
            .map_err(|_| IntegrityError::LockPoisoned("match table"))?;
        Ok(matches.get(game_id).cloned())
    }

    /// Lobby commands share a shape: check the current state, emit events,
    /// fold them into the successor so the cache matches what replay builds.
    fn lifecycle(
        &self,
        game_id: &str,
        plan: impl FnOnce(&GameState) -> Result<Vec<GameEvent>, Rejection>,
    ) -> Result<Outcome, IntegrityError> {
        let handle = match self.match_handle(game_id)? {
            Some(handle) => handle,
            None => return Ok(Outcome::Rejected(Rejection::UnknownMatch)),
        };
        let mut state = handle
            .lock()
            .map_err(|_| IntegrityError::LockPoisoned("match state"))?;

        let events = match plan(&state) {
            Ok(events) => events,
            Err(rejection) => return Ok(Outcome::Rejected(rejection)),
        };

        let mut next = state.clone();
        for event in &events {
            projection::fold(&mut next, event)?;
        }
        let records = self.commit_lifecycle(&next, events);
        *state = next;
        Ok(Outcome::Applied { records })
    }

    fn commit_lifecycle(&self, state: &GameState, events: Vec<GameEvent>) -> Vec<EventRecord> {
        let drafts = EventDraft::correlate(
            events
                .into_iter()
                .map(|event| EventDraft::new(&state.game.id, None, event))
                .collect(),
        );
        append_best_effort(&self.events, drafts)
    }
}

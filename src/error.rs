use std::fmt;

use crate::state::Phase;

/// Hard failures: corruption or a logic bug, never user input.
///
/// These stop replay or append dead. The expected, user-facing tier lives in
/// [`crate::rules::Rejection`] and is returned by value, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    LockPoisoned(&'static str),
    UnknownMatch(String),
    MissingTerritory(String),
    MissingPlayer(String),
    SequenceGap {
        game_id: String,
        expected: u64,
        actual: u64,
    },
    DuplicateSequence {
        game_id: String,
        sequence: u64,
    },
    IllegalTransition {
        from: Phase,
        to: Phase,
    },
    EventAfterFinish(&'static str),
    Payload(String),
    Snapshot(String),
    Combat(String),
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            IntegrityError::UnknownMatch(id) => write!(f, "unknown match {}", id),
            IntegrityError::MissingTerritory(name) => {
                write!(f, "referenced territory {} does not exist", name)
            }
            IntegrityError::MissingPlayer(id) => {
                write!(f, "referenced player {} does not exist", id)
            }
            IntegrityError::SequenceGap {
                game_id,
                expected,
                actual,
            } => write!(
                f,
                "sequence gap in match {} (expected {}, got {})",
                game_id, expected, actual
            ),
            IntegrityError::DuplicateSequence { game_id, sequence } => {
                write!(f, "duplicate sequence {} in match {}", sequence, game_id)
            }
            IntegrityError::IllegalTransition { from, to } => {
                write!(f, "illegal phase transition {} -> {}", from, to)
            }
            IntegrityError::EventAfterFinish(name) => {
                write!(f, "event {} appended to a finished match", name)
            }
            IntegrityError::Payload(message) => write!(f, "invalid event payload: {}", message),
            IntegrityError::Snapshot(message) => write!(f, "snapshot error: {}", message),
            IntegrityError::Combat(message) => write!(f, "combat input error: {}", message),
        }
    }
}

impl std::error::Error for IntegrityError {}

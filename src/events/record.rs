use std::fmt;
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IntegrityError;

use super::game_event::GameEvent;

/// Error when decoding a stored event payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadError {
    pub message: String,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload error: {}", self.message)
    }
}

impl std::error::Error for PayloadError {}

impl From<PayloadError> for IntegrityError {
    fn from(err: PayloadError) -> Self {
        IntegrityError::Payload(err.message)
    }
}

/// An event prepared by the reducer but not yet appended. The store assigns
/// the sequence number; everything else is fixed at draft time so causation
/// chains can reference records before they are durable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    pub id: Uuid,
    pub game_id: String,
    /// Acting player; `None` for system events.
    pub actor: Option<String>,
    pub event: GameEvent,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

impl EventDraft {
    pub fn new(game_id: &str, actor: Option<&str>, event: GameEvent) -> Self {
        EventDraft {
            id: Uuid::new_v4(),
            game_id: game_id.to_string(),
            actor: actor.map(str::to_string),
            event,
            correlation_id: Uuid::new_v4(),
            causation_id: None,
        }
    }

    /// Stamp a shared correlation id onto a whole action's drafts and chain
    /// each event's causation to the one before it.
    pub fn correlate(mut drafts: Vec<EventDraft>) -> Vec<EventDraft> {
        let correlation_id = Uuid::new_v4();
        let mut previous: Option<Uuid> = None;
        for draft in &mut drafts {
            draft.correlation_id = correlation_id;
            draft.causation_id = previous;
            previous = Some(draft.id);
        }
        drafts
    }
}

/// One immutable, appended record. The payload is the bitcode-encoded
/// [`GameEvent`]; in JSON form it travels as base64.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct EventRecord {
    pub id: Uuid,
    pub game_id: String,
    pub actor: Option<String>,
    pub event_name: String,
    #[serde(with = "payload_serde")]
    pub payload: Vec<u8>,
    pub sequence: u64,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
    pub timestamp: SystemTime,
}

mod payload_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(payload: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(payload).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl EventRecord {
    /// Seal a draft at the given sequence number.
    pub fn seal(draft: EventDraft, sequence: u64) -> Result<Self, IntegrityError> {
        let payload = bitcode::serialize(&draft.event)
            .map_err(|e| IntegrityError::Payload(e.to_string()))?;
        Ok(EventRecord {
            id: draft.id,
            game_id: draft.game_id,
            actor: draft.actor,
            event_name: draft.event.name().to_string(),
            payload,
            sequence,
            correlation_id: draft.correlation_id,
            causation_id: draft.causation_id,
            timestamp: SystemTime::now(),
        })
    }

    /// Decode the payload back into the typed event.
    pub fn decode(&self) -> Result<GameEvent, PayloadError> {
        self.decode_as()
    }

    pub fn decode_as<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        bitcode::deserialize(&self.payload).map_err(|e| PayloadError {
            message: e.to_string(),
        })
    }

    pub fn payload_bytes(&self) -> &[u8] {
        &self.payload
    }
}

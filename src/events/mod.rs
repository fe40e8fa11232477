mod game_event;
mod record;

pub use game_event::GameEvent;
pub use record::{EventDraft, EventRecord, PayloadError};

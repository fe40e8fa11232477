mod game_state;
mod phase;

pub use game_state::{GameState, MatchState, PendingTransfer, Player, Territory};
pub use phase::{GameStatus, Phase, PlacementStage};

/// Unplaced armies each player starts with, by player count (2–6).
pub fn initial_pool(player_count: usize) -> u32 {
    match player_count {
        2 => 40,
        3 => 35,
        4 => 30,
        5 => 25,
        _ => 20,
    }
}

/// Reinforcements earned at the start of a turn:
/// `max(3, owned / 3 + continent bonuses)`.
pub fn reinforcement_count(owned_territories: u32, continent_bonus: u32) -> u32 {
    (owned_territories / 3 + continent_bonus).max(3)
}

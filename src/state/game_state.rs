use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::map::{Continent, TERRITORIES};

use super::phase::{GameStatus, Phase, PlacementStage};
use super::reinforcement_count;

/// One region on the board. Owned by exactly one player or unclaimed;
/// armies stay at 0 only while unclaimed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub name: String,
    pub continent: Continent,
    pub owner: Option<String>,
    pub armies: u32,
}

impl Territory {
    pub fn unclaimed(name: &str, continent: Continent) -> Self {
        Territory {
            name: name.to_string(),
            continent,
            owner: None,
            armies: 0,
        }
    }

    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.owner.as_deref() == Some(player_id)
    }
}

/// A participant. Never deleted; elimination only flips the flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub turn_order: u8,
    pub armies_available: u32,
    pub eliminated: bool,
}

impl Player {
    pub fn new(id: &str, turn_order: u8) -> Self {
        Player {
            id: id.to_string(),
            turn_order,
            armies_available: 0,
            eliminated: false,
        }
    }
}

/// A conquest waiting for the attacker to choose the transfer size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub from: String,
    pub to: String,
    /// Dice used in the conquering attack — the minimum armies to move.
    pub min_armies: u32,
}

/// Match-level row state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub id: String,
    pub status: GameStatus,
    pub phase: Phase,
    pub current_index: usize,
    pub turn: u32,
    pub winner: Option<String>,
    pub pending_transfer: Option<PendingTransfer>,
}

/// The full persisted shape: match + players + territories.
///
/// This is what the reducer transforms, the projector folds events into, and
/// snapshots serialize. Territories live in a `BTreeMap` so iteration order
/// is deterministic across replays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub game: MatchState,
    pub players: Vec<Player>,
    pub territories: BTreeMap<String, Territory>,
}

impl GameState {
    /// A fresh match: waiting for players, full unclaimed board.
    pub fn new(game_id: &str) -> Self {
        let mut territories = BTreeMap::new();
        for (name, continent) in TERRITORIES {
            territories.insert(name.to_string(), Territory::unclaimed(name, continent));
        }
        GameState {
            game: MatchState {
                id: game_id.to_string(),
                status: GameStatus::Waiting,
                phase: Phase::InitialPlacement(PlacementStage::Claiming),
                current_index: 0,
                turn: 0,
                winner: None,
                pending_transfer: None,
            },
            players: Vec::new(),
            territories,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.game.current_index)
    }

    pub fn territory(&self, name: &str) -> Option<&Territory> {
        self.territories.get(name)
    }

    pub fn owned_count(&self, player_id: &str) -> u32 {
        self.territories
            .values()
            .filter(|t| t.is_owned_by(player_id))
            .count() as u32
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    /// Continent bonus for fully-owned continents.
    pub fn continent_bonus(&self, player_id: &str) -> u32 {
        Continent::ALL
            .iter()
            .filter(|c| {
                self.territories
                    .values()
                    .filter(|t| t.continent == **c)
                    .all(|t| t.is_owned_by(player_id))
            })
            .map(|c| c.bonus())
            .sum()
    }

    /// Reinforcements the player would earn at the start of a turn.
    pub fn reinforcement_for(&self, player_id: &str) -> u32 {
        reinforcement_count(self.owned_count(player_id), self.continent_bonus(player_id))
    }

    /// Index of the next non-eliminated player after `after`, wrapping.
    pub fn next_active_index(&self, after: usize) -> Option<usize> {
        let len = self.players.len();
        (1..=len)
            .map(|step| (after + step) % len)
            .find(|&idx| !self.players[idx].eliminated)
    }

    /// Advance the setup round-robin to the next player who still has
    /// unplaced armies. Shared by the reducer and the projector so live play
    /// and replay walk the same order.
    pub fn advance_setup_slot(&mut self) {
        let len = self.players.len();
        if len == 0 {
            return;
        }
        let next = (1..=len)
            .map(|step| (self.game.current_index + step) % len)
            .find(|&idx| self.players[idx].armies_available > 0);
        if let Some(idx) = next {
            self.game.current_index = idx;
        }
    }

    /// Every territory claimed by someone.
    pub fn all_claimed(&self) -> bool {
        self.territories.values().all(|t| t.owner.is_some())
    }

    /// Every player has exhausted their setup pool.
    pub fn all_pools_empty(&self) -> bool {
        self.players.iter().all(|p| p.armies_available == 0)
    }

    /// Total armies on the board plus unplaced pools — the conserved
    /// quantity of non-combat moves.
    pub fn army_total(&self) -> u64 {
        let on_board: u64 = self.territories.values().map(|t| u64::from(t.armies)).sum();
        let in_pools: u64 = self.players.iter().map(|p| u64::from(p.armies_available)).sum();
        on_board + in_pools
    }
}

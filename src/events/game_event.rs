use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;
use crate::map;
use crate::state::{GameStatus, Phase};

/// Everything that can happen to a match, as a closed sum type.
///
/// Payload shapes are fixed per variant and validated before append. Attack
/// events carry the *resulting* losses, never dice to re-roll, so folding a
/// stored history is fully deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    GameCreated {
        game_id: String,
    },
    PlayerJoined {
        player_id: String,
        turn_order: u8,
    },
    GameStarted {
        player_count: u32,
        armies_per_player: u32,
    },
    TerritoryClaimed {
        player_id: String,
        territory: String,
    },
    SetupArmyPlaced {
        player_id: String,
        territory: String,
    },
    TurnStarted {
        player_id: String,
        turn: u32,
    },
    ReinforcementCalculated {
        player_id: String,
        armies: u32,
    },
    ArmyPlaced {
        player_id: String,
        territory: String,
        count: u32,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    TerritoryAttacked {
        attacker_id: String,
        from: String,
        to: String,
        attacker_rolls: Vec<u8>,
        defender_rolls: Vec<u8>,
        attacker_losses: u32,
        defender_losses: u32,
    },
    TerritoryConquered {
        new_owner_id: String,
        from: String,
        territory: String,
        armies_moved: u32,
    },
    PlayerEliminated {
        player_id: String,
    },
    ArmyFortified {
        player_id: String,
        from: String,
        to: String,
        count: u32,
    },
    TurnEnded {
        player_id: String,
        turn: u32,
    },
    GameFinished {
        winner_id: String,
    },
}

impl GameEvent {
    /// Stable wire name of the event type.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameCreated { .. } => "game_created",
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::GameStarted { .. } => "game_started",
            GameEvent::TerritoryClaimed { .. } => "territory_claimed",
            GameEvent::SetupArmyPlaced { .. } => "setup_army_placed",
            GameEvent::TurnStarted { .. } => "turn_started",
            GameEvent::ReinforcementCalculated { .. } => "reinforcement_calculated",
            GameEvent::ArmyPlaced { .. } => "army_placed",
            GameEvent::PhaseChanged { .. } => "phase_changed",
            GameEvent::TerritoryAttacked { .. } => "territory_attacked",
            GameEvent::TerritoryConquered { .. } => "territory_conquered",
            GameEvent::PlayerEliminated { .. } => "player_eliminated",
            GameEvent::ArmyFortified { .. } => "army_fortified",
            GameEvent::TurnEnded { .. } => "turn_ended",
            GameEvent::GameFinished { .. } => "game_finished",
        }
    }

    /// Schema validation: identifiers present, territory names on the board,
    /// counts in range. A failure is corruption or a logic bug upstream.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        fn id(value: &str, what: &str) -> Result<(), IntegrityError> {
            if value.is_empty() {
                return Err(IntegrityError::Payload(format!("empty {}", what)));
            }
            Ok(())
        }

        fn territory(name: &str) -> Result<(), IntegrityError> {
            if !map::contains(name) {
                return Err(IntegrityError::Payload(format!(
                    "unknown territory {}",
                    name
                )));
            }
            Ok(())
        }

        fn rolls(rolls: &[u8], max_len: usize) -> Result<(), IntegrityError> {
            if rolls.is_empty() || rolls.len() > max_len {
                return Err(IntegrityError::Payload(format!(
                    "roll list length {} out of range 1-{}",
                    rolls.len(),
                    max_len
                )));
            }
            if rolls.iter().any(|r| !(1..=6).contains(r)) {
                return Err(IntegrityError::Payload("die roll out of range 1-6".into()));
            }
            Ok(())
        }

        match self {
            GameEvent::GameCreated { game_id } => id(game_id, "game id"),
            GameEvent::PlayerJoined { player_id, .. } => id(player_id, "player id"),
            GameEvent::GameStarted {
                player_count,
                armies_per_player,
            } => {
                if !(2..=6).contains(player_count) {
                    return Err(IntegrityError::Payload(format!(
                        "player count {} out of range 2-6",
                        player_count
                    )));
                }
                if *armies_per_player == 0 {
                    return Err(IntegrityError::Payload("zero starting armies".into()));
                }
                Ok(())
            }
            GameEvent::TerritoryClaimed {
                player_id,
                territory: t,
            }
            | GameEvent::SetupArmyPlaced {
                player_id,
                territory: t,
            } => {
                id(player_id, "player id")?;
                territory(t)
            }
            GameEvent::TurnStarted { player_id, turn }
            | GameEvent::TurnEnded { player_id, turn } => {
                id(player_id, "player id")?;
                if *turn == 0 {
                    return Err(IntegrityError::Payload("turn counter must start at 1".into()));
                }
                Ok(())
            }
            GameEvent::ReinforcementCalculated { player_id, armies } => {
                id(player_id, "player id")?;
                if *armies < 3 {
                    return Err(IntegrityError::Payload(format!(
                        "reinforcement {} below the minimum of 3",
                        armies
                    )));
                }
                Ok(())
            }
            GameEvent::ArmyPlaced {
                player_id,
                territory: t,
                count,
            } => {
                id(player_id, "player id")?;
                territory(t)?;
                if *count == 0 {
                    return Err(IntegrityError::Payload("placed zero armies".into()));
                }
                Ok(())
            }
            GameEvent::PhaseChanged { from, to } => {
                if !from.reachable(*to) {
                    return Err(IntegrityError::IllegalTransition {
                        from: *from,
                        to: *to,
                    });
                }
                Ok(())
            }
            GameEvent::TerritoryAttacked {
                attacker_id,
                from,
                to,
                attacker_rolls,
                defender_rolls,
                attacker_losses,
                defender_losses,
            } => {
                id(attacker_id, "player id")?;
                territory(from)?;
                territory(to)?;
                rolls(attacker_rolls, 3)?;
                rolls(defender_rolls, 2)?;
                let pairs = attacker_rolls.len().min(defender_rolls.len()) as u32;
                if attacker_losses + defender_losses != pairs {
                    return Err(IntegrityError::Payload(format!(
                        "losses {}+{} do not match {} dice pairs",
                        attacker_losses, defender_losses, pairs
                    )));
                }
                Ok(())
            }
            GameEvent::TerritoryConquered {
                new_owner_id,
                from,
                territory: t,
                armies_moved,
            } => {
                id(new_owner_id, "player id")?;
                territory(from)?;
                territory(t)?;
                if *armies_moved == 0 {
                    return Err(IntegrityError::Payload("conquest moved zero armies".into()));
                }
                Ok(())
            }
            GameEvent::PlayerEliminated { player_id } => id(player_id, "player id"),
            GameEvent::ArmyFortified {
                player_id,
                from,
                to,
                count,
            } => {
                id(player_id, "player id")?;
                territory(from)?;
                territory(to)?;
                if *count == 0 {
                    return Err(IntegrityError::Payload("fortified zero armies".into()));
                }
                Ok(())
            }
            GameEvent::GameFinished { winner_id } => id(winner_id, "winner id"),
        }
    }

    /// Integrity check against the match's recorded position: no gameplay
    /// events after `game_finished`, and `phase_changed` must continue from
    /// the current phase along a legal edge.
    pub fn validate_transition(
        &self,
        current_phase: Phase,
        status: GameStatus,
    ) -> Result<(), IntegrityError> {
        if status == GameStatus::Finished {
            return Err(IntegrityError::EventAfterFinish(self.name()));
        }
        if let GameEvent::PhaseChanged { from, to } = self {
            if *from != current_phase {
                return Err(IntegrityError::IllegalTransition {
                    from: current_phase,
                    to: *to,
                });
            }
            if !from.reachable(*to) {
                return Err(IntegrityError::IllegalTransition {
                    from: *from,
                    to: *to,
                });
            }
        }
        Ok(())
    }
}

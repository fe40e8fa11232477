use std::fmt;

use serde::{Deserialize, Serialize};

use crate::map;
use crate::state::{GameState, GameStatus, Phase, PlacementStage};

/// A proposed player action. Ephemeral: it is either rejected or converted
/// into one or more events, never persisted itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    /// Place armies from the pool. During initial placement this claims or
    /// reinforces one territory with exactly one army.
    PlaceArmies { territory: String, count: u32 },
    /// Attack an adjacent enemy territory with 1–3 dice.
    Attack { from: String, to: String, dice: u8 },
    /// Move armies into a just-conquered territory.
    Transfer { count: u32 },
    /// Move armies along a connected owned path. Ends the turn.
    Fortify { from: String, to: String, count: u32 },
    /// Skip from attack to fortify.
    EndAttack,
    /// Skip fortify and pass the turn.
    EndTurn,
}

/// Why a move was refused. Expected and user-facing: returned by value,
/// displayed to the acting client, state untouched. A closed set so callers
/// can branch or localize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    MatchNotInProgress,
    MatchAlreadyExists,
    UnknownMatch,
    MatchFull,
    AlreadyJoined,
    NotAcceptingPlayers,
    NotEnoughPlayers,
    NotYourTurn,
    WrongPhase,
    UnknownTerritory,
    NotYourTerritory,
    TargetIsOwnTerritory,
    TerritoryAlreadyClaimed,
    UnclaimedTerritoriesRemain,
    OnePlacementPerSetupAction,
    ZeroCount,
    NotEnoughArmies,
    MustLeaveOneArmy,
    NeedTwoTroopsToAttack,
    InvalidDiceCount,
    NotAdjacent,
    NotConnected,
    NoTransferPending,
    TransferOutOfRange,
}

impl Rejection {
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::MatchNotInProgress => "Match is not in progress",
            Rejection::MatchAlreadyExists => "Match already exists",
            Rejection::UnknownMatch => "Match does not exist",
            Rejection::MatchFull => "Match is full",
            Rejection::AlreadyJoined => "Player already joined",
            Rejection::NotAcceptingPlayers => "Match is not accepting players",
            Rejection::NotEnoughPlayers => "Need at least 2 players to start",
            Rejection::NotYourTurn => "Not your turn",
            Rejection::WrongPhase => "Wrong phase for this action",
            Rejection::UnknownTerritory => "Unknown territory",
            Rejection::NotYourTerritory => "You do not own this territory",
            Rejection::TargetIsOwnTerritory => "Cannot attack your own territory",
            Rejection::TerritoryAlreadyClaimed => "Territory is already claimed",
            Rejection::UnclaimedTerritoriesRemain => {
                "All territories must be claimed before reinforcing"
            }
            Rejection::OnePlacementPerSetupAction => {
                "Only one army may be placed per setup action"
            }
            Rejection::ZeroCount => "Count must be at least 1",
            Rejection::NotEnoughArmies => "Not enough armies available",
            Rejection::MustLeaveOneArmy => "Must leave at least one army behind",
            Rejection::NeedTwoTroopsToAttack => "Need at least 2 troops to attack",
            Rejection::InvalidDiceCount => "Attack must use 1 to 3 dice",
            Rejection::NotAdjacent => "Territories are not adjacent",
            Rejection::NotConnected => "No connected path of your territories",
            Rejection::NoTransferPending => "No conquest transfer is pending",
            Rejection::TransferOutOfRange => "Transfer size is out of range",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Check a proposed move against current state. Pure: never mutates, never
/// rolls dice. `Ok(())` means the reducer may apply the move.
pub fn validate(state: &GameState, player_id: &str, mv: &Move) -> Result<(), Rejection> {
    match state.game.status {
        GameStatus::Setup | GameStatus::Playing => {}
        GameStatus::Waiting | GameStatus::Finished => {
            return Err(Rejection::MatchNotInProgress)
        }
    }

    let current = state.current_player().ok_or(Rejection::MatchNotInProgress)?;
    if current.id != player_id || current.eliminated {
        return Err(Rejection::NotYourTurn);
    }

    match mv {
        Move::PlaceArmies { territory, count } => validate_place(state, player_id, territory, *count),
        Move::Attack { from, to, dice } => validate_attack(state, player_id, from, to, *dice),
        Move::Transfer { count } => validate_transfer(state, player_id, *count),
        Move::Fortify { from, to, count } => validate_fortify(state, player_id, from, to, *count),
        Move::EndAttack => match state.game.phase {
            Phase::Attack => Ok(()),
            _ => Err(Rejection::WrongPhase),
        },
        Move::EndTurn => match state.game.phase {
            Phase::Fortify => Ok(()),
            _ => Err(Rejection::WrongPhase),
        },
    }
}

fn validate_place(
    state: &GameState,
    player_id: &str,
    territory: &str,
    count: u32,
) -> Result<(), Rejection> {
    let target = state.territory(territory).ok_or(Rejection::UnknownTerritory)?;
    let player = state.player(player_id).ok_or(Rejection::NotYourTurn)?;

    if count == 0 {
        return Err(Rejection::ZeroCount);
    }
    if count > player.armies_available {
        return Err(Rejection::NotEnoughArmies);
    }

    match state.game.phase {
        Phase::InitialPlacement(PlacementStage::Claiming) => {
            if count != 1 {
                return Err(Rejection::OnePlacementPerSetupAction);
            }
            if target.owner.is_some() {
                return Err(Rejection::TerritoryAlreadyClaimed);
            }
            Ok(())
        }
        Phase::InitialPlacement(PlacementStage::Reinforcing) => {
            if count != 1 {
                return Err(Rejection::OnePlacementPerSetupAction);
            }
            if !target.is_owned_by(player_id) {
                return Err(Rejection::NotYourTerritory);
            }
            Ok(())
        }
        Phase::Deploy => {
            if !target.is_owned_by(player_id) {
                return Err(Rejection::NotYourTerritory);
            }
            Ok(())
        }
        _ => Err(Rejection::WrongPhase),
    }
}

fn validate_attack(
    state: &GameState,
    player_id: &str,
    from: &str,
    to: &str,
    dice: u8,
) -> Result<(), Rejection> {
    if state.game.phase != Phase::Attack {
        return Err(Rejection::WrongPhase);
    }

    let source = state.territory(from).ok_or(Rejection::UnknownTerritory)?;
    let target = state.territory(to).ok_or(Rejection::UnknownTerritory)?;

    if !source.is_owned_by(player_id) {
        return Err(Rejection::NotYourTerritory);
    }
    if target.is_owned_by(player_id) {
        return Err(Rejection::TargetIsOwnTerritory);
    }
    if source.armies < 2 {
        return Err(Rejection::NeedTwoTroopsToAttack);
    }
    if dice < 1 || dice > 3 || u32::from(dice) > source.armies - 1 {
        return Err(Rejection::InvalidDiceCount);
    }
    if !map::adjacent(from, to) {
        return Err(Rejection::NotAdjacent);
    }
    Ok(())
}

fn validate_transfer(state: &GameState, player_id: &str, count: u32) -> Result<(), Rejection> {
    if state.game.phase != Phase::AttackTransfer {
        return Err(Rejection::WrongPhase);
    }
    let pending = state
        .game
        .pending_transfer
        .as_ref()
        .ok_or(Rejection::NoTransferPending)?;

    let source = state
        .territory(&pending.from)
        .ok_or(Rejection::UnknownTerritory)?;
    if !source.is_owned_by(player_id) {
        return Err(Rejection::NotYourTerritory);
    }
    if count < pending.min_armies || count > source.armies.saturating_sub(1) {
        return Err(Rejection::TransferOutOfRange);
    }
    Ok(())
}

fn validate_fortify(
    state: &GameState,
    player_id: &str,
    from: &str,
    to: &str,
    count: u32,
) -> Result<(), Rejection> {
    if state.game.phase != Phase::Fortify {
        return Err(Rejection::WrongPhase);
    }

    let source = state.territory(from).ok_or(Rejection::UnknownTerritory)?;
    let target = state.territory(to).ok_or(Rejection::UnknownTerritory)?;

    if !source.is_owned_by(player_id) || !target.is_owned_by(player_id) {
        return Err(Rejection::NotYourTerritory);
    }
    if count == 0 {
        return Err(Rejection::ZeroCount);
    }
    if count > source.armies.saturating_sub(1) {
        return Err(Rejection::MustLeaveOneArmy);
    }
    if !crate::map::connected(from, to, player_id, &state.territories) {
        return Err(Rejection::NotConnected);
    }
    Ok(())
}

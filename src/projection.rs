use crate::error::IntegrityError;
use crate::events::{EventRecord, GameEvent};
use crate::state::{
    GameState, GameStatus, Phase, PendingTransfer, PlacementStage, Player, Territory,
};

/// Rebuild a match's state by folding its event history in sequence order.
/// The fold is total over well-formed logs: every event the engine emits has
/// exactly one arm here, and the result matches the authoritative state the
/// reducer produced when the events were written.
pub fn project(game_id: &str, records: &[EventRecord]) -> Result<GameState, IntegrityError> {
    let mut state = GameState::new(game_id);
    for record in records {
        let event = record.decode()?;
        fold(&mut state, &event)?;
    }
    Ok(state)
}

/// Fold a single event into `state`. Events are facts, not requests:
/// anything that fails here is log corruption, never a rules violation.
pub fn fold(state: &mut GameState, event: &GameEvent) -> Result<(), IntegrityError> {
    match event {
        GameEvent::GameCreated { .. } => {}

        GameEvent::PlayerJoined {
            player_id,
            turn_order,
        } => {
            state.players.push(Player::new(player_id, *turn_order));
        }

        GameEvent::GameStarted {
            armies_per_player, ..
        } => {
            state.game.status = GameStatus::Setup;
            for player in &mut state.players {
                player.armies_available = *armies_per_player;
            }
        }

        GameEvent::TerritoryClaimed {
            player_id,
            territory,
        } => {
            let t = territory_mut(state, territory)?;
            t.owner = Some(player_id.clone());
            t.armies = 1;
            debit_pool(state, player_id, 1)?;
            state.advance_setup_slot();
        }

        GameEvent::SetupArmyPlaced {
            player_id,
            territory,
        } => {
            territory_mut(state, territory)?.armies += 1;
            debit_pool(state, player_id, 1)?;
            state.advance_setup_slot();
        }

        GameEvent::ArmyPlaced {
            player_id,
            territory,
            count,
        } => {
            territory_mut(state, territory)?.armies += count;
            debit_pool(state, player_id, *count)?;
        }

        GameEvent::PhaseChanged { from, to } => {
            state.game.phase = *to;
            // the close of initial placement is the start of play proper
            if *from == Phase::InitialPlacement(PlacementStage::Reinforcing)
                && *to == Phase::Deploy
            {
                state.game.status = GameStatus::Playing;
            }
        }

        GameEvent::TurnStarted { player_id, turn } => {
            state.game.current_index = player_index(state, player_id)?;
            state.game.turn = *turn;
        }

        GameEvent::ReinforcementCalculated { player_id, armies } => {
            state
                .player_mut(player_id)
                .ok_or_else(|| IntegrityError::MissingPlayer(player_id.clone()))?
                .armies_available = *armies;
        }

        GameEvent::TurnEnded { .. } => {}

        GameEvent::TerritoryAttacked {
            from,
            to,
            attacker_rolls,
            attacker_losses,
            defender_losses,
            ..
        } => {
            debit_armies(state, from, *attacker_losses)?;
            debit_armies(state, to, *defender_losses)?;
            if territory_mut(state, to)?.armies == 0 {
                state.game.pending_transfer = Some(PendingTransfer {
                    from: from.clone(),
                    to: to.clone(),
                    min_armies: attacker_rolls.len() as u32,
                });
            }
        }

        GameEvent::TerritoryConquered {
            new_owner_id,
            from,
            territory,
            armies_moved,
        } => {
            debit_armies(state, from, *armies_moved)?;
            let t = territory_mut(state, territory)?;
            t.owner = Some(new_owner_id.clone());
            t.armies = *armies_moved;
            state.game.pending_transfer = None;
        }

        GameEvent::PlayerEliminated { player_id } => {
            state
                .player_mut(player_id)
                .ok_or_else(|| IntegrityError::MissingPlayer(player_id.clone()))?
                .eliminated = true;
        }

        GameEvent::ArmyFortified {
            from, to, count, ..
        } => {
            debit_armies(state, from, *count)?;
            territory_mut(state, to)?.armies += count;
        }

        GameEvent::GameFinished { winner_id } => {
            state.game.status = GameStatus::Finished;
            state.game.winner = Some(winner_id.clone());
        }
    }
    Ok(())
}

fn territory_mut<'a>(
    state: &'a mut GameState,
    name: &str,
) -> Result<&'a mut Territory, IntegrityError> {
    state
        .territories
        .get_mut(name)
        .ok_or_else(|| IntegrityError::MissingTerritory(name.to_string()))
}

fn debit_armies(state: &mut GameState, name: &str, amount: u32) -> Result<(), IntegrityError> {
    let t = territory_mut(state, name)?;
    t.armies = t
        .armies
        .checked_sub(amount)
        .ok_or_else(|| IntegrityError::Payload(format!("army underflow on {name}")))?;
    Ok(())
}

fn debit_pool(state: &mut GameState, player_id: &str, amount: u32) -> Result<(), IntegrityError> {
    let player = state
        .player_mut(player_id)
        .ok_or_else(|| IntegrityError::MissingPlayer(player_id.to_string()))?;
    player.armies_available = player
        .armies_available
        .checked_sub(amount)
        .ok_or_else(|| IntegrityError::Payload(format!("pool underflow for {player_id}")))?;
    Ok(())
}

fn player_index(state: &GameState, player_id: &str) -> Result<usize, IntegrityError> {
    state
        .players
        .iter()
        .position(|p| p.id == player_id)
        .ok_or_else(|| IntegrityError::MissingPlayer(player_id.to_string()))
}

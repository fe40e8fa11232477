use crate::combat::{self, DiceRoller};
use crate::error::IntegrityError;
use crate::events::{EventDraft, GameEvent};
use crate::map::TERRITORY_COUNT;
use crate::rules::Move;
use crate::state::{GameState, GameStatus, Phase, PendingTransfer, PlacementStage};

/// A validated move applied to a state: the successor state plus the events
/// describing what happened, sharing one correlation id.
#[derive(Clone, Debug)]
pub struct Applied {
    pub state: GameState,
    pub events: Vec<EventDraft>,
}

/// Apply an already-validated move. Pure except for dice: the input state is
/// untouched, the successor is returned. Callers must run
/// [`crate::rules::validate`] first; violations that slip through surface as
/// integrity errors, not rejections.
pub fn apply(
    state: &GameState,
    player_id: &str,
    mv: &Move,
    roller: &mut dyn DiceRoller,
) -> Result<Applied, IntegrityError> {
    let mut next = state.clone();
    let mut events = Vec::new();

    match mv {
        Move::PlaceArmies { territory, count } => {
            place_armies(&mut next, player_id, territory, *count, &mut events)?
        }
        Move::Attack { from, to, dice } => {
            attack(&mut next, player_id, from, to, *dice, roller, &mut events)?
        }
        Move::Transfer { count } => transfer(&mut next, player_id, *count, &mut events)?,
        Move::Fortify { from, to, count } => {
            fortify(&mut next, player_id, from, to, *count, &mut events)?;
            end_turn(&mut next, player_id, &mut events)?;
        }
        Move::EndAttack => change_phase(&mut next, Phase::Fortify, &mut events),
        Move::EndTurn => end_turn(&mut next, player_id, &mut events)?,
    }

    Ok(Applied {
        state: next,
        events: EventDraft::correlate(events),
    })
}

fn push(state: &GameState, actor: Option<&str>, event: GameEvent, events: &mut Vec<EventDraft>) {
    events.push(EventDraft::new(&state.game.id, actor, event));
}

fn change_phase(state: &mut GameState, to: Phase, events: &mut Vec<EventDraft>) {
    let from = state.game.phase;
    state.game.phase = to;
    push(state, None, GameEvent::PhaseChanged { from, to }, events);
}

fn territory_armies(state: &GameState, name: &str) -> Result<u32, IntegrityError> {
    state
        .territory(name)
        .map(|t| t.armies)
        .ok_or_else(|| IntegrityError::MissingTerritory(name.to_string()))
}

fn debit_armies(state: &mut GameState, name: &str, amount: u32) -> Result<(), IntegrityError> {
    let t = state
        .territories
        .get_mut(name)
        .ok_or_else(|| IntegrityError::MissingTerritory(name.to_string()))?;
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

fn place_armies(
    state: &mut GameState,
    player_id: &str,
    territory: &str,
    count: u32,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    let phase = state.game.phase;
    {
        let target = state
            .territories
            .get_mut(territory)
            .ok_or_else(|| IntegrityError::MissingTerritory(territory.to_string()))?;
        match phase {
            Phase::InitialPlacement(PlacementStage::Claiming) => {
                target.owner = Some(player_id.to_string());
                target.armies = 1;
            }
            _ => target.armies += count,
        }
    }
    debit_pool(state, player_id, count)?;

    match phase {
        Phase::InitialPlacement(PlacementStage::Claiming) => {
            push(
                state,
                Some(player_id),
                GameEvent::TerritoryClaimed {
                    player_id: player_id.to_string(),
                    territory: territory.to_string(),
                },
                events,
            );
            state.advance_setup_slot();
            if state.all_claimed() {
                change_phase(
                    state,
                    Phase::InitialPlacement(PlacementStage::Reinforcing),
                    events,
                );
            }
        }
        Phase::InitialPlacement(PlacementStage::Reinforcing) => {
            push(
                state,
                Some(player_id),
                GameEvent::SetupArmyPlaced {
                    player_id: player_id.to_string(),
                    territory: territory.to_string(),
                },
                events,
            );
            state.advance_setup_slot();
            if state.all_pools_empty() {
                begin_play(state, events)?;
            }
        }
        _ => {
            push(
                state,
                Some(player_id),
                GameEvent::ArmyPlaced {
                    player_id: player_id.to_string(),
                    territory: territory.to_string(),
                    count,
                },
                events,
            );
            if state
                .player(player_id)
                .map(|p| p.armies_available == 0)
                .unwrap_or(false)
            {
                change_phase(state, Phase::Attack, events);
            }
        }
    }
    Ok(())
}

/// Initial placement is complete: the first player by turn order opens the
/// first deploy phase with a freshly computed pool.
fn begin_play(state: &mut GameState, events: &mut Vec<EventDraft>) -> Result<(), IntegrityError> {
    change_phase(state, Phase::Deploy, events);
    state.game.status = GameStatus::Playing;
    state.game.current_index = 0;
    state.game.turn = 1;

    let first = state
        .players
        .first()
        .ok_or_else(|| IntegrityError::MissingPlayer("<first>".to_string()))?
        .id
        .clone();
    push(
        state,
        None,
        GameEvent::TurnStarted {
            player_id: first.clone(),
            turn: 1,
        },
        events,
    );
    grant_reinforcements(state, &first, events)
}

fn grant_reinforcements(
    state: &mut GameState,
    player_id: &str,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    let armies = state.reinforcement_for(player_id);
    state
        .player_mut(player_id)
        .ok_or_else(|| IntegrityError::MissingPlayer(player_id.to_string()))?
        .armies_available = armies;
    push(
        state,
        None,
        GameEvent::ReinforcementCalculated {
            player_id: player_id.to_string(),
            armies,
        },
        events,
    );
    Ok(())
}

fn attack(
    state: &mut GameState,
    player_id: &str,
    from: &str,
    to: &str,
    dice: u8,
    roller: &mut dyn DiceRoller,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    let attacker_troops = territory_armies(state, from)?;
    let defender_troops = territory_armies(state, to)?;
    let defender_dice = defender_troops.min(2) as u8;

    let outcome = combat::resolve(attacker_troops, defender_troops, dice, defender_dice, roller)?;

    debit_armies(state, from, outcome.attacker_losses)?;
    debit_armies(state, to, outcome.defender_losses)?;

    push(
        state,
        Some(player_id),
        GameEvent::TerritoryAttacked {
            attacker_id: player_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            attacker_rolls: outcome.attacker_rolls.clone(),
            defender_rolls: outcome.defender_rolls.clone(),
            attacker_losses: outcome.attacker_losses,
            defender_losses: outcome.defender_losses,
        },
        events,
    );

    if outcome.conquered {
        state.game.pending_transfer = Some(PendingTransfer {
            from: from.to_string(),
            to: to.to_string(),
            min_armies: u32::from(outcome.dice_used),
        });
        change_phase(state, Phase::AttackTransfer, events);
    }
    Ok(())
}

fn transfer(
    state: &mut GameState,
    player_id: &str,
    count: u32,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    let pending = state
        .game
        .pending_transfer
        .take()
        .ok_or_else(|| IntegrityError::Payload("transfer without pending conquest".into()))?;

    let prior_owner = state
        .territory(&pending.to)
        .ok_or_else(|| IntegrityError::MissingTerritory(pending.to.clone()))?
        .owner
        .clone();

    debit_armies(state, &pending.from, count)?;
    {
        let target = state
            .territories
            .get_mut(&pending.to)
            .ok_or_else(|| IntegrityError::MissingTerritory(pending.to.clone()))?;
        target.owner = Some(player_id.to_string());
        target.armies = count;
    }

    push(
        state,
        Some(player_id),
        GameEvent::TerritoryConquered {
            new_owner_id: player_id.to_string(),
            from: pending.from.clone(),
            territory: pending.to.clone(),
            armies_moved: count,
        },
        events,
    );

    if let Some(loser) = prior_owner {
        if state.owned_count(&loser) == 0 {
            state
                .player_mut(&loser)
                .ok_or_else(|| IntegrityError::MissingPlayer(loser.clone()))?
                .eliminated = true;
            push(
                state,
                None,
                GameEvent::PlayerEliminated {
                    player_id: loser.clone(),
                },
                events,
            );
        }
    }

    let sole_survivor = state.active_players().count() == 1;
    let owns_everything = state.owned_count(player_id) as usize == TERRITORY_COUNT;
    if sole_survivor || owns_everything {
        state.game.status = GameStatus::Finished;
        state.game.winner = Some(player_id.to_string());
        push(
            state,
            None,
            GameEvent::GameFinished {
                winner_id: player_id.to_string(),
            },
            events,
        );
    } else {
        change_phase(state, Phase::Attack, events);
    }
    Ok(())
}

fn fortify(
    state: &mut GameState,
    player_id: &str,
    from: &str,
    to: &str,
    count: u32,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    debit_armies(state, from, count)?;
    state
        .territories
        .get_mut(to)
        .ok_or_else(|| IntegrityError::MissingTerritory(to.to_string()))?
        .armies += count;

    push(
        state,
        Some(player_id),
        GameEvent::ArmyFortified {
            player_id: player_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            count,
        },
        events,
    );
    Ok(())
}

fn end_turn(
    state: &mut GameState,
    player_id: &str,
    events: &mut Vec<EventDraft>,
) -> Result<(), IntegrityError> {
    push(
        state,
        Some(player_id),
        GameEvent::TurnEnded {
            player_id: player_id.to_string(),
            turn: state.game.turn,
        },
        events,
    );

    change_phase(state, Phase::Deploy, events);

    let next_index = state
        .next_active_index(state.game.current_index)
        .ok_or_else(|| IntegrityError::MissingPlayer("<no active players>".to_string()))?;
    state.game.current_index = next_index;
    state.game.turn += 1;
    let next_player = state.players[next_index].id.clone();

    push(
        state,
        None,
        GameEvent::TurnStarted {
            player_id: next_player.clone(),
            turn: state.game.turn,
        },
        events,
    );
    grant_reinforcements(state, &next_player, events)
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Match lifecycle. Forward-only: a match never moves backwards through
/// these states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Setup,
    Playing,
    Finished,
}

impl GameStatus {
    fn rank(self) -> u8 {
        match self {
            GameStatus::Waiting => 0,
            GameStatus::Setup => 1,
            GameStatus::Playing => 2,
            GameStatus::Finished => 3,
        }
    }

    /// Status may only advance, never revert.
    pub fn can_advance_to(self, next: GameStatus) -> bool {
        next.rank() == self.rank() + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Setup => "setup",
            GameStatus::Playing => "playing",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sub-stage of the initial placement phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStage {
    Claiming,
    Reinforcing,
}

/// Stage within a turn. The reducer owns all transitions between phases;
/// [`Phase::reachable`] is the integrity check the event store applies to
/// `phase_changed` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InitialPlacement(PlacementStage),
    Deploy,
    Attack,
    AttackTransfer,
    Fortify,
}

impl Phase {
    /// Whether `to` is a legal direct transition from `self`.
    pub fn reachable(self, to: Phase) -> bool {
        use PlacementStage::{Claiming, Reinforcing};
        matches!(
            (self, to),
            (
                Phase::InitialPlacement(Claiming),
                Phase::InitialPlacement(Reinforcing)
            ) | (Phase::InitialPlacement(Reinforcing), Phase::Deploy)
                | (Phase::Deploy, Phase::Attack)
                | (Phase::Attack, Phase::AttackTransfer)
                | (Phase::Attack, Phase::Fortify)
                | (Phase::AttackTransfer, Phase::Attack)
                | (Phase::Fortify, Phase::Deploy)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::InitialPlacement(PlacementStage::Claiming) => "initial_placement.claiming",
            Phase::InitialPlacement(PlacementStage::Reinforcing) => {
                "initial_placement.reinforcing"
            }
            Phase::Deploy => "deploy",
            Phase::Attack => "attack",
            Phase::AttackTransfer => "attack_transfer",
            Phase::Fortify => "fortify",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

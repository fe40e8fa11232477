use std::collections::VecDeque;

use rand::Rng;

use crate::error::IntegrityError;

/// Source of individual die rolls (uniform 1–6). Injected so tests and
/// simulations can script exact outcomes; production uses [`ThreadRngDice`].
pub trait DiceRoller {
    fn roll(&mut self) -> u8;
}

/// Dice backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngDice;

impl DiceRoller for ThreadRngDice {
    fn roll(&mut self) -> u8 {
        rand::rng().random_range(1..=6)
    }
}

/// Dice that replay a fixed script, for deterministic tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new(rolls: &[u8]) -> Self {
        ScriptedDice {
            rolls: rolls.iter().copied().collect(),
        }
    }

    pub fn push(&mut self, rolls: &[u8]) {
        self.rolls.extend(rolls.iter().copied());
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self) -> u8 {
        // Running out of script is a test bug; 1 keeps the outcome valid.
        self.rolls.pop_front().unwrap_or(1)
    }
}

/// Result of one attack roll-off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Attacker dice, sorted descending.
    pub attacker_rolls: Vec<u8>,
    /// Defender dice, sorted descending.
    pub defender_rolls: Vec<u8>,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    /// Defender troops reached zero.
    pub conquered: bool,
    /// Attacker dice actually rolled — the minimum conquest transfer.
    pub dice_used: u8,
}

/// Resolve one attack. Dice are rolled from `roller`, sorted descending per
/// side, and paired off highest-to-highest; ties favor the defender. Pure
/// apart from consuming rolls: identical inputs may produce different but
/// individually valid outcomes.
///
/// Out-of-range inputs are integrity errors — the rule validator rejects
/// them user-facing long before this is reached.
pub fn resolve(
    attacker_troops: u32,
    defender_troops: u32,
    attacker_dice: u8,
    defender_dice: u8,
    roller: &mut dyn DiceRoller,
) -> Result<CombatOutcome, IntegrityError> {
    if attacker_troops < 2 {
        return Err(IntegrityError::Combat(format!(
            "attacker has {} troops, needs at least 2",
            attacker_troops
        )));
    }
    if defender_troops < 1 {
        return Err(IntegrityError::Combat("defender has no troops".into()));
    }
    if attacker_dice < 1 || attacker_dice > 3 {
        return Err(IntegrityError::Combat(format!(
            "attacker dice {} out of range 1-3",
            attacker_dice
        )));
    }
    if defender_dice < 1 || defender_dice > 2 {
        return Err(IntegrityError::Combat(format!(
            "defender dice {} out of range 1-2",
            defender_dice
        )));
    }

    // One army must stay home, and the defender can't roll more dice than troops.
    let attacker_dice = attacker_dice.min((attacker_troops - 1).min(3) as u8);
    let defender_dice = defender_dice.min(defender_troops.min(2) as u8);

    let mut attacker_rolls: Vec<u8> = (0..attacker_dice).map(|_| roller.roll()).collect();
    let mut defender_rolls: Vec<u8> = (0..defender_dice).map(|_| roller.roll()).collect();
    attacker_rolls.sort_unstable_by(|a, b| b.cmp(a));
    defender_rolls.sort_unstable_by(|a, b| b.cmp(a));

    let mut attacker_losses = 0;
    let mut defender_losses = 0;
    for (a, d) in attacker_rolls.iter().zip(defender_rolls.iter()) {
        if a > d {
            defender_losses += 1;
        } else {
            attacker_losses += 1;
        }
    }

    let conquered = defender_troops <= defender_losses;

    Ok(CombatOutcome {
        attacker_rolls,
        defender_rolls,
        attacker_losses,
        defender_losses,
        conquered,
        dice_used: attacker_dice,
    })
}

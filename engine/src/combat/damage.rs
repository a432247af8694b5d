//! Damage calculation.
//!
//! Stages run in a fixed order, each a pure function of the previous stage's
//! clamped output:
//!
//! 1. printed (or coin-flip) base damage
//! 2. `-` penalty per damage counter
//! 3. `+` bonus from one bonus rule
//! 4. structured flat modifiers
//! 5. clamp at zero
//! 6. weakness (×2)
//! 7. resistance (flat, clamped)
//! 8. prevention, then reduction, on the defender

use serde::{Deserialize, Serialize};

use super::energy::{count_energy, required_of_type, EnergySupply};
use crate::data::card::{Attack, Card};
use crate::effects::mechanics::{BenchSide, DamageBonus, DamagePenalty, DefenseKind, EffectTarget};
use crate::error::PreconditionError;
use crate::game::state::{CardInstance, DefenseEffect, PlayerGameState};

/// Suffix on a printed damage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageNotation {
    Flat,
    Plus,
    Minus,
    Times,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintedDamage {
    pub amount: u32,
    pub notation: DamageNotation,
}

/// Parse `"30"`, `"30+"`, `"50-"`, `"20×"` / `"20x"`; empty means no damage.
pub fn parse_damage(printed: &str) -> Result<PrintedDamage, PreconditionError> {
    let trimmed = printed.trim();
    if trimmed.is_empty() {
        return Ok(PrintedDamage {
            amount: 0,
            notation: DamageNotation::Flat,
        });
    }

    let (digits, notation) = if let Some(rest) = trimmed.strip_suffix('+') {
        (rest, DamageNotation::Plus)
    } else if let Some(rest) = trimmed.strip_suffix('-') {
        (rest, DamageNotation::Minus)
    } else if let Some(rest) = trimmed
        .strip_suffix('×')
        .or_else(|| trimmed.strip_suffix('x'))
        .or_else(|| trimmed.strip_suffix('X'))
    {
        (rest, DamageNotation::Times)
    } else {
        (trimmed, DamageNotation::Flat)
    };

    let amount = digits
        .trim()
        .parse::<u32>()
        .map_err(|_| PreconditionError::InvalidDamage(printed.to_string()))?;
    Ok(PrintedDamage { amount, notation })
}

/// One side of the exchange as the calculator sees it.
#[derive(Debug, Clone, Copy)]
pub struct Combatant<'a> {
    pub card: &'a Card,
    pub instance: &'a CardInstance,
    pub energy: &'a [EnergySupply],
    pub side: &'a PlayerGameState,
}

/// Everything the calculator needs, already resolved by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct DamageInput<'a> {
    pub attack: &'a Attack,
    pub attacker: Combatant<'a>,
    pub defender: Combatant<'a>,
    /// Replaces the printed magnitude when a coin flip decided it.
    pub coin_flip_base: Option<u32>,
    pub bonus: Option<DamageBonus>,
    pub penalty: Option<DamagePenalty>,
    /// Sum of flat modifiers whose conditions held.
    pub flat_modifier: i32,
    pub defenses: &'a [DefenseEffect],
}

/// Every intermediate value, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DamageBreakdown {
    pub base: u32,
    pub after_penalty: u32,
    pub bonus: u32,
    pub after_modifiers: u32,
    pub after_weakness: u32,
    pub after_resistance: u32,
    pub final_damage: u32,
}

pub fn compute_damage(input: &DamageInput<'_>) -> Result<DamageBreakdown, PreconditionError> {
    let printed = parse_damage(&input.attack.damage)?;
    let base = input.coin_flip_base.unwrap_or(printed.amount);

    let after_penalty = match (printed.notation, input.penalty) {
        (DamageNotation::Minus, Some(penalty)) => {
            apply_penalty(base, penalty, &input.attacker, &input.defender)
        }
        _ => base,
    };

    let bonus = match (printed.notation, input.bonus) {
        (DamageNotation::Plus, Some(rule)) => bonus_damage(rule, input),
        _ => 0,
    };

    let after_modifiers = apply_modifiers(after_penalty.saturating_add(bonus), input.flat_modifier);
    let after_weakness = apply_weakness(after_modifiers, input.attacker.card, input.defender.card);
    let after_resistance = apply_resistance(after_weakness, input.attacker.card, input.defender.card);
    let final_damage = apply_defenses(after_resistance, input.defenses);

    Ok(DamageBreakdown {
        base,
        after_penalty,
        bonus,
        after_modifiers,
        after_weakness,
        after_resistance,
        final_damage,
    })
}

/// Stage 2: `base − per_counter × counters`, floored at zero.
pub fn apply_penalty(
    base: u32,
    penalty: DamagePenalty,
    attacker: &Combatant<'_>,
    defender: &Combatant<'_>,
) -> u32 {
    let counters = match penalty.target {
        EffectTarget::SelfActive => attacker.instance.damage_counters(),
        EffectTarget::OpponentActive => defender.instance.damage_counters(),
    };
    base.saturating_sub(penalty.per_counter.saturating_mul(counters))
}

/// Stage 3: the single bonus rule behind a `+` value.
pub fn bonus_damage(rule: DamageBonus, input: &DamageInput<'_>) -> u32 {
    match rule {
        DamageBonus::EnergyCount {
            energy_type,
            per_energy,
        } => {
            let attached = count_energy(input.attacker.energy, energy_type);
            let required = required_of_type(&input.attack.energy_cost, energy_type);
            let extra = attached.saturating_sub(required);
            let counted = match input.attack.energy_bonus_cap {
                Some(cap) => extra.min(cap),
                None => extra,
            };
            counted.saturating_mul(per_energy)
        }
        DamageBonus::DefenderEnergy { per_energy } => {
            count_energy(input.defender.energy, None).saturating_mul(per_energy)
        }
        DamageBonus::DamageCounters {
            target,
            per_counter,
        } => {
            let counters = match target {
                EffectTarget::SelfActive => input.attacker.instance.damage_counters(),
                EffectTarget::OpponentActive => input.defender.instance.damage_counters(),
            };
            counters.saturating_mul(per_counter)
        }
        DamageBonus::BenchCount { side, per_pokemon } => {
            let own = input.attacker.side.bench.len() as u32;
            let theirs = input.defender.side.bench.len() as u32;
            let count = match side {
                BenchSide::Own => own,
                BenchSide::Opponent => theirs,
                BenchSide::Both => own + theirs,
            };
            count.saturating_mul(per_pokemon)
        }
        DamageBonus::Deferred => 0,
    }
}

/// Stages 4 and 5: add flat modifiers, clamp at zero.
pub fn apply_modifiers(amount: u32, modifier: i32) -> u32 {
    let total = i64::from(amount) + i64::from(modifier);
    u32::try_from(total.max(0)).unwrap_or(u32::MAX)
}

/// Stage 6.
pub fn apply_weakness(amount: u32, attacker: &Card, defender: &Card) -> u32 {
    match (attacker.energy_type, defender.weakness) {
        (Some(attack_type), Some(weakness)) if attack_type == weakness => amount.saturating_mul(2),
        _ => amount,
    }
}

/// Stage 7.
pub fn apply_resistance(amount: u32, attacker: &Card, defender: &Card) -> u32 {
    match (attacker.energy_type, defender.resistance) {
        (Some(attack_type), Some(resistance)) if attack_type == resistance.energy_type => {
            amount.saturating_sub(resistance.amount)
        }
        _ => amount,
    }
}

/// Stage 8: any matching prevention first, then every reduction.
pub fn apply_defenses(amount: u32, defenses: &[DefenseEffect]) -> u32 {
    let prevented = defenses.iter().any(|d| match d.kind {
        DefenseKind::Prevent { threshold: None } => true,
        DefenseKind::Prevent {
            threshold: Some(limit),
        } => amount <= limit,
        DefenseKind::Reduce { .. } => false,
    });
    if prevented {
        return 0;
    }

    defenses.iter().fold(amount, |acc, d| match d.kind {
        DefenseKind::Reduce { amount: reduce } => acc.saturating_sub(reduce),
        DefenseKind::Prevent { .. } => acc,
    })
}

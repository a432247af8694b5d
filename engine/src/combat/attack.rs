//! Attack resolution.
//!
//! An attack runs in two halves. `prepare_attack` checks everything that can
//! refuse the attack and pays its energy costs; `complete_attack` computes and
//! applies damage and every secondary effect. Attacks gated by a coin flip run
//! the first half at ATTACK time and the second once the flip completes.

use tracing::debug;

use super::damage::{compute_damage, parse_damage, Combatant, DamageBreakdown, DamageInput, DamageNotation};
use super::energy::{energy_supplies, validate_energy, EnergySupply};
use crate::data::card::{Attack, Card, EnergyType};
use crate::effects::conditions::{require, ConditionContext};
use crate::effects::mechanics::{AttackEffect, BenchSide, DefenseKind, EffectTarget};
use crate::error::{EngineResult, PreconditionError};
use crate::game::coin::{all_heads, CoinFlipResult};
use crate::game::engine::Rules;
use crate::game::state::{
    CardInstance, DefenseEffect, GameState, Knockout, PlayerId, StatusCondition,
};

/// An attack that passed its checks and had its costs paid.
#[derive(Debug, Clone)]
pub struct PreparedAttack {
    pub state: GameState,
    pub attack_index: usize,
    pub attack: Attack,
}

/// Everything `complete_attack` did.
#[derive(Debug, Clone)]
pub struct AttackOutcome {
    pub state: GameState,
    pub damage: DamageBreakdown,
    /// In the order they happened.
    pub knockouts: Vec<Knockout>,
    pub self_damage: u32,
}

fn active_of(state: &GameState, player: PlayerId) -> EngineResult<&CardInstance> {
    state
        .player(player)
        .active
        .as_ref()
        .ok_or_else(|| PreconditionError::NoActivePokemon { player }.into())
}

fn attack_of(card: &Card, attack_index: usize) -> EngineResult<&Attack> {
    card.attacks.get(attack_index).ok_or_else(|| {
        PreconditionError::InvalidAttackIndex {
            index: attack_index,
            available: card.attacks.len(),
        }
        .into()
    })
}

/// Validate an attack and pay its energy costs.
///
/// Self-targeted discard-energy effects are costs: the caller must name the
/// cards to discard in `energy_selection`, and they leave play before any
/// damage is computed.
pub fn prepare_attack(
    state: &GameState,
    attacker: PlayerId,
    attack_index: usize,
    energy_selection: Option<&[String]>,
    rules: &Rules<'_>,
) -> EngineResult<PreparedAttack> {
    let active = active_of(state, attacker)?;
    active_of(state, attacker.opponent())?;

    let card = rules.catalog.card(&active.card_id)?;
    let attack = attack_of(&card, attack_index)?.clone();

    let ctx = ConditionContext::new(state, attacker, None);
    require(rules.conditions, &attack.preconditions, &ctx, &attack.name)?;

    let supplies = energy_supplies(&active.attached_energy, rules.catalog)?;
    validate_energy(&attack.energy_cost, &supplies)?;

    let costs: Vec<(u32, Option<EnergyType>)> = attack
        .effects
        .iter()
        .filter(|e| e.is_energy_cost())
        .filter_map(|e| match e {
            AttackEffect::DiscardEnergy {
                count, energy_type, ..
            } => Some((*count, *energy_type)),
            _ => None,
        })
        .collect();

    let mut next = state.clone();
    if !costs.is_empty() {
        let selected = select_cost_energy(active, &supplies, &costs, energy_selection)?;
        let paid = active
            .clone()
            .without_energy(&selected)
            .ok_or_else(|| PreconditionError::InvalidEnergySelection("selected energy is not attached".into()))?;
        let side = next.player_mut(attacker);
        side.replace_instance(paid);
        side.discard.extend(selected.iter().cloned());
        debug!(match_id = %state.match_id, ?attacker, discarded = ?selected, "attack energy cost paid");
    }

    Ok(PreparedAttack {
        state: next,
        attack_index,
        attack,
    })
}

/// Check an explicit selection against the discard costs, in effect order.
fn select_cost_energy(
    active: &CardInstance,
    supplies: &[EnergySupply],
    costs: &[(u32, Option<EnergyType>)],
    selection: Option<&[String]>,
) -> EngineResult<Vec<String>> {
    let required: u32 = costs.iter().map(|(count, _)| count).sum();
    let Some(selection) = selection else {
        // Shared type of every cost, if they agree
        let energy_type = match costs.split_first() {
            Some((&(_, first), rest)) if rest.iter().all(|&(_, t)| t == first) => first,
            _ => None,
        };
        let available = supplies
            .iter()
            .filter(|s| {
                costs
                    .iter()
                    .any(|(_, t)| t.map_or(true, |t| s.provides(t)))
            })
            .map(|s| s.card_id.clone())
            .collect();
        return Err(PreconditionError::EnergySelectionRequired {
            required,
            energy_type,
            available,
        }
        .into());
    };

    if selection.len() as u32 != required {
        return Err(PreconditionError::InvalidEnergySelection(format!(
            "expected {} energy, got {}",
            required,
            selection.len()
        ))
        .into());
    }

    let mut rest = selection;
    for &(count, energy_type) in costs {
        let (chunk, tail) = rest.split_at(count as usize);
        rest = tail;
        for id in chunk {
            let supply = supplies
                .iter()
                .find(|s| &s.card_id == id)
                .ok_or_else(|| PreconditionError::InvalidEnergySelection(format!("{} is not attached to {}", id, active.instance_id)))?;
            if let Some(t) = energy_type {
                if !supply.provides(t) {
                    return Err(PreconditionError::InvalidEnergySelection(format!("{} does not provide {:?}", id, t)).into());
                }
            }
        }
    }
    Ok(selection.to_vec())
}

/// Resolve damage and every secondary effect of a prepared attack.
///
/// `coin_flips` carries the completed flip results for gated attacks; the
/// attack's base damage then comes from its flip configuration.
pub fn complete_attack(
    state: &GameState,
    attacker: PlayerId,
    attack_index: usize,
    coin_flips: Option<&[CoinFlipResult]>,
    rules: &Rules<'_>,
) -> EngineResult<AttackOutcome> {
    let defender = attacker.opponent();
    let attacker_active = active_of(state, attacker)?;
    let defender_active = active_of(state, defender)?;
    let attacker_card = rules.catalog.card(&attacker_active.card_id)?;
    let defender_card = rules.catalog.card(&defender_active.card_id)?;
    let attack = attack_of(&attacker_card, attack_index)?;
    let text = attack.text.as_deref().unwrap_or("");

    let printed = parse_damage(&attack.damage)?;
    let coin_flip_base = match (&attack.coin_flip, coin_flips) {
        (Some(config), Some(results)) => Some(config.damage(printed.amount, results)),
        _ => None,
    };
    let bonus = match printed.notation {
        DamageNotation::Plus => rules.interpreter.damage_bonus(text),
        _ => None,
    };
    let penalty = match printed.notation {
        DamageNotation::Minus => rules
            .interpreter
            .damage_penalty(text, &attacker_card.name, &defender_card.name),
        _ => None,
    };

    let ctx = ConditionContext::new(state, attacker, coin_flips);
    let holds = |effect: &AttackEffect| rules.conditions.evaluate(effect.conditions(), &ctx);

    let mut flat_modifier = 0i32;
    for effect in &attack.effects {
        if let AttackEffect::DamageModifier { amount, .. } = effect {
            if holds(effect)? {
                flat_modifier += amount;
            }
        }
    }

    let attacker_energy = energy_supplies(&attacker_active.attached_energy, rules.catalog)?;
    let defender_energy = energy_supplies(&defender_active.attached_energy, rules.catalog)?;
    let defenses: Vec<DefenseEffect> = state
        .defenses_for(defender, &defender_active.instance_id)
        .cloned()
        .collect();

    let damage = compute_damage(&DamageInput {
        attack,
        attacker: Combatant {
            card: &attacker_card,
            instance: attacker_active,
            energy: &attacker_energy,
            side: state.player(attacker),
        },
        defender: Combatant {
            card: &defender_card,
            instance: defender_active,
            energy: &defender_energy,
            side: state.player(defender),
        },
        coin_flip_base,
        bonus,
        penalty,
        flat_modifier,
        defenses: &defenses,
    })?;
    debug!(
        match_id = %state.match_id,
        attack = %attack.name,
        base = damage.base,
        after_penalty = damage.after_penalty,
        bonus = damage.bonus,
        after_modifiers = damage.after_modifiers,
        after_weakness = damage.after_weakness,
        after_resistance = damage.after_resistance,
        final_damage = damage.final_damage,
        "damage computed"
    );

    let mut next = state.clone();
    let mut knockouts = Vec::new();

    let hit = defender_active.clone().with_damage(damage.final_damage);
    let defender_id = hit.instance_id.clone();
    next.player_mut(defender).replace_instance(hit);
    knock_out_if_needed(&mut next, defender, &defender_id, &mut knockouts);

    // Recoil and splash.
    let flip_recoil = match (&attack.coin_flip, coin_flips) {
        (Some(config), Some(results)) => config.self_damage(results),
        _ => 0,
    };
    let recoil = rules.interpreter.self_damage(text).unwrap_or(0).saturating_add(flip_recoil);
    let attacker_id = attacker_active.instance_id.clone();
    if recoil > 0 {
        damage_instance(&mut next, attacker, &attacker_id, recoil);
        knock_out_if_needed(&mut next, attacker, &attacker_id, &mut knockouts);
    }

    if let Some(splash) = rules.interpreter.bench_damage(text) {
        let sides = match splash.side {
            BenchSide::Own => vec![attacker],
            BenchSide::Opponent => vec![defender],
            BenchSide::Both => vec![attacker, defender],
        };
        for side in sides {
            let targets: Vec<String> = next.player(side).bench.iter().map(|p| p.instance_id.clone()).collect();
            for id in &targets {
                damage_instance(&mut next, side, id, splash.amount);
            }
            for id in &targets {
                knock_out_if_needed(&mut next, side, id, &mut knockouts);
            }
        }
    }

    // Status conditions.
    let structured: Vec<&AttackEffect> = attack
        .effects
        .iter()
        .filter(|e| matches!(e, AttackEffect::ApplyStatus { .. }))
        .collect();
    if structured.is_empty() {
        if let Some(inferred) = rules.interpreter.status_fallback(text) {
            let lands = !inferred.requires_heads || coin_flips.is_some_and(all_heads);
            if lands {
                apply_status(&mut next, defender, inferred.status, None, rules);
            }
        }
    } else {
        for effect in structured {
            if let AttackEffect::ApplyStatus {
                status,
                target,
                poison_damage,
                ..
            } = effect
            {
                if holds(effect)? {
                    let owner = target_owner(attacker, *target);
                    apply_status(&mut next, owner, *status, *poison_damage, rules);
                }
            }
        }
    }

    // Energy the opponent loses.
    for effect in &attack.effects {
        if let AttackEffect::DiscardEnergy {
            target: EffectTarget::OpponentActive,
            count,
            energy_type,
            ..
        } = effect
        {
            if holds(effect)? {
                discard_defender_energy(&mut next, defender, *count, *energy_type, rules)?;
            }
        }
    }

    // Protection for the attacker during the opponent's next turn.
    for effect in &attack.effects {
        let kind = match effect {
            AttackEffect::PreventDamage { threshold, .. } => DefenseKind::Prevent {
                threshold: *threshold,
            },
            AttackEffect::ReduceDamage { amount, .. } => DefenseKind::Reduce { amount: *amount },
            _ => continue,
        };
        if holds(effect)? && next.player(attacker).instance(&attacker_id).is_some() {
            next.defenses.push(DefenseEffect {
                player: attacker,
                instance_id: attacker_id.clone(),
                kind,
                expires_after_turn: state.turn_number + 1,
            });
        }
    }

    Ok(AttackOutcome {
        state: next,
        damage,
        knockouts,
        self_damage: recoil,
    })
}

fn target_owner(attacker: PlayerId, target: EffectTarget) -> PlayerId {
    match target {
        EffectTarget::SelfActive => attacker,
        EffectTarget::OpponentActive => attacker.opponent(),
    }
}

fn damage_instance(state: &mut GameState, player: PlayerId, instance_id: &str, amount: u32) {
    let side = state.player_mut(player);
    if let Some(target) = side.instance(instance_id).cloned() {
        side.replace_instance(target.with_damage(amount));
    }
}

fn knock_out_if_needed(state: &mut GameState, player: PlayerId, instance_id: &str, knockouts: &mut Vec<Knockout>) {
    let down = state
        .player(player)
        .instance(instance_id)
        .is_some_and(|p| p.is_knocked_out());
    if down {
        if let Some(ko) = state.knock_out(player, instance_id) {
            knockouts.push(ko);
        }
    }
}

/// Put a status condition on `owner`'s active Pokemon, if it is still in play.
fn apply_status(
    state: &mut GameState,
    owner: PlayerId,
    status: StatusCondition,
    poison_damage: Option<u32>,
    rules: &Rules<'_>,
) {
    let clears_at = state.next_turn_of(owner, state.turn_number);
    let Some(target) = state.player(owner).active.clone() else {
        return;
    };

    let mut updated = target.with_status(status);
    match status {
        StatusCondition::Paralyzed => updated = updated.with_paralysis_clear_turn(clears_at),
        StatusCondition::Poisoned => {
            updated = updated.with_poison_damage(poison_damage.unwrap_or(rules.config.default_poison_damage))
        }
        _ => {}
    }
    debug!(match_id = %state.match_id, ?owner, instance = %updated.instance_id, ?status, "status applied");
    state.player_mut(owner).replace_instance(updated);
}

/// Discard up to `count` matching energy from the defender's active, most
/// recently attached first.
fn discard_defender_energy(
    state: &mut GameState,
    defender: PlayerId,
    count: u32,
    energy_type: Option<EnergyType>,
    rules: &Rules<'_>,
) -> EngineResult<()> {
    let Some(target) = state.player(defender).active.clone() else {
        return Ok(());
    };
    let supplies = energy_supplies(&target.attached_energy, rules.catalog)?;
    let chosen: Vec<String> = supplies
        .iter()
        .rev()
        .filter(|s| energy_type.map_or(true, |t| s.provides(t)))
        .take(count as usize)
        .map(|s| s.card_id.clone())
        .collect();
    if chosen.is_empty() {
        return Ok(());
    }

    if let Some(stripped) = target.without_energy(&chosen) {
        let side = state.player_mut(defender);
        side.replace_instance(stripped);
        side.discard.extend(chosen);
    }
    Ok(())
}

//! Attack-text interpretation.
//!
//! Card text is only ever read here. The pipeline asks an
//! `AttackTextInterpreter` for structured descriptors and works with those.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::mechanics::{BenchDamage, BenchSide, DamageBonus, DamagePenalty, EffectTarget};
use crate::data::card::EnergyType;
use crate::game::state::StatusCondition;

/// Status condition read from text when an attack has no structured status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInference {
    pub status: StatusCondition,
    /// Lands on the opponent only if the attack's flips were all heads.
    pub requires_heads: bool,
}

/// Turns attack text into the descriptors the damage and attack stages consume.
pub trait AttackTextInterpreter {
    /// Recoil the attacker deals to itself.
    fn self_damage(&self, text: &str) -> Option<u32>;

    /// Splash damage to benched Pokemon.
    fn bench_damage(&self, text: &str) -> Option<BenchDamage>;

    fn status_fallback(&self, text: &str) -> Option<StatusInference>;

    /// The bonus rule behind a `+` damage value.
    fn damage_bonus(&self, text: &str) -> Option<DamageBonus>;

    /// The reduction behind a `-` damage value. Whose damage counters count
    /// depends on which Pokemon the text names.
    fn damage_penalty(&self, text: &str, attacker_name: &str, defender_name: &str) -> Option<DamagePenalty>;
}

/// English card-text interpreter built on regular expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternInterpreter;

impl PatternInterpreter {
    pub fn new() -> Self {
        PatternInterpreter
    }
}

fn captures<'t>(pattern: &str, text: &'t str) -> Option<regex_lite::Captures<'t>> {
    Regex::new(pattern).ok().and_then(|r| r.captures(text))
}

fn number(pattern: &str, text: &str) -> Option<u32> {
    captures(pattern, text).and_then(|caps| caps[1].parse::<u32>().ok())
}

impl AttackTextInterpreter for PatternInterpreter {
    fn self_damage(&self, text: &str) -> Option<u32> {
        let text = text.to_lowercase();
        number(r"(\d+) damage to itself", &text)
    }

    fn bench_damage(&self, text: &str) -> Option<BenchDamage> {
        let text = text.to_lowercase();
        let caps = captures(r"(\d+) damage to ([^.]*?)bench", &text)?;
        let amount = caps[1].parse::<u32>().ok()?;
        let whose = &caps[2];
        let side = if whose.contains("opponent") {
            BenchSide::Opponent
        } else if whose.contains("your") {
            BenchSide::Own
        } else {
            BenchSide::Both
        };
        Some(BenchDamage { amount, side })
    }

    fn status_fallback(&self, text: &str) -> Option<StatusInference> {
        let text = text.to_lowercase();
        let requires_heads = text.contains("flip a coin") && text.contains("if heads");
        [
            ("poisoned", StatusCondition::Poisoned),
            ("burned", StatusCondition::Burned),
            ("asleep", StatusCondition::Asleep),
            ("paralyzed", StatusCondition::Paralyzed),
            ("confused", StatusCondition::Confused),
        ]
        .into_iter()
        .find(|(name, _)| text.contains(&format!("is now {}", name)))
        .map(|(_, status)| StatusInference {
            status,
            requires_heads,
        })
    }

    fn damage_bonus(&self, text: &str) -> Option<DamageBonus> {
        let text = text.to_lowercase();

        if let Some(caps) = captures(
            r"(\d+) more damage for each (?:(\w+) )?energy attached to this",
            &text,
        ) {
            let per_energy = caps[1].parse::<u32>().ok()?;
            let energy_type = caps.get(2).and_then(|m| EnergyType::from_name(m.as_str()));
            return Some(DamageBonus::EnergyCount {
                energy_type,
                per_energy,
            });
        }

        if let Some(per_energy) = number(
            r"(\d+) more damage for each energy attached to your opponent",
            &text,
        ) {
            return Some(DamageBonus::DefenderEnergy { per_energy });
        }

        if let Some(caps) = captures(r"(\d+) more damage for each damage counter on ([^.]*)", &text) {
            let per_counter = caps[1].parse::<u32>().ok()?;
            let target = if caps[2].contains("opponent") {
                EffectTarget::OpponentActive
            } else {
                EffectTarget::SelfActive
            };
            return Some(DamageBonus::DamageCounters {
                target,
                per_counter,
            });
        }

        if let Some(caps) = captures(r"(\d+) more damage for each ([^.]*?)bench", &text) {
            let per_pokemon = caps[1].parse::<u32>().ok()?;
            let side = if caps[2].contains("opponent") {
                BenchSide::Opponent
            } else if caps[2].contains("your") {
                BenchSide::Own
            } else {
                BenchSide::Both
            };
            return Some(DamageBonus::BenchCount { side, per_pokemon });
        }

        // "Flip a coin. If heads, ..." and "If ..., this attack does X more damage"
        if text.contains("more damage") {
            return Some(DamageBonus::Deferred);
        }
        None
    }

    fn damage_penalty(&self, text: &str, attacker_name: &str, defender_name: &str) -> Option<DamagePenalty> {
        let text = text.to_lowercase();
        let caps = captures(r"(\d+) less damage for each damage counter on ([^.]*)", &text)?;
        let per_counter = caps[1].parse::<u32>().ok()?;
        let subject = &caps[2];

        let attacker = attacker_name.to_lowercase();
        let defender = defender_name.to_lowercase();
        let target = if subject.contains("this pok") || (!attacker.is_empty() && subject.contains(&attacker)) {
            EffectTarget::SelfActive
        } else if subject.contains("opponent") || (!defender.is_empty() && subject.contains(&defender)) {
            EffectTarget::OpponentActive
        } else {
            EffectTarget::SelfActive
        };
        Some(DamagePenalty {
            per_counter,
            target,
        })
    }
}


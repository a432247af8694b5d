use crate::data::card::EnergyType;
use crate::game::state::StatusCondition;
use serde::{Deserialize, Serialize};

/// Which active Pokemon an effect lands on, relative to the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    /// The attacking/acting Pokemon.
    SelfActive,
    /// The opponent's active Pokemon.
    OpponentActive,
}

/// Which benches an effect counts or hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchSide {
    Own,
    Opponent,
    Both,
}

/// Prerequisite for a structured effect.
///
/// Evaluated only by a `ConditionEvaluator`; the pipeline never inspects these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Every flip of the attached coin flip came up heads.
    CoinFlipHeads,
    /// At least one flip came up tails.
    CoinFlipTails,
    /// At least this many heads.
    HeadsAtLeast(u32),
    /// The acting Pokemon has damage counters.
    SelfHasDamage,
    /// The opponent's active Pokemon has damage counters.
    OpponentHasDamage,
    OpponentHasStatus(StatusCondition),
    /// The acting Pokemon has at least `count` units of energy (of a type, if given).
    SelfEnergyAtLeast {
        energy_type: Option<EnergyType>,
        count: u32,
    },
    /// The opponent's active Pokemon is of this type.
    OpponentIsType(EnergyType),
    OpponentIsEx,
    OwnBenchAtLeast(u32),
    OpponentBenchAtLeast(u32),
}

/// Structured attack effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackEffect {
    /// Flat damage added (or removed) before weakness.
    DamageModifier {
        amount: i32,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    /// Apply a status condition.
    ApplyStatus {
        status: StatusCondition,
        target: EffectTarget,
        #[serde(default)]
        conditions: Vec<Condition>,
        /// Poison damage override.
        #[serde(default)]
        poison_damage: Option<u32>,
    },
    /// Discard energy. On `SelfActive` this is a cost paid with an explicit
    /// selection before damage; on `OpponentActive` it resolves after damage.
    DiscardEnergy {
        target: EffectTarget,
        count: u32,
        #[serde(default)]
        energy_type: Option<EnergyType>,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    /// During the opponent's next turn, prevent damage to the attacker.
    /// `threshold: None` prevents all damage; otherwise damage at or below it.
    PreventDamage {
        #[serde(default)]
        threshold: Option<u32>,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    /// During the opponent's next turn, the attacker takes `amount` less damage.
    ReduceDamage {
        amount: u32,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
}

impl AttackEffect {
    pub fn conditions(&self) -> &[Condition] {
        match self {
            AttackEffect::DamageModifier { conditions, .. }
            | AttackEffect::ApplyStatus { conditions, .. }
            | AttackEffect::DiscardEnergy { conditions, .. }
            | AttackEffect::PreventDamage { conditions, .. }
            | AttackEffect::ReduceDamage { conditions, .. } => conditions,
        }
    }

    /// A self-targeted energy discard that must be paid before damage.
    pub fn is_energy_cost(&self) -> bool {
        matches!(
            self,
            AttackEffect::DiscardEnergy {
                target: EffectTarget::SelfActive,
                ..
            }
        )
    }
}

/// Structured ability effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Heal this Pokemon.
    Heal { amount: u32 },
    /// Draw cards from deck.
    DrawCards { count: u32 },
}

/// The single bonus rule behind a `+` damage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DamageBonus {
    /// Per extra energy beyond the attack's own requirement, capped by
    /// `Attack::energy_bonus_cap`. `energy_type: None` counts any energy.
    EnergyCount {
        energy_type: Option<EnergyType>,
        per_energy: u32,
    },
    /// Per energy attached to the defending Pokemon.
    DefenderEnergy { per_energy: u32 },
    /// Per damage counter on the target.
    DamageCounters { target: EffectTarget, per_counter: u32 },
    /// Per benched Pokemon.
    BenchCount { side: BenchSide, per_pokemon: u32 },
    /// Bonus decided by a coin flip or condition elsewhere; adds nothing here.
    Deferred,
}

/// The reduction behind a `-` damage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePenalty {
    pub per_counter: u32,
    /// Whose damage counters are counted.
    pub target: EffectTarget,
}

/// Splash damage to benched Pokemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchDamage {
    pub amount: u32,
    pub side: BenchSide,
}

/// A defensive effect recorded on a Pokemon instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefenseKind {
    Prevent { threshold: Option<u32> },
    Reduce { amount: u32 },
}

use tcg_rules_engine::data::card::EnergyType;
use tcg_rules_engine::effects::mechanics::*;
use tcg_rules_engine::effects::text::{AttackTextInterpreter, PatternInterpreter, StatusInference};
use tcg_rules_engine::game::state::StatusCondition;

#[test]
fn test_self_damage() {
    let text = PatternInterpreter::new();
    assert_eq!(text.self_damage("This Pokémon also does 30 damage to itself."), Some(30));
    assert_eq!(text.self_damage("Discard an Energy from this Pokémon."), None);
}

#[test]
fn test_bench_damage_sides() {
    let text = PatternInterpreter::new();
    assert_eq!(
        text.bench_damage("This attack also does 20 damage to each of your opponent's Benched Pokémon."),
        Some(BenchDamage {
            amount: 20,
            side: BenchSide::Opponent
        })
    );
    assert_eq!(
        text.bench_damage("This attack also does 10 damage to 1 of your Benched Pokémon."),
        Some(BenchDamage {
            amount: 10,
            side: BenchSide::Own
        })
    );
    assert_eq!(
        text.bench_damage("This attack does 10 damage to each Benched Pokémon (both yours and your opponent's)."),
        Some(BenchDamage {
            amount: 10,
            side: BenchSide::Both
        })
    );
    assert_eq!(text.bench_damage("This Pokémon also does 10 damage to itself."), None);
}

#[test]
fn test_status_fallback() {
    let text = PatternInterpreter::new();
    assert_eq!(
        text.status_fallback("Your opponent's Active Pokémon is now Poisoned."),
        Some(StatusInference {
            status: StatusCondition::Poisoned,
            requires_heads: false
        })
    );
    assert_eq!(
        text.status_fallback("Flip a coin. If heads, your opponent's Active Pokémon is now Paralyzed."),
        Some(StatusInference {
            status: StatusCondition::Paralyzed,
            requires_heads: true
        })
    );
    assert_eq!(text.status_fallback("Heal 30 damage from this Pokémon."), None);
}

#[test]
fn test_damage_bonus_rules() {
    let text = PatternInterpreter::new();
    assert_eq!(
        text.damage_bonus("This attack does 10 more damage for each Water Energy attached to this Pokémon."),
        Some(DamageBonus::EnergyCount {
            energy_type: Some(EnergyType::Water),
            per_energy: 10
        })
    );
    assert_eq!(
        text.damage_bonus("This attack does 20 more damage for each Energy attached to this Pokémon."),
        Some(DamageBonus::EnergyCount {
            energy_type: None,
            per_energy: 20
        })
    );
    assert_eq!(
        text.damage_bonus("This attack does 20 more damage for each Energy attached to your opponent's Active Pokémon."),
        Some(DamageBonus::DefenderEnergy { per_energy: 20 })
    );
    assert_eq!(
        text.damage_bonus("This attack does 10 more damage for each damage counter on your opponent's Active Pokémon."),
        Some(DamageBonus::DamageCounters {
            target: EffectTarget::OpponentActive,
            per_counter: 10
        })
    );
    assert_eq!(
        text.damage_bonus("This attack does 20 more damage for each of your Benched Pokémon."),
        Some(DamageBonus::BenchCount {
            side: BenchSide::Own,
            per_pokemon: 20
        })
    );
    assert_eq!(
        text.damage_bonus("Flip a coin. If heads, this attack does 30 more damage."),
        Some(DamageBonus::Deferred)
    );
    assert_eq!(text.damage_bonus(""), None);
}

#[test]
fn test_damage_penalty_targets() {
    let text = PatternInterpreter::new();
    assert_eq!(
        text.damage_penalty(
            "This attack does 10 less damage for each damage counter on this Pokémon.",
            "Machop",
            "Pikachu"
        ),
        Some(DamagePenalty {
            per_counter: 10,
            target: EffectTarget::SelfActive
        })
    );
    assert_eq!(
        text.damage_penalty(
            "This attack does 20 less damage for each damage counter on your opponent's Active Pokémon.",
            "Machop",
            "Pikachu"
        ),
        Some(DamagePenalty {
            per_counter: 20,
            target: EffectTarget::OpponentActive
        })
    );
    assert_eq!(
        text.damage_penalty(
            "This attack does 10 less damage for each damage counter on Pikachu.",
            "Machop",
            "Pikachu"
        ),
        Some(DamagePenalty {
            per_counter: 10,
            target: EffectTarget::OpponentActive
        })
    );
    assert_eq!(text.damage_penalty("Does nothing special.", "Machop", "Pikachu"), None);
}

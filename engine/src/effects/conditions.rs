use crate::combat::energy::{count_energy, energy_supplies};
use crate::data::catalog::CardRepository;
use crate::effects::mechanics::Condition;
use crate::error::{EngineResult, PreconditionError};
use crate::game::coin::{all_heads, heads_count, CoinFlipResult};
use crate::game::state::{GameState, PlayerGameState, PlayerId};

/// Snapshot a condition is evaluated against, from the acting player's view.
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
    pub state: &'a GameState,
    pub player: PlayerId,
    pub player_state: &'a PlayerGameState,
    pub opponent_state: &'a PlayerGameState,
    /// Results of the coin flip gating the effect, if any.
    pub coin_flips: Option<&'a [CoinFlipResult]>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(state: &'a GameState, player: PlayerId, coin_flips: Option<&'a [CoinFlipResult]>) -> Self {
        ConditionContext {
            state,
            player,
            player_state: state.player(player),
            opponent_state: state.player(player.opponent()),
            coin_flips,
        }
    }
}

/// Decides whether structured effect prerequisites hold.
///
/// The attack pipeline never interprets a `Condition` itself.
pub trait ConditionEvaluator {
    /// All conditions must hold; an empty list always holds.
    fn evaluate(&self, conditions: &[Condition], ctx: &ConditionContext<'_>) -> EngineResult<bool>;
}

/// Evaluator covering every `Condition` variant against the card catalog.
pub struct StandardConditions<'a> {
    catalog: &'a dyn CardRepository,
}

impl<'a> StandardConditions<'a> {
    pub fn new(catalog: &'a dyn CardRepository) -> Self {
        StandardConditions { catalog }
    }

    fn holds(&self, condition: &Condition, ctx: &ConditionContext<'_>) -> EngineResult<bool> {
        let flips = ctx.coin_flips.unwrap_or(&[]);
        let own_active = ctx.player_state.active.as_ref();
        let their_active = ctx.opponent_state.active.as_ref();

        let result = match condition {
            Condition::CoinFlipHeads => all_heads(flips),
            Condition::CoinFlipTails => flips.iter().any(|r| !r.heads),
            Condition::HeadsAtLeast(n) => heads_count(flips) >= *n,
            Condition::SelfHasDamage => own_active.is_some_and(|p| p.has_damage()),
            Condition::OpponentHasDamage => their_active.is_some_and(|p| p.has_damage()),
            Condition::OpponentHasStatus(status) => their_active.is_some_and(|p| p.has_status(*status)),
            Condition::SelfEnergyAtLeast { energy_type, count } => match own_active {
                Some(active) => {
                    let supplies = energy_supplies(&active.attached_energy, self.catalog)?;
                    count_energy(&supplies, *energy_type) >= *count
                }
                None => false,
            },
            Condition::OpponentIsType(energy_type) => match their_active {
                Some(active) => self.catalog.card(&active.card_id)?.energy_type == Some(*energy_type),
                None => false,
            },
            Condition::OpponentIsEx => match their_active {
                Some(active) => self.catalog.card(&active.card_id)?.is_ex,
                None => false,
            },
            Condition::OwnBenchAtLeast(n) => ctx.player_state.bench.len() as u32 >= *n,
            Condition::OpponentBenchAtLeast(n) => ctx.opponent_state.bench.len() as u32 >= *n,
        };
        Ok(result)
    }
}

impl ConditionEvaluator for StandardConditions<'_> {
    fn evaluate(&self, conditions: &[Condition], ctx: &ConditionContext<'_>) -> EngineResult<bool> {
        for condition in conditions {
            if !self.holds(condition, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Fails with `AttackPreconditionsUnmet` unless every precondition holds.
pub fn require(
    evaluator: &dyn ConditionEvaluator,
    conditions: &[Condition],
    ctx: &ConditionContext<'_>,
    attack_name: &str,
) -> EngineResult<()> {
    if evaluator.evaluate(conditions, ctx)? {
        Ok(())
    } else {
        Err(PreconditionError::AttackPreconditionsUnmet(attack_name.to_string()).into())
    }
}

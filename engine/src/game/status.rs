use tracing::debug;

use crate::config::EngineConfig;
use crate::game::state::{GameState, Knockout, PendingStatusCheck, PlayerId, StatusCondition};

/// What happened between two turns.
#[derive(Debug, Clone)]
pub struct BetweenTurnsOutcome {
    pub state: GameState,
    pub knockouts: Vec<Knockout>,
    /// Sleeping active Pokemon, in player order, each needing a wake-up flip.
    pub sleep_checks: Vec<PendingStatusCheck>,
}

/// Apply between-turn status transitions.
///
/// Expects `turn_number` to already name the turn about to start. Poison and
/// burn hit every Pokemon in play; paralysis and sleep only concern the
/// active Pokemon.
pub fn process_between_turns(state: &GameState, config: &EngineConfig) -> BetweenTurnsOutcome {
    let mut next = state.clone();
    let mut knockouts = Vec::new();
    let mut sleep_checks = Vec::new();

    for player in PlayerId::BOTH {
        let ids: Vec<String> = next
            .player(player)
            .pokemon_in_play()
            .map(|p| p.instance_id.clone())
            .collect();

        for id in &ids {
            let Some(pokemon) = next.player(player).instance(id).cloned() else {
                continue;
            };
            let mut updated = pokemon;
            if updated.has_status(StatusCondition::Poisoned) {
                let poison = updated.poison_damage;
                updated = updated.with_damage(poison);
            }
            if updated.has_status(StatusCondition::Burned) {
                updated = updated.with_damage(config.burn_damage);
            }
            let knocked_out = updated.is_knocked_out();
            next.player_mut(player).replace_instance(updated);

            if knocked_out {
                if let Some(ko) = next.knock_out(player, id) {
                    knockouts.push(ko);
                }
            }
        }

        let Some(active) = next.player(player).active.clone() else {
            continue;
        };
        let turn = next.turn_number;
        let wears_off = active.has_status(StatusCondition::Paralyzed)
            && active.paralysis_clears_at_turn.is_some_and(|t| turn > t);
        if wears_off {
            debug!(match_id = %next.match_id, ?player, instance = %active.instance_id, "paralysis wore off");
            let cured = active.clone().without_status(StatusCondition::Paralyzed);
            next.player_mut(player).replace_instance(cured);
        }
        if active.has_status(StatusCondition::Asleep) {
            sleep_checks.push(PendingStatusCheck {
                player,
                instance_id: active.instance_id.clone(),
            });
        }
    }

    let turn = next.turn_number;
    next.defenses.retain(|d| turn <= d.expires_after_turn);

    BetweenTurnsOutcome {
        state: next,
        knockouts,
        sleep_checks,
    }
}

//! Coin flips shared by both players.
//!
//! Flip outcomes are a pure function of `(match_id, turn_number, action_id,
//! flip_index)`, so either player (or an auditor replaying the log) can
//! recompute them. An ATTACK flip moves from READY_TO_FLIP to COMPLETED once
//! the configured approvals arrive; the first approval generates and stores
//! the results.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::combat::energy::{count_energy, energy_supplies};
use crate::config::{CompletionPolicy, EngineConfig};
use crate::data::card::EnergyType;
use crate::data::catalog::CardRepository;
use crate::error::{EngineResult, ProtocolError};
use crate::game::rng::flip_coin;
use crate::game::state::{GameState, PendingStatusCheck, PlayerId, TurnPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoinFlipStatus {
    ReadyToFlip,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoinFlipContext {
    /// Gates the resolution of an attack.
    Attack,
    /// Gates a single status transition (sleep wake-up).
    StatusCheck,
}

/// Game quantity that decides a VARIABLE flip count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableFlipSource {
    /// Energy attached to the flipping player's active Pokemon.
    EnergyAttached { energy_type: Option<EnergyType> },
    OwnBench,
    OpponentBench,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipCount {
    Fixed(u32),
    UntilTails,
    Variable(VariableFlipSource),
}

/// How flip results turn into damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DamageCalculation {
    /// Full damage if every flip is heads, nothing otherwise.
    BaseDamage,
    /// `damage_per_head` for each heads.
    MultiplyByHeads,
    /// Base damage plus `conditional_bonus` if every flip is heads.
    ConditionalBonus,
    /// Base damage; the attacker takes `self_damage_on_tails` on any tails.
    ConditionalSelfDamage,
    /// Base damage; the flips only feed effect conditions.
    StatusEffectOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinFlipConfiguration {
    pub count: FlipCount,
    pub calculation: DamageCalculation,
    /// Falls back to the attack's printed damage when zero.
    #[serde(default)]
    pub base_damage: u32,
    #[serde(default)]
    pub damage_per_head: u32,
    #[serde(default)]
    pub conditional_bonus: u32,
    #[serde(default)]
    pub self_damage_on_tails: u32,
}

impl CoinFlipConfiguration {
    pub fn new(count: FlipCount, calculation: DamageCalculation) -> Self {
        CoinFlipConfiguration {
            count,
            calculation,
            base_damage: 0,
            damage_per_head: 0,
            conditional_bonus: 0,
            self_damage_on_tails: 0,
        }
    }

    /// One flip whose outcome only matters to effect conditions.
    pub fn single_check() -> Self {
        Self::new(FlipCount::Fixed(1), DamageCalculation::StatusEffectOnly)
    }

    /// Damage the flips produce, before any bonus or weakness stage.
    pub fn damage(&self, printed: u32, results: &[CoinFlipResult]) -> u32 {
        let base = if self.base_damage > 0 {
            self.base_damage
        } else {
            printed
        };
        match self.calculation {
            DamageCalculation::BaseDamage => {
                if all_heads(results) {
                    base
                } else {
                    0
                }
            }
            DamageCalculation::MultiplyByHeads => {
                let per_head = if self.damage_per_head > 0 {
                    self.damage_per_head
                } else {
                    printed
                };
                heads_count(results).saturating_mul(per_head)
            }
            DamageCalculation::ConditionalBonus => {
                if all_heads(results) {
                    base.saturating_add(self.conditional_bonus)
                } else {
                    base
                }
            }
            DamageCalculation::ConditionalSelfDamage | DamageCalculation::StatusEffectOnly => base,
        }
    }

    /// Recoil the attacker takes from these results.
    pub fn self_damage(&self, results: &[CoinFlipResult]) -> u32 {
        if self.calculation == DamageCalculation::ConditionalSelfDamage
            && results.iter().any(|r| !r.heads)
        {
            self.self_damage_on_tails
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinFlipResult {
    pub index: u32,
    pub heads: bool,
}

pub fn heads_count(results: &[CoinFlipResult]) -> u32 {
    results.iter().filter(|r| r.heads).count() as u32
}

/// True for a non-empty sequence with no tails.
pub fn all_heads(results: &[CoinFlipResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.heads)
}

/// A coin flip waiting on, or finished with, player approvals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinFlipState {
    pub status: CoinFlipStatus,
    pub context: CoinFlipContext,
    pub configuration: CoinFlipConfiguration,
    pub results: Vec<CoinFlipResult>,
    /// Attack to resolve when an ATTACK flip completes.
    pub attack_index: Option<usize>,
    pub player1_approved: bool,
    pub player2_approved: bool,
    /// Identity of the action that created the flip; seeds the results.
    pub action_id: String,
    pub turn_number: u32,
    /// Attacker, or owner of the Pokemon under a status check.
    pub initiator: PlayerId,
    /// Pokemon under a status check.
    pub target_instance: Option<String>,
}

impl CoinFlipState {
    pub fn approved_by(&self, player: PlayerId) -> bool {
        match player {
            PlayerId::Player1 => self.player1_approved,
            PlayerId::Player2 => self.player2_approved,
        }
    }

    fn approve(&mut self, player: PlayerId) {
        match player {
            PlayerId::Player1 => self.player1_approved = true,
            PlayerId::Player2 => self.player2_approved = true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == CoinFlipStatus::ReadyToFlip
    }
}

/// Result of one approval.
#[derive(Debug, Clone)]
pub struct Approval {
    pub state: GameState,
    /// The flip moved to COMPLETED with this approval.
    pub completed: bool,
}

/// Creates flips, generates their results and tracks approvals.
#[derive(Debug, Clone)]
pub struct CoinFlipCoordinator {
    policy: CompletionPolicy,
    max_fixed_flips: u32,
    until_tails_limit: u32,
    max_variable_flips: u32,
}

impl CoinFlipCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        CoinFlipCoordinator {
            policy: config.coin_flip_completion,
            max_fixed_flips: config.max_fixed_flips,
            until_tails_limit: config.until_tails_limit,
            max_variable_flips: config.max_variable_flips,
        }
    }

    /// Put an attack on hold behind a coin flip.
    pub fn begin_attack(
        &self,
        state: &GameState,
        attacker: PlayerId,
        attack_index: usize,
        configuration: CoinFlipConfiguration,
        action_id: &str,
    ) -> GameState {
        let mut next = state.clone();
        next.coin_flip = Some(CoinFlipState {
            status: CoinFlipStatus::ReadyToFlip,
            context: CoinFlipContext::Attack,
            configuration,
            results: Vec::new(),
            attack_index: Some(attack_index),
            player1_approved: false,
            player2_approved: false,
            action_id: action_id.to_string(),
            turn_number: state.turn_number,
            initiator: attacker,
            target_instance: None,
        });
        next.phase = TurnPhase::Attack;
        debug!(match_id = %state.match_id, ?attacker, attack_index, "attack waiting on coin flip");
        next
    }

    /// Emit a single-flip wake-up check for a sleeping Pokemon.
    pub fn begin_status_check(
        &self,
        state: &GameState,
        check: &PendingStatusCheck,
        action_id: &str,
    ) -> GameState {
        let mut next = state.clone();
        next.coin_flip = Some(CoinFlipState {
            status: CoinFlipStatus::ReadyToFlip,
            context: CoinFlipContext::StatusCheck,
            configuration: CoinFlipConfiguration::single_check(),
            results: Vec::new(),
            attack_index: None,
            player1_approved: false,
            player2_approved: false,
            action_id: format!("{}:sleep:{}", action_id, check.instance_id),
            turn_number: state.turn_number,
            initiator: check.player,
            target_instance: Some(check.instance_id.clone()),
        });
        next
    }

    /// Record one player's approval, generating results on first approval.
    pub fn approve(
        &self,
        state: &GameState,
        player: PlayerId,
        catalog: &dyn CardRepository,
    ) -> EngineResult<Approval> {
        let Some(flip) = state.coin_flip.as_ref() else {
            warn!(match_id = %state.match_id, ?player, "approval without a coin flip");
            return Err(ProtocolError::NoCoinFlip.into());
        };
        if !flip.is_ready() {
            warn!(match_id = %state.match_id, ?player, status = ?flip.status, "approval of a finished coin flip");
            return Err(ProtocolError::NotReadyToFlip(flip.status).into());
        }
        if flip.approved_by(player) {
            warn!(match_id = %state.match_id, ?player, "duplicate coin flip approval");
            return Err(ProtocolError::DuplicateApproval(player).into());
        }

        let mut flip = flip.clone();
        if flip.results.is_empty() {
            flip.results = self.generate(state, &flip, catalog)?;
            debug!(
                match_id = %state.match_id,
                action_id = %flip.action_id,
                flips = flip.results.len(),
                heads = heads_count(&flip.results),
                "coin flip results generated"
            );
        }
        flip.approve(player);

        let completed = match flip.context {
            CoinFlipContext::StatusCheck => true,
            CoinFlipContext::Attack => match self.policy {
                CompletionPolicy::FirstApproval => true,
                CompletionPolicy::BothPlayers => flip.player1_approved && flip.player2_approved,
            },
        };
        if completed {
            flip.status = CoinFlipStatus::Completed;
        }

        let mut next = state.clone();
        next.coin_flip = Some(flip);
        Ok(Approval {
            state: next,
            completed,
        })
    }

    /// Produce the deterministic flip sequence for a pending flip.
    pub fn generate(
        &self,
        state: &GameState,
        flip: &CoinFlipState,
        catalog: &dyn CardRepository,
    ) -> EngineResult<Vec<CoinFlipResult>> {
        let toss = |index: u32| CoinFlipResult {
            index,
            heads: flip_coin(&state.match_id, flip.turn_number, &flip.action_id, index),
        };

        let results = match flip.configuration.count {
            FlipCount::Fixed(n) => (0..n.max(1).min(self.max_fixed_flips.max(1))).map(toss).collect(),
            FlipCount::UntilTails => {
                let mut results = Vec::new();
                for index in 0..self.until_tails_limit {
                    let result = toss(index);
                    results.push(result);
                    if !result.heads {
                        break;
                    }
                }
                results
            }
            FlipCount::Variable(source) => {
                let n = self
                    .variable_count(source, state, flip.initiator, catalog)?
                    .min(self.max_variable_flips);
                (0..n).map(toss).collect()
            }
        };
        Ok(results)
    }

    fn variable_count(
        &self,
        source: VariableFlipSource,
        state: &GameState,
        player: PlayerId,
        catalog: &dyn CardRepository,
    ) -> EngineResult<u32> {
        let own = state.player(player);
        let count = match source {
            VariableFlipSource::EnergyAttached { energy_type } => match own.active {
                Some(ref active) => {
                    let supplies = energy_supplies(&active.attached_energy, catalog)?;
                    count_energy(&supplies, energy_type)
                }
                None => 0,
            },
            VariableFlipSource::OwnBench => own.bench.len() as u32,
            VariableFlipSource::OpponentBench => state.player(player.opponent()).bench.len() as u32,
        };
        Ok(count)
    }
}

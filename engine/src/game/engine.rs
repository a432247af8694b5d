use tracing::{debug, info};

use crate::combat::attack::{complete_attack, prepare_attack, AttackOutcome};
use crate::config::EngineConfig;
use crate::data::card::Card;
use crate::data::catalog::CardRepository;
use crate::effects::conditions::ConditionEvaluator;
use crate::effects::mechanics::AbilityEffect;
use crate::effects::text::AttackTextInterpreter;
use crate::error::{EngineResult, PreconditionError, ProtocolError, ValidationError};
use crate::game::actions::{Action, ActionRecord, ActionType, ActiveSource};
use crate::game::coin::{all_heads, CoinFlipContext, CoinFlipCoordinator};
use crate::game::machine::{self, end_match, settle, validate_action};
use crate::game::rng::{flip_coin, MatchRng};
use crate::game::state::*;
use crate::game::status::process_between_turns;

/// The collaborators every rule consults.
#[derive(Clone, Copy)]
pub struct Rules<'a> {
    pub catalog: &'a dyn CardRepository,
    pub conditions: &'a dyn ConditionEvaluator,
    pub interpreter: &'a dyn AttackTextInterpreter,
    pub config: &'a EngineConfig,
}

/// Applies player actions to match states.
///
/// Every operation reads a `GameState` and returns a new one; the input is
/// never modified, so a failed action leaves the caller's state as it was.
pub struct MatchEngine<'a> {
    rules: Rules<'a>,
    coins: CoinFlipCoordinator,
}

impl<'a> MatchEngine<'a> {
    pub fn new(
        catalog: &'a dyn CardRepository,
        conditions: &'a dyn ConditionEvaluator,
        interpreter: &'a dyn AttackTextInterpreter,
        config: &'a EngineConfig,
    ) -> Self {
        MatchEngine {
            rules: Rules {
                catalog,
                conditions,
                interpreter,
                config,
            },
            coins: CoinFlipCoordinator::new(config),
        }
    }

    pub fn rules(&self) -> &Rules<'a> {
        &self.rules
    }

    pub fn new_match(&self, match_id: &str) -> GameState {
        info!(match_id, "match created");
        GameState::new(match_id)
    }

    pub fn available_actions(&self, state: &GameState, player: PlayerId) -> Vec<ActionType> {
        machine::available_actions(state, player)
    }

    /// Validate and apply one action, append it to the log and check for a winner.
    pub fn apply_action(
        &self,
        state: &GameState,
        player: PlayerId,
        action_id: &str,
        action: &Action,
    ) -> EngineResult<GameState> {
        validate_action(
            state.match_state,
            state.phase,
            action.action_type(),
            state.current_player,
            player,
        )?;
        debug!(match_id = %state.match_id, ?player, action_id, action = ?action.action_type(), "applying action");

        let mut next = match action {
            Action::JoinMatch => self.join(state, player)?,
            Action::SubmitDeck { cards } => self.submit_deck(state, player, cards)?,
            Action::ApproveMatch => {
                ensure_pending(state, player)?;
                let mut next = state.clone();
                complete_step(&mut next, player, MatchState::PreGameSetup);
                next
            }
            Action::ShuffleDeck => self.shuffle_deck(state, player, action_id)?,
            Action::DrawInitialCards => self.draw_initial_cards(state, player, action_id)?,
            Action::SetPrizeCards => self.set_prize_cards(state, player)?,
            Action::SetActivePokemon { source } => self.set_active(state, player, source)?,
            Action::PlayPokemon { card_id } => self.play_pokemon(state, player, card_id)?,
            Action::CompleteSetup => {
                ensure_pending(state, player)?;
                let mut next = state.clone();
                complete_step(&mut next, player, MatchState::FirstPlayerSelection);
                next
            }
            Action::SelectFirstPlayer => self.select_first_player(state, action_id),
            Action::CancelMatch => {
                let mut next = state.clone();
                next.match_state = MatchState::Cancelled;
                info!(match_id = %state.match_id, ?player, "match cancelled");
                next
            }
            Action::DrawCard => self.draw_card(state, player),
            Action::AttachEnergy { card_id, target } => self.attach_energy(state, player, card_id, *target)?,
            Action::Evolve { card_id, target } => self.evolve(state, player, card_id, *target)?,
            Action::Retreat { bench_index, energy } => {
                self.retreat(state, player, *bench_index, energy.as_deref())?
            }
            Action::UseAbility { position } => self.use_ability(state, player, *position)?,
            Action::Attack {
                attack_index,
                energy_selection,
            } => self.attack(state, player, action_id, *attack_index, energy_selection.as_deref())?,
            Action::ApproveCoinFlip => self.approve_coin_flip(state, player, action_id)?,
            Action::SelectPrize { index } => self.select_prize(state, player, *index)?,
            Action::EndTurn => self.end_turn(state, action_id),
            Action::Concede => {
                let mut next = state.clone();
                end_match(&mut next, player.opponent(), WinReason::Concede);
                next
            }
        };

        let record = ActionRecord::new(action_id, player, action.clone());
        next.action_history.push(record.clone());
        next.last_action = Some(record);
        settle(&mut next);
        Ok(next)
    }

    /// Re-apply a log from an initial state.
    pub fn replay(&self, initial: &GameState, log: &[ActionRecord]) -> EngineResult<GameState> {
        log.iter().try_fold(initial.clone(), |state, record| {
            self.apply_action(&state, record.player, &record.action_id, &record.action)
        })
    }

    // === Setup ===

    fn join(&self, state: &GameState, player: PlayerId) -> EngineResult<GameState> {
        if state.player(player).joined {
            return Err(ValidationError::AlreadyActed(player).into());
        }
        let mut next = state.clone();
        next.player_mut(player).joined = true;
        next.match_state = if next.player1.joined && next.player2.joined {
            MatchState::DeckValidation
        } else {
            MatchState::WaitingForPlayers
        };
        info!(match_id = %state.match_id, ?player, state = ?next.match_state, "player joined");
        Ok(next)
    }

    fn submit_deck(&self, state: &GameState, player: PlayerId, cards: &[String]) -> EngineResult<GameState> {
        ensure_pending(state, player)?;
        if cards.is_empty() {
            return Err(ValidationError::EmptyDeck.into());
        }
        self.rules.catalog.cards(cards)?;

        let mut next = state.clone();
        next.player_mut(player).deck = cards.to_vec();
        complete_step(&mut next, player, MatchState::MatchApproval);
        Ok(next)
    }

    fn shuffle_deck(&self, state: &GameState, player: PlayerId, action_id: &str) -> EngineResult<GameState> {
        ensure_pending(state, player)?;
        let mut next = state.clone();
        let mut rng = MatchRng::for_action(&state.match_id, state.turn_number, action_id, 0);
        rng.shuffle(&mut next.player_mut(player).deck);
        complete_step(&mut next, player, MatchState::DrawingCards);
        Ok(next)
    }

    /// Draw the opening hand, redrawing while it holds no basic Pokemon.
    fn draw_initial_cards(&self, state: &GameState, player: PlayerId, action_id: &str) -> EngineResult<GameState> {
        ensure_pending(state, player)?;
        let mut next = state.clone();
        let hand_size = self.rules.config.opening_hand;

        next.player_mut(player).draw(hand_size);
        let mut attempts = 0;
        while !self.has_basic(&next.player(player).hand)? {
            if attempts >= self.rules.config.mulligan_limit {
                return Err(PreconditionError::NoBasicInHand(player).into());
            }
            attempts += 1;
            let side = next.player_mut(player);
            let mut cards = std::mem::take(&mut side.hand);
            cards.append(&mut side.deck);
            MatchRng::for_action(&state.match_id, state.turn_number, action_id, attempts).shuffle(&mut cards);
            side.deck = cards;
            side.draw(hand_size);
        }
        if attempts > 0 {
            debug!(match_id = %state.match_id, ?player, mulligans = attempts, "opening hand redrawn");
        }

        complete_step(&mut next, player, MatchState::SetPrizeCards);
        Ok(next)
    }

    fn has_basic(&self, hand: &[String]) -> EngineResult<bool> {
        let cards = self.rules.catalog.cards(hand)?;
        Ok(cards.values().any(|c| c.is_basic_pokemon()))
    }

    fn set_prize_cards(&self, state: &GameState, player: PlayerId) -> EngineResult<GameState> {
        ensure_pending(state, player)?;
        let mut next = state.clone();
        let side = next.player_mut(player);
        let count = self.rules.config.prize_count.min(side.deck.len());
        side.prize_cards = side.deck.drain(..count).collect();
        complete_step(&mut next, player, MatchState::SelectActivePokemon);
        Ok(next)
    }

    /// Choose the active Pokemon: from hand during setup, from the bench
    /// after a knockout.
    fn set_active(&self, state: &GameState, player: PlayerId, source: &ActiveSource) -> EngineResult<GameState> {
        if state.player(player).active.is_some() {
            return Err(ValidationError::ActiveAlreadySet(player).into());
        }
        let setup = state.match_state == MatchState::SelectActivePokemon;
        let mut next = state.clone();

        match source {
            ActiveSource::Hand(card_id) if setup => {
                let card = self.basic_in_hand(state, player, card_id)?;
                let id = next.allocate_instance_id(player);
                let side = next.player_mut(player);
                side.take_from_hand(card_id);
                side.active = Some(CardInstance::new(id, &card, PokemonPosition::Active, state.turn_number));
                complete_step(&mut next, player, MatchState::SelectBenchPokemon);
            }
            ActiveSource::Hand(_) => {
                return Err(ValidationError::NotAllowedInState {
                    action: ActionType::SetActivePokemon,
                    state: state.match_state,
                }
                .into());
            }
            ActiveSource::Bench(index) => {
                let side = next.player_mut(player);
                if *index >= side.bench.len() {
                    return Err(ValidationError::NoPokemonAt(PokemonPosition::Bench(*index)).into());
                }
                let promoted = side.bench.remove(*index).with_position(PokemonPosition::Active);
                side.reindex_bench();
                info!(match_id = %state.match_id, ?player, instance = %promoted.instance_id, "new active pokemon");
                side.active = Some(promoted);
                if setup {
                    complete_step(&mut next, player, MatchState::SelectBenchPokemon);
                }
            }
        }
        Ok(next)
    }

    fn basic_in_hand(&self, state: &GameState, player: PlayerId, card_id: &str) -> EngineResult<Card> {
        if !state.player(player).hand.iter().any(|c| c == card_id) {
            return Err(ValidationError::CardNotInHand(card_id.to_string()).into());
        }
        let card = self.rules.catalog.card(card_id)?;
        if !card.is_basic_pokemon() {
            return Err(ValidationError::NotBasicPokemon(card_id.to_string()).into());
        }
        Ok(card)
    }

    /// Bench a basic Pokemon from hand, during setup or the main phase.
    fn play_pokemon(&self, state: &GameState, player: PlayerId, card_id: &str) -> EngineResult<GameState> {
        if state.match_state == MatchState::SelectBenchPokemon {
            ensure_pending(state, player)?;
        }
        let card = self.basic_in_hand(state, player, card_id)?;
        let max_bench = self.rules.config.max_bench;
        if state.player(player).bench.len() >= max_bench {
            return Err(ValidationError::BenchFull(max_bench).into());
        }

        let mut next = state.clone();
        let id = next.allocate_instance_id(player);
        let side = next.player_mut(player);
        side.take_from_hand(card_id);
        let slot = side.bench.len();
        side.bench
            .push(CardInstance::new(id, &card, PokemonPosition::Bench(slot), state.turn_number));
        Ok(next)
    }

    fn select_first_player(&self, state: &GameState, action_id: &str) -> GameState {
        let heads = flip_coin(&state.match_id, state.turn_number, action_id, 0);
        let first = if heads { PlayerId::Player1 } else { PlayerId::Player2 };

        let mut next = state.clone();
        next.first_player = first;
        next.current_player = first;
        next.turn_number = 1;
        next.phase = TurnPhase::Draw;
        next.match_state = MatchState::PlayerTurn;
        for player in PlayerId::BOTH {
            next.player_mut(player).setup_complete = false;
            next.player_mut(player).start_turn();
        }
        info!(match_id = %state.match_id, ?first, heads, "first player selected");
        next
    }

    // === Turn ===

    fn draw_card(&self, state: &GameState, player: PlayerId) -> GameState {
        let mut next = state.clone();
        if next.player_mut(player).draw(1) == 0 {
            end_match(&mut next, player.opponent(), WinReason::DeckOut);
            return next;
        }
        next.phase = TurnPhase::MainPhase;
        next
    }

    fn attach_energy(
        &self,
        state: &GameState,
        player: PlayerId,
        card_id: &str,
        target: PokemonPosition,
    ) -> EngineResult<GameState> {
        let side = state.player(player);
        if side.has_attached_energy_this_turn {
            return Err(ValidationError::EnergyAlreadyAttached.into());
        }
        if !side.hand.iter().any(|c| c == card_id) {
            return Err(ValidationError::CardNotInHand(card_id.to_string()).into());
        }
        if !self.rules.catalog.card(card_id)?.is_energy() {
            return Err(ValidationError::NotEnergyCard(card_id.to_string()).into());
        }
        let pokemon = side
            .pokemon_at(target)
            .cloned()
            .ok_or(ValidationError::NoPokemonAt(target))?;

        let mut next = state.clone();
        let side = next.player_mut(player);
        side.take_from_hand(card_id);
        side.replace_instance(pokemon.with_attached_energy(card_id.to_string()));
        side.has_attached_energy_this_turn = true;
        Ok(next)
    }

    fn evolve(
        &self,
        state: &GameState,
        player: PlayerId,
        card_id: &str,
        target: PokemonPosition,
    ) -> EngineResult<GameState> {
        let side = state.player(player);
        if !side.hand.iter().any(|c| c == card_id) {
            return Err(ValidationError::CardNotInHand(card_id.to_string()).into());
        }
        let pokemon = side
            .pokemon_at(target)
            .cloned()
            .ok_or(ValidationError::NoPokemonAt(target))?;
        let evolution = self.rules.catalog.card(card_id)?;
        let base = self.rules.catalog.card(&pokemon.card_id)?;

        if !evolution.evolves_from_card(&base) {
            return Err(ValidationError::InvalidEvolution(format!(
                "{} does not evolve from {}",
                evolution.name, base.name
            ))
            .into());
        }
        if state.turn_number <= 2 {
            return Err(ValidationError::InvalidEvolution("no evolving during a player's first turn".into()).into());
        }
        if pokemon.turn_played == state.turn_number {
            return Err(ValidationError::InvalidEvolution(format!("{} was played this turn", base.name)).into());
        }

        let mut next = state.clone();
        let side = next.player_mut(player);
        side.take_from_hand(card_id);
        side.replace_instance(pokemon.evolve_into(&evolution, state.turn_number));
        info!(match_id = %state.match_id, ?player, from = %base.name, to = %evolution.name, "pokemon evolved");
        Ok(next)
    }

    /// Swap the active Pokemon with a benched one, discarding energy for the
    /// retreat cost.
    fn retreat(
        &self,
        state: &GameState,
        player: PlayerId,
        bench_index: usize,
        selection: Option<&[String]>,
    ) -> EngineResult<GameState> {
        let side = state.player(player);
        if side.has_retreated_this_turn {
            return Err(ValidationError::AlreadyRetreated.into());
        }
        let active = side
            .active
            .clone()
            .ok_or(PreconditionError::NoActivePokemon { player })?;
        for status in [StatusCondition::Asleep, StatusCondition::Paralyzed] {
            if active.has_status(status) {
                return Err(ValidationError::StatusPreventsAction(status).into());
            }
        }
        let incoming = side
            .bench
            .get(bench_index)
            .cloned()
            .ok_or(ValidationError::NoPokemonAt(PokemonPosition::Bench(bench_index)))?;

        let cost = self.rules.catalog.card(&active.card_id)?.retreat_cost.unwrap_or(0) as usize;
        let attached = active.attached_energy.len();
        if attached < cost {
            return Err(PreconditionError::InsufficientEnergy {
                required: cost as u32,
                available: attached as u32,
            }
            .into());
        }
        let payment: Vec<String> = match selection {
            Some(ids) if ids.len() != cost => {
                return Err(PreconditionError::InvalidEnergySelection(format!(
                    "retreat costs {} energy, got {}",
                    cost,
                    ids.len()
                ))
                .into());
            }
            Some(ids) => ids.to_vec(),
            None => active.attached_energy[attached - cost..].to_vec(),
        };
        let retired = active
            .without_energy(&payment)
            .ok_or_else(|| PreconditionError::InvalidEnergySelection("selected energy is not attached".into()))?
            .without_statuses()
            .with_position(PokemonPosition::Bench(bench_index));

        let mut next = state.clone();
        let side = next.player_mut(player);
        side.discard.extend(payment);
        side.active = Some(incoming.with_position(PokemonPosition::Active));
        side.bench[bench_index] = retired;
        side.has_retreated_this_turn = true;
        Ok(next)
    }

    fn use_ability(&self, state: &GameState, player: PlayerId, position: PokemonPosition) -> EngineResult<GameState> {
        let pokemon = state
            .player(player)
            .pokemon_at(position)
            .cloned()
            .ok_or(ValidationError::NoPokemonAt(position))?;
        let card = self.rules.catalog.card(&pokemon.card_id)?;
        let ability = card.ability.ok_or_else(|| ValidationError::NoAbility(card.name.clone()))?;
        if pokemon.used_ability_this_turn {
            return Err(ValidationError::AbilityAlreadyUsed(card.name).into());
        }

        let mut next = state.clone();
        let mut updated = pokemon;
        updated.used_ability_this_turn = true;
        for effect in &ability.effects {
            match *effect {
                AbilityEffect::Heal { amount } => updated = updated.with_healing(amount),
                AbilityEffect::DrawCards { count } => {
                    next.player_mut(player).draw(count as usize);
                }
            }
        }
        next.player_mut(player).replace_instance(updated);
        debug!(match_id = %state.match_id, ?player, ability = %ability.name, "ability used");
        Ok(next)
    }

    fn attack(
        &self,
        state: &GameState,
        player: PlayerId,
        action_id: &str,
        attack_index: usize,
        energy_selection: Option<&[String]>,
    ) -> EngineResult<GameState> {
        if state.turn_number == 1 && player == state.first_player {
            return Err(ValidationError::FirstTurnAttack.into());
        }
        if let Some(active) = state.player(player).active.as_ref() {
            for status in [StatusCondition::Asleep, StatusCondition::Paralyzed] {
                if active.has_status(status) {
                    return Err(ValidationError::StatusPreventsAction(status).into());
                }
            }
        }

        let prepared = prepare_attack(state, player, attack_index, energy_selection, &self.rules)?;
        if let Some(configuration) = prepared.attack.coin_flip.clone() {
            return Ok(self
                .coins
                .begin_attack(&prepared.state, player, attack_index, configuration, action_id));
        }

        let outcome = complete_attack(&prepared.state, player, attack_index, None, &self.rules)?;
        Ok(self.finish_attack(outcome, attack_index))
    }

    fn finish_attack(&self, outcome: AttackOutcome, attack_index: usize) -> GameState {
        let mut next = outcome.state;
        next.phase = TurnPhase::End;
        info!(
            match_id = %next.match_id,
            attack_index,
            damage = outcome.damage.final_damage,
            self_damage = outcome.self_damage,
            knockouts = outcome.knockouts.len(),
            "attack resolved"
        );
        next
    }

    fn approve_coin_flip(&self, state: &GameState, player: PlayerId, action_id: &str) -> EngineResult<GameState> {
        let approval = self.coins.approve(state, player, self.rules.catalog)?;
        if !approval.completed {
            return Ok(approval.state);
        }
        let Some(flip) = approval.state.coin_flip.clone() else {
            return Err(ProtocolError::NoCoinFlip.into());
        };

        match flip.context {
            CoinFlipContext::Attack => {
                let attack_index = flip.attack_index.ok_or(ProtocolError::NoCoinFlip)?;
                let outcome = complete_attack(
                    &approval.state,
                    flip.initiator,
                    attack_index,
                    Some(flip.results.as_slice()),
                    &self.rules,
                )?;
                Ok(self.finish_attack(outcome, attack_index))
            }
            CoinFlipContext::StatusCheck => {
                let mut next = approval.state;
                let wakes = all_heads(&flip.results);
                if let Some(id) = flip.target_instance.as_deref() {
                    let side = next.player_mut(flip.initiator);
                    if let Some(pokemon) = side.instance(id).cloned() {
                        if wakes {
                            side.replace_instance(pokemon.without_status(StatusCondition::Asleep));
                        }
                        debug!(match_id = %state.match_id, instance = id, wakes, "sleep check resolved");
                    }
                }
                next.coin_flip = None;
                Ok(self.advance_between_turns(next, action_id))
            }
        }
    }

    fn select_prize(&self, state: &GameState, player: PlayerId, index: usize) -> EngineResult<GameState> {
        let side = state.player(player);
        if side.prizes_owed == 0 {
            return Err(ValidationError::NoPrizeOwed(player).into());
        }
        if index >= side.prize_cards.len() {
            return Err(ValidationError::InvalidPrizeIndex {
                index,
                remaining: side.prize_cards.len(),
            }
            .into());
        }

        let mut next = state.clone();
        let side = next.player_mut(player);
        let prize = side.prize_cards.remove(index);
        side.hand.push(prize);
        side.prizes_owed = if side.prize_cards.is_empty() {
            0
        } else {
            side.prizes_owed - 1
        };
        debug!(match_id = %state.match_id, ?player, remaining = side.prize_cards.len(), "prize taken");
        Ok(next)
    }

    /// Close the turn, run the status processor and hand over, unless a
    /// sleep check must be flipped first.
    fn end_turn(&self, state: &GameState, action_id: &str) -> GameState {
        let mut next = state.clone();
        next.turn_number += 1;
        next.match_state = MatchState::BetweenTurns;
        next.coin_flip = None;

        let outcome = process_between_turns(&next, self.rules.config);
        let mut next = outcome.state;
        next.queued_status_checks = outcome.sleep_checks;
        if !outcome.knockouts.is_empty() {
            info!(match_id = %next.match_id, knockouts = outcome.knockouts.len(), "status knockouts between turns");
        }
        self.advance_between_turns(next, action_id)
    }

    fn advance_between_turns(&self, mut state: GameState, action_id: &str) -> GameState {
        if state.queued_status_checks.is_empty() {
            return start_next_turn(state);
        }
        let check = state.queued_status_checks.remove(0);
        self.coins.begin_status_check(&state, &check, action_id)
    }
}

fn start_next_turn(mut state: GameState) -> GameState {
    let owner = state.turn_owner(state.turn_number);
    state.current_player = owner;
    state.phase = TurnPhase::Draw;
    state.match_state = MatchState::PlayerTurn;
    state.player_mut(owner).start_turn();
    info!(match_id = %state.match_id, turn = state.turn_number, player = ?owner, "turn started");
    state
}

/// Reject a second submission of the current setup step.
fn ensure_pending(state: &GameState, player: PlayerId) -> Result<(), ValidationError> {
    if state.player(player).setup_complete {
        Err(ValidationError::AlreadyActed(player))
    } else {
        Ok(())
    }
}

/// Mark `player` done with the current setup step; once both are, move on.
fn complete_step(state: &mut GameState, player: PlayerId, following: MatchState) {
    state.player_mut(player).setup_complete = true;
    if state.player1.setup_complete && state.player2.setup_complete {
        state.player1.setup_complete = false;
        state.player2.setup_complete = false;
        state.match_state = following;
        info!(match_id = %state.match_id, state = ?following, "setup step complete");
    }
}

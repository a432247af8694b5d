//! Action legality and win conditions.

use tracing::info;

use crate::error::ValidationError;
use crate::game::actions::ActionType;
use crate::game::state::{GameState, MatchState, PlayerId, TurnPhase, WinReason};

/// Actions the current player may take in a turn phase.
pub fn phase_actions(phase: TurnPhase) -> &'static [ActionType] {
    match phase {
        TurnPhase::Draw => &[ActionType::DrawCard],
        TurnPhase::MainPhase => &[
            ActionType::PlayPokemon,
            ActionType::AttachEnergy,
            ActionType::Evolve,
            ActionType::Retreat,
            ActionType::UseAbility,
            ActionType::Attack,
            ActionType::EndTurn,
        ],
        TurnPhase::Attack => &[ActionType::ApproveCoinFlip],
        TurnPhase::End => &[ActionType::SelectPrize, ActionType::EndTurn],
    }
}

/// Setup actions accepted in a pre-game state.
pub fn state_actions(state: MatchState) -> &'static [ActionType] {
    match state {
        MatchState::Created | MatchState::WaitingForPlayers => &[ActionType::JoinMatch],
        MatchState::DeckValidation => &[ActionType::SubmitDeck],
        MatchState::MatchApproval => &[ActionType::ApproveMatch],
        MatchState::PreGameSetup => &[ActionType::ShuffleDeck],
        MatchState::DrawingCards => &[ActionType::DrawInitialCards],
        MatchState::SetPrizeCards => &[ActionType::SetPrizeCards],
        MatchState::SelectActivePokemon => &[ActionType::SetActivePokemon],
        MatchState::SelectBenchPokemon => &[ActionType::PlayPokemon, ActionType::CompleteSetup],
        MatchState::FirstPlayerSelection => &[ActionType::SelectFirstPlayer],
        MatchState::BetweenTurns => &[
            ActionType::ApproveCoinFlip,
            ActionType::SetActivePokemon,
            ActionType::SelectPrize,
        ],
        MatchState::PlayerTurn | MatchState::MatchEnded | MatchState::Cancelled => &[],
    }
}

/// Actions either player may take during any phase of a turn. Coin flip
/// approvals go straight to the coordinator, which owns their protocol.
fn out_of_turn(action: ActionType) -> bool {
    matches!(
        action,
        ActionType::SelectPrize | ActionType::SetActivePokemon | ActionType::ApproveCoinFlip
    )
}

/// Check an action against the match state, turn phase and turn owner.
///
/// Whether the requester actually owes a prize or lacks an active Pokemon is
/// left to the action handler.
pub fn validate_action(
    match_state: MatchState,
    phase: TurnPhase,
    action: ActionType,
    current_player: PlayerId,
    requester: PlayerId,
) -> Result<(), ValidationError> {
    if match_state.is_terminal() {
        return Err(ValidationError::MatchOver(match_state));
    }
    if action == ActionType::Concede {
        return Ok(());
    }

    match match_state {
        MatchState::PlayerTurn => {
            if out_of_turn(action) {
                return Ok(());
            }
            if !phase_actions(phase).contains(&action) {
                return Err(ValidationError::NotAllowedInPhase { action, phase });
            }
            if requester != current_player {
                return Err(ValidationError::NotYourTurn { requester });
            }
            Ok(())
        }
        state if state.is_pre_game() && action == ActionType::CancelMatch => Ok(()),
        state => {
            if state_actions(state).contains(&action) {
                Ok(())
            } else {
                Err(ValidationError::NotAllowedInState { action, state })
            }
        }
    }
}

/// Actions `player` could submit now.
///
/// Only flags on the state are consulted; card-level legality (which card,
/// which target) is checked when the action arrives.
pub fn available_actions(state: &GameState, player: PlayerId) -> Vec<ActionType> {
    if state.is_terminal() {
        return Vec::new();
    }

    let side = state.player(player);
    let mut actions = Vec::new();
    let flip_pending = state
        .coin_flip
        .as_ref()
        .is_some_and(|f| f.is_ready() && !f.approved_by(player));
    let needs_active = side.active.is_none() && !side.bench.is_empty();

    match state.match_state {
        MatchState::PlayerTurn => {
            if needs_active {
                actions.push(ActionType::SetActivePokemon);
            }
            if player == state.current_player {
                for &action in phase_actions(state.phase) {
                    let allowed = match action {
                        ActionType::AttachEnergy => !side.has_attached_energy_this_turn,
                        ActionType::Retreat => {
                            !side.has_retreated_this_turn && side.active.is_some() && !side.bench.is_empty()
                        }
                        ActionType::UseAbility | ActionType::Evolve => side.has_pokemon_in_play(),
                        ActionType::Attack => {
                            side.active.is_some() && !(state.turn_number == 1 && player == state.first_player)
                        }
                        ActionType::ApproveCoinFlip => flip_pending,
                        ActionType::SelectPrize => false,
                        _ => true,
                    };
                    if action == ActionType::EndTurn && side.prizes_owed > 0 {
                        actions.push(ActionType::SelectPrize);
                    }
                    if allowed {
                        actions.push(action);
                    }
                }
                if side.prizes_owed > 0 && !actions.contains(&ActionType::SelectPrize) {
                    actions.push(ActionType::SelectPrize);
                }
            } else {
                if side.prizes_owed > 0 {
                    actions.push(ActionType::SelectPrize);
                }
                if flip_pending {
                    actions.push(ActionType::ApproveCoinFlip);
                }
            }
        }
        MatchState::BetweenTurns => {
            if flip_pending {
                actions.push(ActionType::ApproveCoinFlip);
            }
            if needs_active {
                actions.push(ActionType::SetActivePokemon);
            }
            if side.prizes_owed > 0 {
                actions.push(ActionType::SelectPrize);
            }
        }
        pre_game => {
            let pending = match pre_game {
                MatchState::Created | MatchState::WaitingForPlayers => !side.joined,
                _ => !side.setup_complete,
            };
            if pending {
                actions.extend_from_slice(state_actions(pre_game));
            }
            actions.push(ActionType::CancelMatch);
        }
    }

    actions.push(ActionType::Concede);
    actions
}

/// The winner, if the match is decided. Only turns are checked; setup can't
/// end a match except by concession or cancellation.
pub fn check_win_conditions(state: &GameState) -> Option<(PlayerId, WinReason)> {
    if !matches!(state.match_state, MatchState::PlayerTurn | MatchState::BetweenTurns) {
        return None;
    }

    let order = [state.current_player, state.current_player.opponent()];
    for player in order {
        if state.player(player).prize_cards.is_empty() {
            return Some((player, WinReason::PrizesTaken));
        }
    }
    for player in order {
        if !state.player(player).has_pokemon_in_play() {
            return Some((player.opponent(), WinReason::NoPokemonInPlay));
        }
    }
    None
}

/// Move the match to MATCH_ENDED.
pub fn end_match(state: &mut GameState, winner: PlayerId, reason: WinReason) {
    state.match_state = MatchState::MatchEnded;
    state.winner = Some(winner);
    state.win_reason = Some(reason);
    state.coin_flip = None;
    info!(match_id = %state.match_id, ?winner, ?reason, turn = state.turn_number, "match ended");
}

/// Apply the win conditions to a freshly updated state.
pub fn settle(state: &mut GameState) {
    if let Some((winner, reason)) = check_win_conditions(state) {
        end_match(state, winner, reason);
    }
}

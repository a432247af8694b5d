mod common;

use common::*;
use tcg_rules_engine::error::ValidationError;
use tcg_rules_engine::game::actions::ActionType;
use tcg_rules_engine::game::machine::*;
use tcg_rules_engine::game::state::*;

#[test]
fn test_terminal_states_reject_everything() {
    for state in [MatchState::MatchEnded, MatchState::Cancelled] {
        for action in [ActionType::Concede, ActionType::EndTurn, ActionType::JoinMatch] {
            assert_eq!(
                validate_action(state, TurnPhase::MainPhase, action, P1, P1),
                Err(ValidationError::MatchOver(state))
            );
        }
    }
}

#[test]
fn test_setup_state_whitelists() {
    assert!(validate_action(MatchState::Created, TurnPhase::Draw, ActionType::JoinMatch, P1, P2).is_ok());
    assert!(validate_action(MatchState::DeckValidation, TurnPhase::Draw, ActionType::SubmitDeck, P1, P2).is_ok());
    assert!(validate_action(
        MatchState::SelectBenchPokemon,
        TurnPhase::Draw,
        ActionType::PlayPokemon,
        P1,
        P2
    )
    .is_ok());
    assert_eq!(
        validate_action(MatchState::MatchApproval, TurnPhase::Draw, ActionType::SubmitDeck, P1, P1),
        Err(ValidationError::NotAllowedInState {
            action: ActionType::SubmitDeck,
            state: MatchState::MatchApproval,
        })
    );
    assert_eq!(
        validate_action(MatchState::SetPrizeCards, TurnPhase::Draw, ActionType::Attack, P1, P1),
        Err(ValidationError::NotAllowedInState {
            action: ActionType::Attack,
            state: MatchState::SetPrizeCards,
        })
    );
}

#[test]
fn test_cancel_only_before_first_turn() {
    assert!(validate_action(MatchState::FirstPlayerSelection, TurnPhase::Draw, ActionType::CancelMatch, P1, P2).is_ok());
    assert_eq!(
        validate_action(MatchState::PlayerTurn, TurnPhase::MainPhase, ActionType::CancelMatch, P1, P1),
        Err(ValidationError::NotAllowedInPhase {
            action: ActionType::CancelMatch,
            phase: TurnPhase::MainPhase,
        })
    );
    assert_eq!(
        validate_action(MatchState::BetweenTurns, TurnPhase::Draw, ActionType::CancelMatch, P1, P1),
        Err(ValidationError::NotAllowedInState {
            action: ActionType::CancelMatch,
            state: MatchState::BetweenTurns,
        })
    );
}

#[test]
fn test_turn_phase_gating() {
    let turn = MatchState::PlayerTurn;
    assert!(validate_action(turn, TurnPhase::Draw, ActionType::DrawCard, P1, P1).is_ok());
    assert_eq!(
        validate_action(turn, TurnPhase::Draw, ActionType::Attack, P1, P1),
        Err(ValidationError::NotAllowedInPhase {
            action: ActionType::Attack,
            phase: TurnPhase::Draw,
        })
    );
    assert_eq!(
        validate_action(turn, TurnPhase::MainPhase, ActionType::DrawCard, P1, P1),
        Err(ValidationError::NotAllowedInPhase {
            action: ActionType::DrawCard,
            phase: TurnPhase::MainPhase,
        })
    );
    assert_eq!(
        validate_action(turn, TurnPhase::MainPhase, ActionType::Attack, P1, P2),
        Err(ValidationError::NotYourTurn { requester: P2 })
    );
    assert_eq!(
        validate_action(turn, TurnPhase::End, ActionType::AttachEnergy, P1, P1),
        Err(ValidationError::NotAllowedInPhase {
            action: ActionType::AttachEnergy,
            phase: TurnPhase::End,
        })
    );
    assert!(validate_action(turn, TurnPhase::End, ActionType::EndTurn, P1, P1).is_ok());
}

#[test]
fn test_out_of_turn_actions() {
    let turn = MatchState::PlayerTurn;
    for action in [
        ActionType::SelectPrize,
        ActionType::SetActivePokemon,
        ActionType::ApproveCoinFlip,
        ActionType::Concede,
    ] {
        assert!(validate_action(turn, TurnPhase::MainPhase, action, P1, P2).is_ok());
    }
    assert!(validate_action(MatchState::BetweenTurns, TurnPhase::Draw, ActionType::ApproveCoinFlip, P1, P2).is_ok());
    assert!(validate_action(MatchState::BetweenTurns, TurnPhase::Draw, ActionType::EndTurn, P1, P1).is_err());
}

#[test]
fn test_available_actions_in_main_phase() {
    let table = Table::new();
    let mut state = table.battle("pikachu", "bulbasaur");
    table.bench(&mut state, P1, "machop");

    let actions = available_actions(&state, P1);
    assert_eq!(
        actions,
        vec![
            ActionType::PlayPokemon,
            ActionType::AttachEnergy,
            ActionType::Evolve,
            ActionType::Retreat,
            ActionType::UseAbility,
            ActionType::Attack,
            ActionType::EndTurn,
            ActionType::Concede,
        ]
    );
    assert_eq!(available_actions(&state, P2), vec![ActionType::Concede]);

    state.player1.has_attached_energy_this_turn = true;
    state.player1.has_retreated_this_turn = true;
    let actions = available_actions(&state, P1);
    assert!(!actions.contains(&ActionType::AttachEnergy));
    assert!(!actions.contains(&ActionType::Retreat));
}

#[test]
fn test_available_actions_for_setup() {
    let mut state = GameState::new("m-1");
    state.match_state = MatchState::SelectBenchPokemon;
    assert_eq!(
        available_actions(&state, P1),
        vec![
            ActionType::PlayPokemon,
            ActionType::CompleteSetup,
            ActionType::CancelMatch,
            ActionType::Concede,
        ]
    );

    state.player1.setup_complete = true;
    assert_eq!(
        available_actions(&state, P1),
        vec![ActionType::CancelMatch, ActionType::Concede]
    );
}

#[test]
fn test_win_conditions() {
    let table = Table::new();
    let mut state = table.battle("pikachu", "bulbasaur");
    assert_eq!(check_win_conditions(&state), None);

    state.player2.prize_cards.clear();
    assert_eq!(check_win_conditions(&state), Some((P2, WinReason::PrizesTaken)));

    // Prizes are checked before board state
    state.player2.active = None;
    assert_eq!(check_win_conditions(&state), Some((P2, WinReason::PrizesTaken)));

    state.player2.prize_cards.push("grass-energy".to_string());
    assert_eq!(check_win_conditions(&state), Some((P1, WinReason::NoPokemonInPlay)));

    // Setup never produces a winner
    state.match_state = MatchState::SelectBenchPokemon;
    assert_eq!(check_win_conditions(&state), None);
}

#[test]
fn test_settle_ends_match() {
    let table = Table::new();
    let mut state = table.battle("pikachu", "bulbasaur");
    state.player1.active = None;
    settle(&mut state);
    assert_eq!(state.match_state, MatchState::MatchEnded);
    assert_eq!(state.winner, Some(P2));
    assert!(state.is_terminal());
}

mod common;

use common::*;
use tcg_rules_engine::error::{EngineError, ResourceError, ValidationError};
use tcg_rules_engine::game::actions::{Action, ActionType, ActiveSource};
use tcg_rules_engine::game::state::*;

#[test]
fn test_new_match_initializes_correctly() {
    let table = Table::new();
    table.engine(|engine| {
        let state = engine.new_match("m-1");
        assert_eq!(state.match_state, MatchState::Created);
        assert_eq!(state.turn_number, 0);
        assert!(state.action_history.is_empty());
        assert!(state.coin_flip.is_none());
        assert_eq!(
            engine.available_actions(&state, P1),
            vec![ActionType::JoinMatch, ActionType::CancelMatch, ActionType::Concede]
        );
    });
}

#[test]
fn test_setup_reaches_first_turn() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-setup"));

        script.act(P1, Action::JoinMatch).unwrap();
        assert_eq!(script.state.match_state, MatchState::WaitingForPlayers);
        script.act(P2, Action::JoinMatch).unwrap();
        assert_eq!(script.state.match_state, MatchState::DeckValidation);

        script.both(Action::SubmitDeck { cards: test_deck() });
        assert_eq!(script.state.match_state, MatchState::MatchApproval);
        script.both(Action::ApproveMatch);
        assert_eq!(script.state.match_state, MatchState::PreGameSetup);
        script.both(Action::ShuffleDeck);
        assert_eq!(script.state.match_state, MatchState::DrawingCards);
        script.both(Action::DrawInitialCards);
        assert_eq!(script.state.match_state, MatchState::SetPrizeCards);

        // Both players have 7 cards in hand, with at least one basic
        for player in PlayerId::BOTH {
            let hand = &script.state.player(player).hand;
            assert_eq!(hand.len(), 7);
            assert!(hand.iter().any(|id| table.card(id).is_basic_pokemon()));
        }

        script.both(Action::SetPrizeCards);
        assert_eq!(script.state.match_state, MatchState::SelectActivePokemon);
        for player in PlayerId::BOTH {
            assert_eq!(script.state.player(player).prize_cards.len(), 6);
            assert_eq!(script.state.player(player).deck.len(), 20 - 7 - 6);
        }

        for player in PlayerId::BOTH {
            let basic = script
                .state
                .player(player)
                .hand
                .iter()
                .find(|id| table.card(id).is_basic_pokemon())
                .cloned()
                .unwrap();
            script
                .act(player, Action::SetActivePokemon { source: ActiveSource::Hand(basic) })
                .unwrap();
        }
        assert_eq!(script.state.match_state, MatchState::SelectBenchPokemon);
        assert_eq!(script.state.player1.hand.len(), 6);

        script.both(Action::CompleteSetup);
        assert_eq!(script.state.match_state, MatchState::FirstPlayerSelection);

        script.act(P2, Action::SelectFirstPlayer).unwrap();
        let state = &script.state;
        assert_eq!(state.match_state, MatchState::PlayerTurn);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.phase, TurnPhase::Draw);
        assert_eq!(state.current_player, state.first_player);
        assert_eq!(state.action_history.len(), script.log.len());
    });
}

#[test]
fn test_setup_steps_accept_one_submission_per_player() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-dup"));
        script.act(P1, Action::JoinMatch).unwrap();

        let err = script.act(P1, Action::JoinMatch).unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::AlreadyActed(P1)));

        script.act(P2, Action::JoinMatch).unwrap();
        script.act(P1, Action::SubmitDeck { cards: test_deck() }).unwrap();
        let err = script.act(P1, Action::SubmitDeck { cards: test_deck() }).unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::AlreadyActed(P1)));
    });
}

#[test]
fn test_unknown_card_in_deck_is_a_resource_error() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-bad-deck"));
        script.both(Action::JoinMatch);

        let mut deck = test_deck();
        deck.push("missingno".to_string());
        let before = script.state.clone();
        let err = script.act(P1, Action::SubmitDeck { cards: deck }).unwrap_err();
        assert_eq!(
            err,
            EngineError::Resource(ResourceError::CardNotFound("missingno".to_string()))
        );
        assert_eq!(script.state, before);
    });
}

#[test]
fn test_actions_out_of_order_are_rejected() {
    let table = Table::new();
    table.engine(|engine| {
        let state = engine.new_match("m-order");
        let err = engine
            .apply_action(&state, P1, "a-1", &Action::ShuffleDeck)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::NotAllowedInState {
                action: ActionType::ShuffleDeck,
                state: MatchState::Created,
            })
        );
    });
}

#[test]
fn test_cancel_is_terminal() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-cancel"));
        script.both(Action::JoinMatch);
        script.act(P2, Action::CancelMatch).unwrap();
        assert_eq!(script.state.match_state, MatchState::Cancelled);
        assert!(engine.available_actions(&script.state, P1).is_empty());

        let err = script.act(P1, Action::Concede).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::MatchOver(MatchState::Cancelled))
        );
    });
}

#[test]
fn test_concede_ends_match_for_opponent() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-concede"));
        play_setup(&table, &mut script);

        // Out of turn concession is allowed
        let waiting = script.state.current_player.opponent();
        script.act(waiting, Action::Concede).unwrap();
        assert_eq!(script.state.match_state, MatchState::MatchEnded);
        assert_eq!(script.state.winner, Some(waiting.opponent()));
        assert_eq!(script.state.win_reason, Some(WinReason::Concede));
    });
}

#[test]
fn test_draw_from_empty_deck_loses() {
    let table = Table::new();
    table.engine(|engine| {
        let mut state = table.battle("pikachu", "machop");
        state.phase = TurnPhase::Draw;
        state.player1.deck.clear();

        let next = engine
            .apply_action(&state, P1, "draw-1", &Action::DrawCard)
            .unwrap();
        assert_eq!(next.match_state, MatchState::MatchEnded);
        assert_eq!(next.winner, Some(P2));
        assert_eq!(next.win_reason, Some(WinReason::DeckOut));
    });
}

#[test]
fn test_turn_one_draw_then_main_phase() {
    let table = Table::new();
    table.engine(|engine| {
        let mut script = Script::new(engine, engine.new_match("m-draw"));
        play_setup(&table, &mut script);

        let first = script.state.first_player;
        let hand = script.state.player(first).hand.len();
        let deck = script.state.player(first).deck.len();

        // The other player cannot act in this turn
        let err = script.act(first.opponent(), Action::DrawCard).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::NotYourTurn {
                requester: first.opponent()
            })
        );

        script.act(first, Action::DrawCard).unwrap();
        assert_eq!(script.state.phase, TurnPhase::MainPhase);
        assert_eq!(script.state.player(first).hand.len(), hand + 1);
        assert_eq!(script.state.player(first).deck.len(), deck - 1);

        // First player cannot attack on turn 1
        let err = script
            .act(first, Action::Attack { attack_index: 0, energy_selection: None })
            .unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::FirstTurnAttack));
        assert!(!engine
            .available_actions(&script.state, first)
            .contains(&ActionType::Attack));

        script.act(first, Action::EndTurn).unwrap();
        assert_eq!(script.state.turn_number, 2);
        assert_eq!(script.state.current_player, first.opponent());
        assert_eq!(script.state.phase, TurnPhase::Draw);
    });
}

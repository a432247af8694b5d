use serde::{Deserialize, Serialize};

use crate::game::state::{PlayerId, PokemonPosition};

/// Action kinds, used for legality checks and action menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    // === Pre-game ===
    JoinMatch,
    SubmitDeck,
    ApproveMatch,
    ShuffleDeck,
    DrawInitialCards,
    SetPrizeCards,
    SetActivePokemon,
    CompleteSetup,
    SelectFirstPlayer,
    CancelMatch,

    // === Turn ===
    DrawCard,
    PlayPokemon,
    AttachEnergy,
    Evolve,
    Retreat,
    UseAbility,
    Attack,
    ApproveCoinFlip,
    SelectPrize,
    EndTurn,

    // === Anytime ===
    Concede,
}

/// Where a new active Pokemon comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveSource {
    /// A basic Pokemon card in hand (setup).
    Hand(String),
    /// A benched Pokemon (after a knockout).
    Bench(usize),
}

/// All possible actions a player can submit, with their data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    JoinMatch,
    /// A deck already validated by the deck service, as catalog ids.
    SubmitDeck { cards: Vec<String> },
    ApproveMatch,
    ShuffleDeck,
    DrawInitialCards,
    SetPrizeCards,
    SetActivePokemon { source: ActiveSource },
    /// Put a basic Pokemon from hand onto the bench.
    PlayPokemon { card_id: String },
    CompleteSetup,
    SelectFirstPlayer,
    CancelMatch,

    DrawCard,
    /// Attach an energy card from hand.
    AttachEnergy { card_id: String, target: PokemonPosition },
    /// Evolve the Pokemon at `target` with a card from hand.
    Evolve { card_id: String, target: PokemonPosition },
    /// Swap the active Pokemon with a benched one. `energy` chooses what pays
    /// the retreat cost; the most recently attached energy is used otherwise.
    Retreat {
        bench_index: usize,
        #[serde(default)]
        energy: Option<Vec<String>>,
    },
    UseAbility { position: PokemonPosition },
    /// `energy_selection` pays self discard-energy costs.
    Attack {
        attack_index: usize,
        #[serde(default)]
        energy_selection: Option<Vec<String>>,
    },
    ApproveCoinFlip,
    /// Take one of the remaining prize cards.
    SelectPrize { index: usize },
    EndTurn,

    Concede,
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::JoinMatch => ActionType::JoinMatch,
            Action::SubmitDeck { .. } => ActionType::SubmitDeck,
            Action::ApproveMatch => ActionType::ApproveMatch,
            Action::ShuffleDeck => ActionType::ShuffleDeck,
            Action::DrawInitialCards => ActionType::DrawInitialCards,
            Action::SetPrizeCards => ActionType::SetPrizeCards,
            Action::SetActivePokemon { .. } => ActionType::SetActivePokemon,
            Action::PlayPokemon { .. } => ActionType::PlayPokemon,
            Action::CompleteSetup => ActionType::CompleteSetup,
            Action::SelectFirstPlayer => ActionType::SelectFirstPlayer,
            Action::CancelMatch => ActionType::CancelMatch,
            Action::DrawCard => ActionType::DrawCard,
            Action::AttachEnergy { .. } => ActionType::AttachEnergy,
            Action::Evolve { .. } => ActionType::Evolve,
            Action::Retreat { .. } => ActionType::Retreat,
            Action::UseAbility { .. } => ActionType::UseAbility,
            Action::Attack { .. } => ActionType::Attack,
            Action::ApproveCoinFlip => ActionType::ApproveCoinFlip,
            Action::SelectPrize { .. } => ActionType::SelectPrize,
            Action::EndTurn => ActionType::EndTurn,
            Action::Concede => ActionType::Concede,
        }
    }
}

/// One entry of the append-only action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Caller-supplied identity; also seeds coin flips.
    pub action_id: String,
    pub player: PlayerId,
    pub action: Action,
}

impl ActionRecord {
    pub fn new(action_id: impl Into<String>, player: PlayerId, action: Action) -> Self {
        ActionRecord {
            action_id: action_id.into(),
            player,
            action,
        }
    }
}

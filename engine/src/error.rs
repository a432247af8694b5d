//! Engine error taxonomy.
//!
//! Every failure is returned as a value. Handlers work on a cloned
//! `GameState`, so a returned error always leaves the caller's state as it was.

use thiserror::Error;

use crate::data::card::EnergyType;
use crate::game::actions::ActionType;
use crate::game::coin::CoinFlipStatus;
use crate::game::state::{MatchState, PlayerId, PokemonPosition, StatusCondition, TurnPhase};

/// The action is illegal for the current match state, phase or turn owner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("match is already over ({0:?})")]
    MatchOver(MatchState),

    #[error("{action:?} is not allowed while the match is {state:?}")]
    NotAllowedInState { action: ActionType, state: MatchState },

    #[error("{action:?} is not allowed during the {phase:?} phase")]
    NotAllowedInPhase { action: ActionType, phase: TurnPhase },

    #[error("it is not {requester:?}'s turn")]
    NotYourTurn { requester: PlayerId },

    #[error("{0:?} has already completed this step")]
    AlreadyActed(PlayerId),

    #[error("card {0} is not in hand")]
    CardNotInHand(String),

    #[error("card {0} is not a basic Pokémon")]
    NotBasicPokemon(String),

    #[error("card {0} is not an energy card")]
    NotEnergyCard(String),

    #[error("bench is full ({0} slots)")]
    BenchFull(usize),

    #[error("no Pokémon at {0:?}")]
    NoPokemonAt(PokemonPosition),

    #[error("energy has already been attached this turn")]
    EnergyAlreadyAttached,

    #[error("active Pokémon has already retreated this turn")]
    AlreadyRetreated,

    #[error("active Pokémon is {0:?}")]
    StatusPreventsAction(StatusCondition),

    #[error("invalid evolution: {0}")]
    InvalidEvolution(String),

    #[error("{0} has no ability")]
    NoAbility(String),

    #[error("ability of {0} was already used this turn")]
    AbilityAlreadyUsed(String),

    #[error("the first player cannot attack on the first turn")]
    FirstTurnAttack,

    #[error("{0:?} already has an active Pokémon")]
    ActiveAlreadySet(PlayerId),

    #[error("{0:?} has no prize to take")]
    NoPrizeOwed(PlayerId),

    #[error("prize index {index} out of range ({remaining} remaining)")]
    InvalidPrizeIndex { index: usize, remaining: usize },

    #[error("submitted deck is empty")]
    EmptyDeck,
}

/// The action is legal but the game state cannot satisfy it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("{player:?} has no active Pokémon")]
    NoActivePokemon { player: PlayerId },

    #[error("insufficient energy: need {required}, have {available}")]
    InsufficientEnergy { required: u32, available: u32 },

    #[error("attack index {index} out of range ({available} attacks)")]
    InvalidAttackIndex { index: usize, available: usize },

    #[error("attack {0} cannot be used right now")]
    AttackPreconditionsUnmet(String),

    #[error("select {required} {energy_type:?} energy to discard from {available:?}")]
    EnergySelectionRequired {
        required: u32,
        energy_type: Option<EnergyType>,
        available: Vec<String>,
    },

    #[error("invalid energy selection: {0}")]
    InvalidEnergySelection(String),

    #[error("unreadable damage value {0:?}")]
    InvalidDamage(String),

    #[error("{0:?} has no basic Pokémon after the mulligan limit")]
    NoBasicInHand(PlayerId),
}

/// A collaborator could not resolve an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("card {0} does not provide energy")]
    NotAnEnergy(String),

    #[error("card instance not found: {0}")]
    InstanceNotFound(String),
}

/// The coin flip handshake was driven out of order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("no coin flip is in progress")]
    NoCoinFlip,

    #[error("coin flip is not ready (status {0:?})")]
    NotReadyToFlip(CoinFlipStatus),

    #[error("{0:?} already approved this coin flip")]
    DuplicateApproval(PlayerId),
}

/// Top-level error returned by every engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

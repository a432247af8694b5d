use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::card::Card;
use crate::effects::mechanics::DefenseKind;
use crate::game::actions::ActionRecord;
use crate::game::coin::CoinFlipState;

/// Poison damage applied between turns unless the effect says otherwise.
pub const DEFAULT_POISON_DAMAGE: u32 = 10;

/// One of the two seats in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerId {
    Player1,
    Player2,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::Player1, PlayerId::Player2];

    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Created,
    WaitingForPlayers,
    DeckValidation,
    MatchApproval,
    PreGameSetup,
    DrawingCards,
    SetPrizeCards,
    SelectActivePokemon,
    SelectBenchPokemon,
    FirstPlayerSelection,
    PlayerTurn,
    BetweenTurns,
    MatchEnded,
    Cancelled,
}

impl MatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchState::MatchEnded | MatchState::Cancelled)
    }

    /// States before the first turn starts.
    pub fn is_pre_game(self) -> bool {
        !self.is_terminal() && !matches!(self, MatchState::PlayerTurn | MatchState::BetweenTurns)
    }
}

/// Current phase within a player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    Draw,
    MainPhase,
    /// An attack is waiting on its coin flip.
    Attack,
    /// The attack has resolved; only prize selection and END_TURN remain.
    End,
}

/// Status conditions a Pokemon can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCondition {
    Asleep,
    Burned,
    Confused,
    Paralyzed,
    Poisoned,
}

impl StatusCondition {
    /// Asleep, Confused and Paralyzed replace each other.
    pub fn is_exclusive(self) -> bool {
        matches!(
            self,
            StatusCondition::Asleep | StatusCondition::Confused | StatusCondition::Paralyzed
        )
    }
}

/// Where a Pokemon sits on its owner's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PokemonPosition {
    Active,
    Bench(usize),
}

/// A Pokemon that has been put into play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique within the match.
    pub instance_id: String,
    /// Catalog id of the top card.
    pub card_id: String,
    pub position: PokemonPosition,
    pub current_hp: u32,
    pub max_hp: u32,
    /// Attached energy card ids, in attachment order.
    pub attached_energy: Vec<String>,
    pub status_effects: BTreeSet<StatusCondition>,
    pub poison_damage: u32,
    /// PARALYZED clears once the turn number passes this value.
    pub paralysis_clears_at_turn: Option<u32>,
    /// Card ids this Pokemon evolved from, oldest first.
    pub evolution_chain: Vec<String>,
    /// Turn number when this card was placed on the field or evolved.
    pub turn_played: u32,
    pub prize_value: u32,
    pub used_ability_this_turn: bool,
}

impl CardInstance {
    pub fn new(instance_id: String, card: &Card, position: PokemonPosition, turn: u32) -> Self {
        CardInstance {
            instance_id,
            card_id: card.id.clone(),
            position,
            current_hp: card.max_hp(),
            max_hp: card.max_hp(),
            attached_energy: Vec::new(),
            status_effects: BTreeSet::new(),
            poison_damage: DEFAULT_POISON_DAMAGE,
            paralysis_clears_at_turn: None,
            evolution_chain: Vec::new(),
            turn_played: turn,
            prize_value: card.prize_value(),
            used_ability_this_turn: false,
        }
    }

    pub fn with_position(mut self, position: PokemonPosition) -> Self {
        self.position = position;
        self
    }

    /// Take damage; HP never drops below zero.
    pub fn with_damage(mut self, amount: u32) -> Self {
        self.current_hp = self.current_hp.saturating_sub(amount);
        self
    }

    /// Heal damage; HP never exceeds the maximum.
    pub fn with_healing(mut self, amount: u32) -> Self {
        self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        self
    }

    /// Add a status condition, replacing incompatible ones.
    pub fn with_status(mut self, status: StatusCondition) -> Self {
        if status.is_exclusive() {
            self.status_effects.retain(|s| !s.is_exclusive());
            if status != StatusCondition::Paralyzed {
                self.paralysis_clears_at_turn = None;
            }
        }
        self.status_effects.insert(status);
        self
    }

    pub fn with_poison_damage(mut self, amount: u32) -> Self {
        self.poison_damage = amount;
        self
    }

    pub fn with_paralysis_clear_turn(mut self, turn: u32) -> Self {
        self.paralysis_clears_at_turn = Some(turn);
        self
    }

    pub fn without_status(mut self, status: StatusCondition) -> Self {
        self.status_effects.remove(&status);
        match status {
            StatusCondition::Paralyzed => self.paralysis_clears_at_turn = None,
            StatusCondition::Poisoned => self.poison_damage = DEFAULT_POISON_DAMAGE,
            _ => {}
        }
        self
    }

    /// Clear all status conditions (evolving or retreating).
    pub fn without_statuses(mut self) -> Self {
        self.status_effects.clear();
        self.paralysis_clears_at_turn = None;
        self.poison_damage = DEFAULT_POISON_DAMAGE;
        self
    }

    /// Put `card` on top. Damage taken, energy and the instance id carry over;
    /// status conditions do not.
    pub fn evolve_into(self, card: &Card, turn: u32) -> Self {
        let damage_taken = self.max_hp.saturating_sub(self.current_hp);
        let mut evolved = self.without_statuses();
        evolved.evolution_chain.push(std::mem::take(&mut evolved.card_id));
        evolved.card_id = card.id.clone();
        evolved.max_hp = card.max_hp();
        evolved.current_hp = card.max_hp().saturating_sub(damage_taken);
        evolved.prize_value = card.prize_value();
        evolved.turn_played = turn;
        evolved
    }

    pub fn with_attached_energy(mut self, card_id: String) -> Self {
        self.attached_energy.push(card_id);
        self
    }

    /// Detach one copy of each id; fails if any id is not attached.
    pub fn without_energy(mut self, card_ids: &[String]) -> Option<Self> {
        for id in card_ids {
            let pos = self.attached_energy.iter().position(|e| e == id)?;
            self.attached_energy.remove(pos);
        }
        Some(self)
    }

    pub fn has_status(&self, status: StatusCondition) -> bool {
        self.status_effects.contains(&status)
    }

    pub fn is_knocked_out(&self) -> bool {
        self.current_hp == 0
    }

    /// Accumulated damage in units of 10 HP.
    pub fn damage_counters(&self) -> u32 {
        (self.max_hp - self.current_hp.min(self.max_hp)) / 10
    }

    pub fn has_damage(&self) -> bool {
        self.current_hp < self.max_hp
    }

    /// Every card that leaves play with this Pokemon.
    pub fn all_cards(&self) -> Vec<String> {
        let mut cards = Vec::with_capacity(1 + self.attached_energy.len() + self.evolution_chain.len());
        cards.push(self.card_id.clone());
        cards.extend(self.attached_energy.iter().cloned());
        cards.extend(self.evolution_chain.iter().cloned());
        cards
    }
}

/// State for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGameState {
    /// Top of the deck is index 0.
    pub deck: Vec<String>,
    pub hand: Vec<String>,
    pub active: Option<CardInstance>,
    pub bench: Vec<CardInstance>,
    pub discard: Vec<String>,
    pub prize_cards: Vec<String>,
    pub has_attached_energy_this_turn: bool,
    pub has_retreated_this_turn: bool,
    /// Prize cards this player has earned but not yet taken.
    pub prizes_owed: u32,
    pub joined: bool,
    /// Readiness for the current pre-game step.
    pub setup_complete: bool,
}

impl PlayerGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active first, then the bench in order.
    pub fn pokemon_in_play(&self) -> impl Iterator<Item = &CardInstance> {
        self.active.iter().chain(self.bench.iter())
    }

    pub fn has_pokemon_in_play(&self) -> bool {
        self.active.is_some() || !self.bench.is_empty()
    }

    pub fn pokemon_at(&self, position: PokemonPosition) -> Option<&CardInstance> {
        match position {
            PokemonPosition::Active => self.active.as_ref(),
            PokemonPosition::Bench(i) => self.bench.get(i),
        }
    }

    pub fn instance(&self, instance_id: &str) -> Option<&CardInstance> {
        self.pokemon_in_play().find(|p| p.instance_id == instance_id)
    }

    /// Write back an updated instance at the position it records.
    pub fn replace_instance(&mut self, instance: CardInstance) {
        match instance.position {
            PokemonPosition::Active => self.active = Some(instance),
            PokemonPosition::Bench(i) => {
                if let Some(slot) = self.bench.get_mut(i) {
                    *slot = instance;
                }
            }
        }
    }

    /// Remove one copy of `card_id` from hand.
    pub fn take_from_hand(&mut self, card_id: &str) -> Option<String> {
        let pos = self.hand.iter().position(|c| c == card_id)?;
        Some(self.hand.remove(pos))
    }

    /// Move the top `count` deck cards to hand; returns how many were drawn.
    pub fn draw(&mut self, count: usize) -> usize {
        let n = count.min(self.deck.len());
        let drawn: Vec<String> = self.deck.drain(..n).collect();
        self.hand.extend(drawn);
        n
    }

    /// Remove an instance from play and discard it with its attachments.
    pub fn discard_instance(&mut self, instance_id: &str) -> Option<CardInstance> {
        let removed = if self.active.as_ref().is_some_and(|a| a.instance_id == instance_id) {
            self.active.take()
        } else {
            let pos = self.bench.iter().position(|p| p.instance_id == instance_id)?;
            let removed = self.bench.remove(pos);
            self.reindex_bench();
            Some(removed)
        }?;
        self.discard.extend(removed.all_cards());
        Some(removed)
    }

    /// Keep each bench instance's recorded position in sync with its slot.
    pub fn reindex_bench(&mut self) {
        for (i, pokemon) in self.bench.iter_mut().enumerate() {
            pokemon.position = PokemonPosition::Bench(i);
        }
    }

    /// Reset per-turn flags at the start of this player's turn.
    pub fn start_turn(&mut self) {
        self.has_attached_energy_this_turn = false;
        self.has_retreated_this_turn = false;
        if let Some(ref mut active) = self.active {
            active.used_ability_this_turn = false;
        }
        for pokemon in &mut self.bench {
            pokemon.used_ability_this_turn = false;
        }
    }
}

/// A Pokemon removed from play at zero HP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knockout {
    pub player: PlayerId,
    pub instance_id: String,
    pub card_id: String,
    pub prize_value: u32,
}

/// Damage prevention or reduction protecting one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseEffect {
    pub player: PlayerId,
    pub instance_id: String,
    pub kind: DefenseKind,
    /// Dropped once the turn number passes this value.
    pub expires_after_turn: u32,
}

/// A sleeping active Pokemon waiting on its wake-up flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStatusCheck {
    pub player: PlayerId,
    pub instance_id: String,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    PrizesTaken,
    NoPokemonInPlay,
    DeckOut,
    Concede,
}

/// Complete match state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub match_id: String,
    pub player1: PlayerGameState,
    pub player2: PlayerGameState,
    pub match_state: MatchState,
    /// Starts at 1 on the first turn; odd turns belong to `first_player`.
    pub turn_number: u32,
    pub first_player: PlayerId,
    pub current_player: PlayerId,
    pub phase: TurnPhase,
    pub coin_flip: Option<CoinFlipState>,
    pub action_history: Vec<ActionRecord>,
    pub last_action: Option<ActionRecord>,
    pub defenses: Vec<DefenseEffect>,
    pub queued_status_checks: Vec<PendingStatusCheck>,
    pub winner: Option<PlayerId>,
    pub win_reason: Option<WinReason>,
    /// Source for new instance ids.
    pub next_instance: u32,
}

impl GameState {
    pub fn new(match_id: impl Into<String>) -> Self {
        GameState {
            match_id: match_id.into(),
            player1: PlayerGameState::new(),
            player2: PlayerGameState::new(),
            match_state: MatchState::Created,
            turn_number: 0,
            first_player: PlayerId::Player1,
            current_player: PlayerId::Player1,
            phase: TurnPhase::Draw,
            coin_flip: None,
            action_history: Vec::new(),
            last_action: None,
            defenses: Vec::new(),
            queued_status_checks: Vec::new(),
            winner: None,
            win_reason: None,
            next_instance: 0,
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerGameState {
        match id {
            PlayerId::Player1 => &self.player1,
            PlayerId::Player2 => &self.player2,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerGameState {
        match id {
            PlayerId::Player1 => &mut self.player1,
            PlayerId::Player2 => &mut self.player2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.match_state.is_terminal()
    }

    /// Which player owns a turn number.
    pub fn turn_owner(&self, turn: u32) -> PlayerId {
        if turn % 2 == 1 {
            self.first_player
        } else {
            self.first_player.opponent()
        }
    }

    /// The first turn after `after` that belongs to `player`.
    pub fn next_turn_of(&self, player: PlayerId, after: u32) -> u32 {
        if self.turn_owner(after + 1) == player {
            after + 1
        } else {
            after + 2
        }
    }

    pub fn allocate_instance_id(&mut self, owner: PlayerId) -> String {
        self.next_instance += 1;
        let prefix = match owner {
            PlayerId::Player1 => "p1",
            PlayerId::Player2 => "p2",
        };
        format!("{}-{}", prefix, self.next_instance)
    }

    /// Defensive effects protecting one instance.
    pub fn defenses_for<'a>(
        &'a self,
        player: PlayerId,
        instance_id: &'a str,
    ) -> impl Iterator<Item = &'a DefenseEffect> + 'a {
        self.defenses
            .iter()
            .filter(move |d| d.player == player && d.instance_id == instance_id)
    }

    /// Remove a zero-HP instance from play, discard it with its energy and
    /// evolution chain, and credit the opponent with the prizes it is worth.
    /// The active slot is left empty.
    pub fn knock_out(&mut self, player: PlayerId, instance_id: &str) -> Option<Knockout> {
        let removed = self.player_mut(player).discard_instance(instance_id)?;
        self.defenses.retain(|d| !(d.player == player && d.instance_id == instance_id));
        self.queued_status_checks
            .retain(|c| !(c.player == player && c.instance_id == instance_id));
        self.player_mut(player.opponent()).prizes_owed += removed.prize_value;
        tracing::info!(
            match_id = %self.match_id,
            ?player,
            instance = %removed.instance_id,
            card = %removed.card_id,
            "pokemon knocked out"
        );
        Some(Knockout {
            player,
            instance_id: removed.instance_id,
            card_id: removed.card_id,
            prize_value: removed.prize_value,
        })
    }
}

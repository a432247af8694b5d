use serde::{Deserialize, Serialize};

use crate::effects::mechanics::{AbilityEffect, AttackEffect, Condition};
use crate::game::coin::CoinFlipConfiguration;

/// Energy types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Grass,
    Fire,
    Water,
    #[serde(alias = "electric")]
    Lightning,
    Psychic,
    Fighting,
    #[serde(alias = "dark")]
    Darkness,
    #[serde(alias = "steel")]
    Metal,
    Dragon,
    Fairy,
    #[serde(alias = "normal")]
    Colorless,
}

impl EnergyType {
    /// Whether this requirement can be paid with any energy.
    pub fn is_colorless(self) -> bool {
        self == EnergyType::Colorless
    }

    /// Parse a type name as it appears in card text.
    pub fn from_name(name: &str) -> Option<EnergyType> {
        match name.trim().to_lowercase().as_str() {
            "grass" => Some(EnergyType::Grass),
            "fire" => Some(EnergyType::Fire),
            "water" => Some(EnergyType::Water),
            "lightning" | "electric" => Some(EnergyType::Lightning),
            "psychic" => Some(EnergyType::Psychic),
            "fighting" => Some(EnergyType::Fighting),
            "darkness" | "dark" => Some(EnergyType::Darkness),
            "metal" | "steel" => Some(EnergyType::Metal),
            "dragon" => Some(EnergyType::Dragon),
            "fairy" => Some(EnergyType::Fairy),
            "colorless" | "normal" => Some(EnergyType::Colorless),
            _ => None,
        }
    }
}

/// Evolution stage of a Pokemon card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Basic,
    #[serde(alias = "stage-1", alias = "Stage 1")]
    Stage1,
    #[serde(alias = "stage-2", alias = "Stage 2")]
    Stage2,
}

impl Stage {
    /// The stage a card of this stage evolves from.
    pub fn previous(self) -> Option<Stage> {
        match self {
            Stage::Basic => None,
            Stage::Stage1 => Some(Stage::Basic),
            Stage::Stage2 => Some(Stage::Stage1),
        }
    }
}

/// What type of card this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Pokemon,
    Energy,
    Supporter,
    Item,
    Tool,
}

/// Damage subtracted when the attacker's type matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resistance {
    pub energy_type: EnergyType,
    pub amount: u32,
}

/// What an energy card supplies while attached.
///
/// A basic energy supplies one unit of its type. Special energy may list
/// several types; each of its `amount` units can pay for any one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyProvision {
    pub types: Vec<EnergyType>,
    #[serde(default = "one")]
    pub amount: u32,
}

fn one() -> u32 {
    1
}

/// An attack a Pokemon can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    /// Attack name.
    pub name: String,
    /// Energy cost to use this attack.
    pub energy_cost: Vec<EnergyType>,
    /// Printed damage: `"30"`, `"30+"`, `"50-"`, `"20×"` or empty.
    #[serde(default)]
    pub damage: String,
    /// Rules text. Only the text interpreter reads it.
    #[serde(default)]
    pub text: Option<String>,
    /// Conditions that must hold for the attack to be used at all.
    #[serde(default)]
    pub preconditions: Vec<Condition>,
    /// Structured effects.
    #[serde(default)]
    pub effects: Vec<AttackEffect>,
    /// Cap on extra qualifying energy counted by an energy bonus.
    #[serde(default)]
    pub energy_bonus_cap: Option<u32>,
    /// Coin flip that gates this attack's damage or effects.
    #[serde(default)]
    pub coin_flip: Option<CoinFlipConfiguration>,
}

impl Attack {
    pub fn new(name: &str, energy_cost: Vec<EnergyType>, damage: &str) -> Self {
        Attack {
            name: name.to_string(),
            energy_cost,
            damage: damage.to_string(),
            text: None,
            preconditions: Vec::new(),
            effects: Vec::new(),
            energy_bonus_cap: None,
            coin_flip: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_effect(mut self, effect: AttackEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_coin_flip(mut self, coin_flip: CoinFlipConfiguration) -> Self {
        self.coin_flip = Some(coin_flip);
        self
    }

    pub fn with_bonus_cap(mut self, cap: u32) -> Self {
        self.energy_bonus_cap = Some(cap);
        self
    }
}

/// An activated ability on a Pokemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<AbilityEffect>,
}

/// A complete card definition with all game-relevant data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Catalog identifier.
    pub id: String,
    /// Card name (e.g., "Venusaur ex").
    pub name: String,
    /// Type of card.
    pub card_type: CardType,

    // -- Pokemon-specific fields --
    #[serde(default)]
    pub hp: Option<u32>,
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Energy type / element (Pokemon only).
    #[serde(default)]
    pub energy_type: Option<EnergyType>,
    /// Incoming damage is doubled from attackers of this type.
    #[serde(default)]
    pub weakness: Option<EnergyType>,
    #[serde(default)]
    pub resistance: Option<Resistance>,
    /// Retreat cost in colorless energy (Pokemon only).
    #[serde(default)]
    pub retreat_cost: Option<u32>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default)]
    pub ability: Option<Ability>,
    /// What this Pokemon evolves from (name of pre-evolution).
    #[serde(default)]
    pub evolves_from: Option<String>,
    /// Whether this is an ex Pokemon (gives 2 prize cards when KO'd).
    #[serde(default)]
    pub is_ex: bool,

    // -- Energy fields --
    #[serde(default)]
    pub energy_provision: Option<EnergyProvision>,
}

impl Card {
    /// A Pokemon card with no attacks yet.
    pub fn pokemon(id: &str, name: &str, stage: Stage, hp: u32, energy_type: EnergyType) -> Self {
        Card {
            id: id.to_string(),
            name: name.to_string(),
            card_type: CardType::Pokemon,
            hp: Some(hp),
            stage: Some(stage),
            energy_type: Some(energy_type),
            weakness: None,
            resistance: None,
            retreat_cost: Some(1),
            attacks: Vec::new(),
            ability: None,
            evolves_from: None,
            is_ex: false,
            energy_provision: None,
        }
    }

    /// A basic energy card supplying one unit of `energy_type`.
    pub fn basic_energy(id: &str, energy_type: EnergyType) -> Self {
        Self::special_energy(id, vec![energy_type], 1)
    }

    /// An energy card supplying `amount` units, each of any of `types`.
    pub fn special_energy(id: &str, types: Vec<EnergyType>, amount: u32) -> Self {
        Card {
            id: id.to_string(),
            name: id.to_string(),
            card_type: CardType::Energy,
            hp: None,
            stage: None,
            energy_type: None,
            weakness: None,
            resistance: None,
            retreat_cost: None,
            attacks: Vec::new(),
            ability: None,
            evolves_from: None,
            is_ex: false,
            energy_provision: Some(EnergyProvision { types, amount }),
        }
    }

    pub fn is_pokemon(&self) -> bool {
        self.card_type == CardType::Pokemon
    }

    pub fn is_basic_pokemon(&self) -> bool {
        self.is_pokemon() && self.stage == Some(Stage::Basic)
    }

    pub fn is_evolution(&self) -> bool {
        self.is_pokemon() && matches!(self.stage, Some(Stage::Stage1) | Some(Stage::Stage2))
    }

    pub fn is_energy(&self) -> bool {
        self.card_type == CardType::Energy && self.energy_provision.is_some()
    }

    /// Maximum HP for this Pokemon.
    pub fn max_hp(&self) -> u32 {
        self.hp.unwrap_or(0)
    }

    /// Prize cards the opponent takes when this Pokemon is knocked out.
    pub fn prize_value(&self) -> u32 {
        if self.is_ex {
            2
        } else {
            1
        }
    }

    /// Whether `self` evolves directly from `base`.
    pub fn evolves_from_card(&self, base: &Card) -> bool {
        let Some(stage) = self.stage else {
            return false;
        };
        self.is_evolution()
            && self.evolves_from.as_deref() == Some(base.name.as_str())
            && base.stage.is_some()
            && stage.previous() == base.stage
    }
}

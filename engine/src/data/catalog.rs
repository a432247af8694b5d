use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::card::Card;
use crate::error::{EngineError, EngineResult, ResourceError};

/// Source of static card metadata.
///
/// The engine never stores card definitions in `GameState`; every lookup goes
/// through this trait so the catalog can live anywhere.
pub trait CardRepository {
    /// Look up one card. Unknown ids fail with `ResourceError::CardNotFound`.
    fn card(&self, card_id: &str) -> EngineResult<Card>;

    /// Look up several cards at once, keyed by id.
    fn cards(&self, card_ids: &[String]) -> EngineResult<HashMap<String, Card>> {
        let mut found = HashMap::with_capacity(card_ids.len());
        for id in card_ids {
            if !found.contains_key(id) {
                found.insert(id.clone(), self.card(id)?);
            }
        }
        Ok(found)
    }
}

/// An in-memory catalog indexed by id and name.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl CardCatalog {
    pub fn new(cards: Vec<Card>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, card) in cards.iter().enumerate() {
            by_name.entry(card.name.clone()).or_default().push(i);
            by_id.insert(card.id.clone(), i);
        }

        CardCatalog {
            cards,
            by_id,
            by_name,
        }
    }

    /// Parse a JSON array of cards.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let cards: Vec<Card> = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("failed to parse card JSON: {}", e)))?;
        Ok(Self::new(cards))
    }

    /// Load a JSON card file from disk.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&data)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Card> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }

    /// First printing registered under `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Card> {
        self.by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| &self.cards[i])
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl CardRepository for CardCatalog {
    fn card(&self, card_id: &str) -> EngineResult<Card> {
        self.get_by_id(card_id)
            .cloned()
            .ok_or_else(|| ResourceError::CardNotFound(card_id.to_string()).into())
    }
}

use crate::data::card::{Card, EnergyType};
use crate::data::catalog::CardRepository;
use crate::error::{EngineResult, PreconditionError, ResourceError};

/// What one attached energy card can pay for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergySupply {
    pub card_id: String,
    pub types: Vec<EnergyType>,
    pub amount: u32,
}

impl EnergySupply {
    pub fn from_card(card: &Card) -> EngineResult<Self> {
        let provision = card
            .energy_provision
            .as_ref()
            .ok_or_else(|| ResourceError::NotAnEnergy(card.id.clone()))?;
        Ok(EnergySupply {
            card_id: card.id.clone(),
            types: provision.types.clone(),
            amount: provision.amount,
        })
    }

    pub fn provides(&self, energy_type: EnergyType) -> bool {
        self.types.contains(&energy_type)
    }

    /// A plain energy card that supplies exactly this type.
    fn is_exact(&self, energy_type: EnergyType) -> bool {
        self.types.len() == 1 && self.types[0] == energy_type
    }
}

/// Resolve attached energy ids into supplies, in attachment order.
pub fn energy_supplies(attached: &[String], catalog: &dyn CardRepository) -> EngineResult<Vec<EnergySupply>> {
    let cards = catalog.cards(attached)?;
    attached
        .iter()
        .map(|id| match cards.get(id) {
            Some(card) => EnergySupply::from_card(card),
            None => Err(ResourceError::CardNotFound(id.clone()).into()),
        })
        .collect()
}

/// Units of energy available; `None` counts every unit.
pub fn count_energy(supplies: &[EnergySupply], energy_type: Option<EnergyType>) -> u32 {
    supplies
        .iter()
        .filter(|s| energy_type.map_or(true, |t| s.provides(t)))
        .map(|s| s.amount)
        .sum()
}

/// Requirements of a type in a cost; `None` counts the whole cost.
pub fn required_of_type(cost: &[EnergyType], energy_type: Option<EnergyType>) -> u32 {
    match energy_type {
        Some(t) => cost.iter().filter(|&&e| e == t).count() as u32,
        None => cost.len() as u32,
    }
}

/// Check that `supplies` can pay `cost`.
///
/// Typed requirements are paid first by single-type cards. Whatever they
/// leave over is matched against multi-type special energy, trying every
/// provider for each type. Colorless requirements then take whatever supply
/// is left.
pub fn validate_energy(cost: &[EnergyType], supplies: &[EnergySupply]) -> Result<(), PreconditionError> {
    let required = cost.len() as u32;
    let available: u32 = supplies.iter().map(|s| s.amount).sum();
    let insufficient = PreconditionError::InsufficientEnergy { required, available };

    let mut remaining: Vec<u32> = supplies.iter().map(|s| s.amount).collect();

    let mut unmatched = Vec::new();
    for &needed in cost.iter().filter(|e| !e.is_colorless()) {
        match (0..supplies.len()).find(|&i| remaining[i] > 0 && supplies[i].is_exact(needed)) {
            Some(i) => remaining[i] -= 1,
            None => unmatched.push(needed),
        }
    }
    if !assign_flexible(&unmatched, supplies, &mut remaining) {
        return Err(insufficient);
    }

    let colorless = cost.iter().filter(|e| e.is_colorless()).count() as u32;
    let leftover: u32 = remaining.iter().sum();
    if leftover < colorless {
        return Err(insufficient);
    }
    Ok(())
}

/// Pay each requirement from some supply still holding a unit, backtracking
/// on a dead end. Leaves `remaining` debited on success.
fn assign_flexible(needs: &[EnergyType], supplies: &[EnergySupply], remaining: &mut [u32]) -> bool {
    let Some((&needed, rest)) = needs.split_first() else {
        return true;
    };
    for i in 0..supplies.len() {
        if remaining[i] == 0 || !supplies[i].provides(needed) {
            continue;
        }
        remaining[i] -= 1;
        if assign_flexible(rest, supplies, remaining) {
            return true;
        }
        remaining[i] += 1;
    }
    false
}

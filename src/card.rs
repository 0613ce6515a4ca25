use crate::catalog::Catalog;
use crate::errors::{CatalogResult, UpgradeError};
use schema::{CardId, CardTemplate, CardType, EffectKind, EffectModifier, UpgradePath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique handle for one physical copy of a card.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardInstance {
    pub instance_id: InstanceId,
    pub template_id: CardId,
    pub level: u8,                         // 1 = base, 2 = upgraded
    pub chosen_path: Option<UpgradePath>,
}

impl CardInstance {
    pub fn new(template: &CardTemplate) -> Self {
        Self {
            instance_id: InstanceId::next(),
            template_id: template.id.clone(),
            level: 1,
            chosen_path: None,
        }
    }

    pub fn is_upgraded(&self) -> bool {
        self.chosen_path.is_some()
    }

    /// Resolve this instance's effective stats against its template.
    pub fn stats(&self, catalog: &Catalog) -> CatalogResult<CardStats> {
        let template = catalog.template(&self.template_id)?;
        Ok(effective_stats(template, self.chosen_path))
    }
}

/// Derived, never stored: what a card instance actually does right now.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardStats {
    pub card_type: CardType,
    pub cost: u32,
    pub value: i32,
    pub name: String,
    pub description: String,
    pub long_description: String,
    pub effect: EffectKind,
    pub modifiers: Vec<EffectModifier>,
}

impl CardStats {
    /// `value` floored at zero, for effects that cannot go negative.
    pub fn magnitude(&self) -> u32 {
        self.value.max(0) as u32
    }

    pub fn has(&self, modifier: &EffectModifier) -> bool {
        self.modifiers.contains(modifier)
    }

    pub fn lifesteal_percent(&self) -> u32 {
        self.modifiers
            .iter()
            .map(|modifier| match modifier {
                EffectModifier::Lifesteal(percent) => *percent,
                _ => 0,
            })
            .sum()
    }
}

/// Pure function of template + chosen path.
pub fn effective_stats(template: &CardTemplate, path: Option<UpgradePath>) -> CardStats {
    let upgrade = path.and_then(|p| template.upgrade(p));

    let value_delta = upgrade.map_or(0, |u| u.value_delta);
    let cost_delta = upgrade.map_or(0, |u| u.cost_delta);

    let value = template.base_value + value_delta;
    let cost = (template.base_cost as i64 + cost_delta as i64).max(0) as u32;

    let name = upgrade.map_or_else(|| template.base_name.clone(), |u| u.name.clone());
    let description = template.base_description.replace("{val}", &value.to_string());
    let long_description = match upgrade {
        Some(u) => format!("{} ({})", description, u.description),
        None => description.clone(),
    };

    let mut modifiers = template.base_modifiers.clone();
    if let Some(u) = upgrade {
        modifiers.extend(u.modifiers.iter().cloned());
    }

    CardStats {
        card_type: template.card_type,
        cost,
        value,
        name,
        description,
        long_description,
        effect: template.base_effect,
        modifiers,
    }
}

/// The player's persistent card collection and upgrade currency.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Collection {
    cards: Vec<CardInstance>,
    upgrade_points: u32,
}

// Starter deck: 3x Star Slash, 2x Phase Shield, Thunderbolt, Energy Overload, Tactical Supply
const STARTER_DECK: [&str; 8] = ["c1", "c1", "c1", "c2", "c2", "c3", "c4", "c11"];

impl Collection {
    pub fn new(cards: Vec<CardInstance>) -> Self {
        Self {
            cards,
            upgrade_points: 0,
        }
    }

    pub fn starter(catalog: &Catalog) -> CatalogResult<Self> {
        let cards = STARTER_DECK
            .iter()
            .map(|id| catalog.instantiate(&CardId::new(*id)))
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(Self::new(cards))
    }

    pub fn cards(&self) -> &[CardInstance] {
        &self.cards
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<&CardInstance> {
        self.cards.iter().find(|c| c.instance_id == instance_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn add_card(&mut self, card: CardInstance) {
        self.cards.push(card);
    }

    pub fn upgrade_points(&self) -> u32 {
        self.upgrade_points
    }

    pub fn add_upgrade_points(&mut self, amount: u32) {
        self.upgrade_points = self.upgrade_points.saturating_add(amount);
    }

    /// Permanently upgrade a card along `path`, spending one upgrade point.
    /// A card can only ever take one path.
    pub fn choose_upgrade(
        &mut self,
        catalog: &Catalog,
        instance_id: InstanceId,
        path: UpgradePath,
    ) -> Result<(), UpgradeError> {
        let points = self.upgrade_points;
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.instance_id == instance_id)
            .ok_or(UpgradeError::UnknownCard(instance_id))?;

        if card.is_upgraded() {
            return Err(UpgradeError::AlreadyUpgraded(instance_id));
        }

        let has_path = catalog
            .get(&card.template_id)
            .is_some_and(|template| template.upgrade(path).is_some());
        if !has_path {
            return Err(UpgradeError::PathUnavailable {
                template: card.template_id.clone(),
                path,
            });
        }

        if points < 1 {
            return Err(UpgradeError::InsufficientPoints);
        }

        card.chosen_path = Some(path);
        card.level = 2;
        self.upgrade_points = points - 1;

        tracing::debug!("Upgraded card {} along the {} path", instance_id, path);
        Ok(())
    }
}

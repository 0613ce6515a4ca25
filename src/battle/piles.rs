use crate::battle::state::BattleRng;
use crate::card::{CardInstance, InstanceId};
use crate::catalog::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Result of a draw request. `drawn` is less than `requested` when the draw pile ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawResult {
    pub requested: usize,
    pub drawn: usize,
}

/// The three battle piles. Each card instance lives in exactly one of them.
///
/// There is no reshuffle: once the draw pile is empty it stays empty, and the
/// discard pile only gives cards back through recycle effects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Piles {
    draw_pile: VecDeque<CardInstance>, // front is the top
    hand: Vec<CardInstance>,
    discard_pile: Vec<CardInstance>,
}

impl Piles {
    pub fn new(draw_pile: Vec<CardInstance>) -> Self {
        Self {
            draw_pile: draw_pile.into(),
            hand: Vec::new(),
            discard_pile: Vec::new(),
        }
    }

    pub fn from_parts(
        draw_pile: Vec<CardInstance>,
        hand: Vec<CardInstance>,
        discard_pile: Vec<CardInstance>,
    ) -> Self {
        Self {
            draw_pile: draw_pile.into(),
            hand,
            discard_pile,
        }
    }

    /// Move up to `count` cards from the top of the draw pile into the hand.
    pub fn draw(&mut self, count: usize) -> DrawResult {
        let available = count.min(self.draw_pile.len());
        self.hand.extend(self.draw_pile.drain(..available));
        DrawResult {
            requested: count,
            drawn: available,
        }
    }

    pub fn hand(&self) -> &[CardInstance] {
        &self.hand
    }

    pub fn draw_pile(&self) -> &VecDeque<CardInstance> {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[CardInstance] {
        &self.discard_pile
    }

    pub fn hand_card(&self, instance_id: InstanceId) -> Option<&CardInstance> {
        self.hand.iter().find(|c| c.instance_id == instance_id)
    }

    /// Move a played card from the hand onto the discard pile.
    pub fn discard_from_hand(&mut self, instance_id: InstanceId) -> Option<&CardInstance> {
        let position = self
            .hand
            .iter()
            .position(|c| c.instance_id == instance_id)?;
        let card = self.hand.remove(position);
        self.discard_pile.push(card);
        self.discard_pile.last()
    }

    /// Move one random card from the discard pile back to the hand.
    pub fn recycle(&mut self, rng: &mut BattleRng) -> Option<InstanceId> {
        if self.discard_pile.is_empty() {
            return None;
        }
        let index = rng.pick_index("Recycle from discard", self.discard_pile.len());
        let card = self.discard_pile.remove(index);
        let instance_id = card.instance_id;
        self.hand.push(card);
        Some(instance_id)
    }

    pub fn total(&self) -> usize {
        self.draw_pile.len() + self.hand.len() + self.discard_pile.len()
    }

    /// Sorted ids across all piles, for conservation checks.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self
            .draw_pile
            .iter()
            .chain(self.hand.iter())
            .chain(self.discard_pile.iter())
            .map(|c| c.instance_id)
            .collect();
        ids.sort();
        ids
    }
}

/// Build a battle deck of exactly `deck_size` cards from the player's collection.
///
/// Short collections are padded with fresh random catalog cards; the result is
/// shuffled and truncated, so an oversized collection contributes a random subset.
pub fn assemble_deck(
    collection: &[CardInstance],
    catalog: &Catalog,
    deck_size: usize,
    rng: &mut BattleRng,
) -> Vec<CardInstance> {
    let mut deck = collection.to_vec();

    while deck.len() < deck_size {
        let template = catalog.random_template(rng.generator());
        deck.push(CardInstance::new(template));
    }

    remint_duplicate_ids(&mut deck);
    rng.shuffle(&mut deck);
    deck.truncate(deck_size);

    tracing::debug!(
        "Assembled a {}-card deck from a {}-card collection",
        deck.len(),
        collection.len()
    );
    deck
}

/// Give every repeated instance id after its first occurrence a fresh one.
/// Cloned cards and collections restored from another process can collide.
fn remint_duplicate_ids(deck: &mut [CardInstance]) {
    let taken: HashSet<InstanceId> = deck.iter().map(|card| card.instance_id).collect();
    let mut seen = HashSet::with_capacity(deck.len());

    for card in deck.iter_mut() {
        if seen.insert(card.instance_id) {
            continue;
        }
        let fresh = loop {
            let candidate = InstanceId::next();
            if !taken.contains(&candidate) && seen.insert(candidate) {
                break candidate;
            }
        };
        tracing::warn!(
            "Card instance {} appears twice in the deck, re-minted as {}",
            card.instance_id,
            fresh
        );
        card.instance_id = fresh;
    }
}

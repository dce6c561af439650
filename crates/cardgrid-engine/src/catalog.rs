//! Card catalog and weighted draws.
//!
//! The catalog is a process-wide shared service (`Arc<CardCatalog>`) built
//! at startup. Draws take the read lock and may run concurrently from any
//! number of rooms; [`CardCatalog::register`] takes the write lock, so a
//! registration never interleaves with a draw.
//!
//! Normalized weights are computed when the card set changes, never during a
//! draw, so a draw has no side effects on catalog state. Every draw returns
//! an owned copy of the template.

use cardgrid_protocol::{
    Card, CardType, DamageType, ImpactShape, ImpactType, MarkEffect,
};
use std::fmt;

use rand::Rng;
use tokio::sync::RwLock;

use crate::EngineError;

/// Name of the card whose effect places a win-eligible mark.
pub const MARK: &str = "Mark";

/// Source of draw rolls, each uniform in `[0, 1)`.
pub trait Roller: fmt::Debug + Send + Sync + 'static {
    fn roll(&self) -> f64;
}

/// Rolls from `rand::rng()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRoller;

impl Roller for ThreadRoller {
    fn roll(&self) -> f64 {
        rand::rng().random()
    }
}

/// Registry of card templates with their draw weights.
#[derive(Debug)]
pub struct CardCatalog {
    inner: RwLock<CatalogInner>,
    roller: Box<dyn Roller>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    cards: Vec<Card>,
    /// `cumulative[i]` is the normalized weight of `cards[..=i]`.
    cumulative: Vec<f64>,
}

impl CatalogInner {
    fn from_cards(cards: Vec<Card>) -> Self {
        let mut inner = Self {
            cards,
            cumulative: Vec::new(),
        };
        inner.reweigh();
        inner
    }

    fn reweigh(&mut self) {
        let total: f64 = self.cards.iter().map(weight_of).sum();
        let mut running = 0.0;
        self.cumulative = self
            .cards
            .iter()
            .map(|c| {
                if total > 0.0 {
                    running += weight_of(c) / total;
                }
                running
            })
            .collect();
    }

    fn pick(&self, roll: f64) -> Option<&Card> {
        let weighted = || {
            self.cards
                .iter()
                .zip(&self.cumulative)
                .filter(|(card, _)| weight_of(card) > 0.0)
        };
        weighted()
            .find(|(_, cumulative)| **cumulative >= roll)
            // rounding can leave the last cumulative a hair under 1.0
            .or_else(|| weighted().last())
            .map(|(card, _)| card)
    }
}

/// Negative or NaN weights count as zero.
fn weight_of(card: &Card) -> f64 {
    if card.rarity.is_finite() && card.rarity > 0.0 {
        card.rarity
    } else {
        0.0
    }
}

impl CardCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::default()),
            roller: Box::new(ThreadRoller),
        }
    }

    /// Creates a catalog holding the four standard cards.
    pub fn standard() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::from_cards(standard_cards())),
            roller: Box::new(ThreadRoller),
        }
    }

    /// Creates a catalog from an explicit card list.
    ///
    /// # Errors
    /// [`EngineError::DuplicateCard`] if two cards share a name.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, EngineError> {
        for (i, card) in cards.iter().enumerate() {
            if cards[..i].iter().any(|c| c.name == card.name) {
                return Err(EngineError::DuplicateCard(card.name.clone()));
            }
        }
        Ok(Self {
            inner: RwLock::new(CatalogInner::from_cards(cards)),
            roller: Box::new(ThreadRoller),
        })
    }

    /// Replaces the roll source used by [`draw`](Self::draw) and
    /// [`draw_hand`](Self::draw_hand).
    pub fn with_roller(mut self, roller: impl Roller) -> Self {
        self.roller = Box::new(roller);
        self
    }

    /// Adds a card. Exclusive with every draw.
    pub async fn register(&self, card: Card) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        if inner.cards.iter().any(|c| c.name == card.name) {
            return Err(EngineError::DuplicateCard(card.name));
        }
        tracing::debug!(name = %card.name, rarity = card.rarity, "registering card");
        inner.cards.push(card);
        inner.reweigh();
        Ok(())
    }

    /// Registers Default, Mark, Bomb, and Dynamite.
    pub async fn register_standard_cards(&self) -> Result<(), EngineError> {
        for card in standard_cards() {
            self.register(card).await?;
        }
        Ok(())
    }

    /// Draws one card at random, weighted by rarity.
    pub async fn draw(&self) -> Card {
        let roll = self.roller.roll();
        self.pick(roll).await
    }

    /// Draws `count` independent cards.
    pub async fn draw_hand(&self, count: usize) -> Vec<Card> {
        let rolls: Vec<f64> = (0..count).map(|_| self.roller.roll()).collect();
        let inner = self.inner.read().await;
        rolls.into_iter().map(|roll| resolve(&inner, roll)).collect()
    }

    /// Returns the card selected by `roll` (in `[0, 1)`): the first
    /// positive-weight card whose cumulative normalized weight reaches it.
    pub async fn pick(&self, roll: f64) -> Card {
        let inner = self.inner.read().await;
        resolve(&inner, roll)
    }

    /// Looks a card up by name.
    pub async fn get(&self, name: &str) -> Option<Card> {
        let inner = self.inner.read().await;
        inner.cards.iter().find(|c| c.name == name).cloned()
    }

    /// `(name, normalized weight)` for every card. Sums to 1 unless no card
    /// has positive weight.
    pub async fn normalized_weights(&self) -> Vec<(String, f64)> {
        let inner = self.inner.read().await;
        let mut previous = 0.0;
        inner
            .cards
            .iter()
            .zip(&inner.cumulative)
            .map(|(card, cumulative)| {
                let weight = cumulative - previous;
                previous = *cumulative;
                (card.name.clone(), weight)
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.cards.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.cards.is_empty()
    }
}

impl Default for CardCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(inner: &CatalogInner, roll: f64) -> Card {
    match inner.pick(roll) {
        Some(card) => card.clone(),
        None => {
            tracing::error!(
                roll,
                cards = inner.cards.len(),
                "catalog draw matched no card, substituting fallback"
            );
            fallback_card()
        }
    }
}

/// Stand-in returned only when the catalog has no drawable card.
pub fn fallback_card() -> Card {
    Card {
        name: "Fallback".into(),
        description: "Substituted when no card could be drawn.".into(),
        rarity: 0.0,
        ..mark_card()
    }
}

/// The standard card set: Default, Mark, Bomb, Dynamite.
pub fn standard_cards() -> Vec<Card> {
    vec![default_card(), mark_card(), bomb_card(), dynamite_card()]
}

fn default_card() -> Card {
    Card {
        card_type: CardType::Null,
        name: "Default".into(),
        description: "This card does nothing.".into(),
        rarity: 0.0,
        impact_type: ImpactType::Singular,
        impact_shape: ImpactShape::None,
        graphic_path: "src/card_test_mark.png".into(),
        marker_path: "src/naught.svg".into(),
        mark_effect: MarkEffect {
            owner: None,
            health: 1,
            damage: 0,
            destroyable: false,
            stackable: false,
            blocking: false,
            displayable: false,
            win_eligible: false,
            damage_type: DamageType::Place,
            graphic_path: "src/naught.svg".into(),
        },
    }
}

fn mark_card() -> Card {
    Card {
        card_type: CardType::Attack,
        name: MARK.into(),
        description: "Place a mark in a square.".into(),
        rarity: 0.5,
        impact_type: ImpactType::Singular,
        impact_shape: ImpactShape::None,
        graphic_path: "src/card_test_mark.png".into(),
        marker_path: "src/naught.svg".into(),
        mark_effect: MarkEffect {
            owner: None,
            health: 1,
            damage: 0,
            destroyable: true,
            stackable: true,
            blocking: true,
            displayable: true,
            win_eligible: true,
            damage_type: DamageType::Place,
            graphic_path: "src/naught.svg".into(),
        },
    }
}

fn blast_effect() -> MarkEffect {
    MarkEffect {
        owner: None,
        health: 0,
        damage: 100,
        destroyable: false,
        stackable: false,
        blocking: false,
        displayable: false,
        win_eligible: false,
        damage_type: DamageType::Pure,
        graphic_path: "src/naught.svg".into(),
    }
}

fn bomb_card() -> Card {
    Card {
        card_type: CardType::Attack,
        name: "Bomb".into(),
        description: "Destroys all marks in a 1 slot radius.".into(),
        rarity: 0.5,
        impact_type: ImpactType::Multiple,
        impact_shape: ImpactShape::Radius,
        graphic_path: "src/card_test_mark.png".into(),
        marker_path: "src/naught.svg".into(),
        mark_effect: blast_effect(),
    }
}

fn dynamite_card() -> Card {
    Card {
        card_type: CardType::Attack,
        name: "Dynamite".into(),
        description: "Destroys all marks in the same row and column.".into(),
        rarity: 0.5,
        impact_type: ImpactType::Multiple,
        impact_shape: ImpactShape::Lines,
        graphic_path: "src/card_test_mark.png".into(),
        marker_path: "src/naught.svg".into(),
        mark_effect: blast_effect(),
    }
}

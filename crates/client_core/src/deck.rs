use std::{collections::HashSet, fs, path::Path};

use rand::{seq::SliceRandom, Rng};
use shared::domain::{Card, CardId};
use thiserror::Error;

const MAJOR_ARCANA_JSON: &str = include_str!("../data/major_arcana.json");

/// Smallest deck that can fill a Past/Present/Future spread.
pub const MIN_DECK_SIZE: usize = 3;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to read deck file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("deck data is not a valid card list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("deck has {count} cards; at least 3 are required")]
    TooSmall { count: usize },
    #[error("serial number {0} appears more than once")]
    DuplicateSerial(u32),
}

/// The immutable card collection a reading samples from.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Result<Self, DeckError> {
        if cards.len() < MIN_DECK_SIZE {
            return Err(DeckError::TooSmall { count: cards.len() });
        }
        let mut seen = HashSet::with_capacity(cards.len());
        for card in &cards {
            if !seen.insert(card.serial_number) {
                return Err(DeckError::DuplicateSerial(card.serial_number.0));
            }
        }
        Ok(Self { cards })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DeckError> {
        let cards: Vec<Card> = serde_json::from_str(raw)?;
        Self::new(cards)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DeckError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// The bundled 22-card Major Arcana.
    pub fn builtin() -> Result<Self, DeckError> {
        Self::from_json_str(MAJOR_ARCANA_JSON)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Picks uniformly among the cards whose id is not in `drawn`.
    pub fn draw_excluding<R: Rng + ?Sized>(
        &self,
        drawn: &HashSet<CardId>,
        rng: &mut R,
    ) -> Option<&Card> {
        let candidates: Vec<&Card> = self
            .cards
            .iter()
            .filter(|card| !drawn.contains(&card.serial_number))
            .collect();
        candidates.choose(rng).copied()
    }
}

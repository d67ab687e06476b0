use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);
    };
}

id_newtype!(CardId);

/// A card definition from the static deck. Orientation is not part of the
/// definition; it is assigned when the card is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub serial_number: CardId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Upright => "upright",
            Orientation::Reversed => "reversed",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Past,
    Present,
    Future,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Past, Position::Present, Position::Future];

    /// Position for the card at `index` in draw order.
    pub fn from_draw_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Position::Past => 0,
            Position::Present => 1,
            Position::Future => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Position::Past => "Past",
            Position::Present => "Present",
            Position::Future => "Future",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Past => "The Past",
            Position::Present => "The Present",
            Position::Future => "The Future",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub card: Card,
    pub orientation: Orientation,
    pub position: Position,
}

impl DrawnCard {
    pub fn id(&self) -> CardId {
        self.card.serial_number
    }

    pub fn name(&self) -> &str {
        &self.card.name
    }

    pub fn first_keyword(&self) -> Option<&str> {
        self.card.keywords.first().map(String::as_str)
    }
}

/// Three drawn cards in Past, Present, Future order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    past: DrawnCard,
    present: DrawnCard,
    future: DrawnCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a spread needs exactly 3 cards in draw order, got {count}")]
pub struct SpreadError {
    pub count: usize,
}

impl Spread {
    pub fn past(&self) -> &DrawnCard {
        &self.past
    }

    pub fn present(&self) -> &DrawnCard {
        &self.present
    }

    pub fn future(&self) -> &DrawnCard {
        &self.future
    }

    pub fn get(&self, position: Position) -> &DrawnCard {
        match position {
            Position::Past => &self.past,
            Position::Present => &self.present,
            Position::Future => &self.future,
        }
    }

    pub fn cards(&self) -> [&DrawnCard; 3] {
        [&self.past, &self.present, &self.future]
    }
}

impl TryFrom<Vec<DrawnCard>> for Spread {
    type Error = SpreadError;

    fn try_from(cards: Vec<DrawnCard>) -> Result<Self, Self::Error> {
        let count = cards.len();
        let in_order = cards
            .iter()
            .enumerate()
            .all(|(index, card)| card.position.index() == index);
        let Ok([past, present, future]) = <[DrawnCard; 3]>::try_from(cards) else {
            return Err(SpreadError { count });
        };
        if !in_order {
            return Err(SpreadError { count });
        }
        Ok(Self {
            past,
            present,
            future,
        })
    }
}

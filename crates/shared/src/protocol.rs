use std::{fmt, marker::PhantomData};

use serde::{
    de::{value::MapAccessDeserializer, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::domain::{DrawnCard, Orientation, Position, Spread};

pub const INTERPRET_ROUTE: &str = "/interpret";

/// Deserializes `T` from a JSON object only. Derived struct impls also accept
/// a sequence of field values, which would let a flat card list through.
struct Keyed<T>(T);

struct KeyedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by field name")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_map(KeyedVisitor(PhantomData))
            .map(Keyed)
    }
}

/// One card as sent to the interpretation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Keyed<CardFields>")]
pub struct CardPayload {
    pub name: String,
    pub orientation: Orientation,
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CardFields {
    name: String,
    orientation: Orientation,
    keywords: Vec<String>,
}

impl From<Keyed<CardFields>> for CardPayload {
    fn from(Keyed(fields): Keyed<CardFields>) -> Self {
        Self {
            name: fields.name,
            orientation: fields.orientation,
            keywords: fields.keywords,
        }
    }
}

impl From<&DrawnCard> for CardPayload {
    fn from(card: &DrawnCard) -> Self {
        Self {
            name: card.card.name.clone(),
            orientation: card.orientation,
            keywords: card.card.keywords.clone(),
        }
    }
}

/// Cards keyed by position. This keyed object is the only accepted shape;
/// a flat list of cards does not deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Keyed<SpreadFields>")]
pub struct SpreadPayload {
    pub past: CardPayload,
    pub present: CardPayload,
    pub future: CardPayload,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SpreadFields {
    past: CardPayload,
    present: CardPayload,
    future: CardPayload,
}

impl From<Keyed<SpreadFields>> for SpreadPayload {
    fn from(Keyed(fields): Keyed<SpreadFields>) -> Self {
        Self {
            past: fields.past,
            present: fields.present,
            future: fields.future,
        }
    }
}

impl SpreadPayload {
    pub fn get(&self, position: Position) -> &CardPayload {
        match position {
            Position::Past => &self.past,
            Position::Present => &self.present,
            Position::Future => &self.future,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &CardPayload)> {
        Position::ALL
            .into_iter()
            .map(move |position| (position, self.get(position)))
    }
}

impl From<&Spread> for SpreadPayload {
    fn from(spread: &Spread) -> Self {
        Self {
            past: spread.past().into(),
            present: spread.present().into(),
            future: spread.future().into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Keyed<RequestFields>")]
pub struct InterpretationRequest {
    pub question: String,
    pub cards: SpreadPayload,
}

#[derive(Deserialize)]
struct RequestFields {
    question: String,
    cards: SpreadPayload,
}

impl From<Keyed<RequestFields>> for InterpretationRequest {
    fn from(Keyed(fields): Keyed<RequestFields>) -> Self {
        Self {
            question: fields.question,
            cards: fields.cards,
        }
    }
}

impl InterpretationRequest {
    pub fn new(question: impl Into<String>, spread: &Spread) -> Self {
        Self {
            question: question.into(),
            cards: spread.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationResponse {
    pub interpretation: String,
}

//! The reading state machine.
//!
//! Each [`ReadingState`] variant carries only the data that is valid in that
//! phase, so a session cannot hold an interpretation before all three cards
//! are revealed, or reveal cards before the spread is complete.

use std::{collections::HashSet, fmt, mem};

use rand::Rng;
use shared::{
    domain::{CardId, DrawnCard, Orientation, Position, Spread, SpreadError},
    protocol::InterpretationRequest,
};
use tracing::debug;

use crate::{
    deck::Deck,
    error::{SessionError, ValidationError, MAX_QUESTION_CHARS, MIN_QUESTION_CHARS},
    fallback::fallback_interpretation,
    gate::{check_code, GateOutcome},
    share::format_share_text,
};

pub const SPREAD_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Locked,
    Idle,
    Shuffling,
    Drawing,
    Revealing,
    Interpreting,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Locked => "locked",
            Phase::Idle => "idle",
            Phase::Shuffling => "shuffling",
            Phase::Drawing => "drawing",
            Phase::Revealing => "revealing",
            Phase::Interpreting => "interpreting",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Where the final narrative came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretationSource {
    Service,
    Fallback { reason: String },
}

impl InterpretationSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, InterpretationSource::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingState {
    Locked {
        entry: String,
    },
    Idle,
    Shuffling {
        question: String,
    },
    Drawing {
        question: String,
        cards: Vec<DrawnCard>,
        drawn: HashSet<CardId>,
    },
    Revealing {
        question: String,
        spread: Spread,
        revealed: usize,
    },
    Interpreting {
        question: String,
        spread: Spread,
    },
    Complete {
        question: String,
        spread: Spread,
        interpretation: String,
        source: InterpretationSource,
    },
}

impl ReadingState {
    pub fn phase(&self) -> Phase {
        match self {
            ReadingState::Locked { .. } => Phase::Locked,
            ReadingState::Idle => Phase::Idle,
            ReadingState::Shuffling { .. } => Phase::Shuffling,
            ReadingState::Drawing { .. } => Phase::Drawing,
            ReadingState::Revealing { .. } => Phase::Revealing,
            ReadingState::Interpreting { .. } => Phase::Interpreting,
            ReadingState::Complete { .. } => Phase::Complete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn(DrawnCard),
    /// The third card; the session is now revealing.
    SpreadComplete(DrawnCard),
}

impl DrawOutcome {
    pub fn card(&self) -> &DrawnCard {
        match self {
            DrawOutcome::Drawn(card) | DrawOutcome::SpreadComplete(card) => card,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Out-of-order index, or nothing left to reveal.
    Ignored,
    Revealed { index: usize },
    /// The third card was revealed; send this request exactly once.
    Interpret(InterpretationRequest),
}

/// Trims and length-checks a question.
pub fn validate_question(text: &str) -> Result<String, ValidationError> {
    let question = text.trim();
    let len = question.chars().count();
    if len < MIN_QUESTION_CHARS {
        return Err(ValidationError::QuestionTooShort);
    }
    if len > MAX_QUESTION_CHARS {
        return Err(ValidationError::QuestionTooLong);
    }
    Ok(question.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: ReadingState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ReadingState::Locked {
                entry: String::new(),
            },
        }
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn code_entry(&self) -> Option<&str> {
        match &self.state {
            ReadingState::Locked { entry } => Some(entry),
            _ => None,
        }
    }

    pub fn question(&self) -> Option<&str> {
        match &self.state {
            ReadingState::Shuffling { question }
            | ReadingState::Drawing { question, .. }
            | ReadingState::Revealing { question, .. }
            | ReadingState::Interpreting { question, .. }
            | ReadingState::Complete { question, .. } => Some(question),
            ReadingState::Locked { .. } | ReadingState::Idle => None,
        }
    }

    /// Drawn cards in draw order (Past, Present, Future).
    pub fn drawn_cards(&self) -> Vec<&DrawnCard> {
        match &self.state {
            ReadingState::Drawing { cards, .. } => cards.iter().collect(),
            ReadingState::Revealing { spread, .. }
            | ReadingState::Interpreting { spread, .. }
            | ReadingState::Complete { spread, .. } => spread.cards().to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn spread(&self) -> Option<&Spread> {
        match &self.state {
            ReadingState::Revealing { spread, .. }
            | ReadingState::Interpreting { spread, .. }
            | ReadingState::Complete { spread, .. } => Some(spread),
            _ => None,
        }
    }

    pub fn reveal_count(&self) -> usize {
        match &self.state {
            ReadingState::Revealing { revealed, .. } => *revealed,
            ReadingState::Interpreting { .. } | ReadingState::Complete { .. } => SPREAD_SIZE,
            _ => 0,
        }
    }

    pub fn interpretation(&self) -> Option<&str> {
        match &self.state {
            ReadingState::Complete { interpretation, .. } => Some(interpretation),
            _ => None,
        }
    }

    pub fn interpretation_source(&self) -> Option<&InterpretationSource> {
        match &self.state {
            ReadingState::Complete { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Replaces the current seal-code entry, as an OTP field does on change.
    pub fn enter_code(&mut self, code: &str) -> Result<GateOutcome, SessionError> {
        let ReadingState::Locked { entry } = &mut self.state else {
            return Err(self.invalid("enter a seal code"));
        };

        let outcome = check_code(code)?;
        match outcome {
            GateOutcome::Incomplete => *entry = code.to_string(),
            GateOutcome::Rejected => {
                debug!("seal code rejected");
                entry.clear();
            }
            GateOutcome::Unlocked => self.state = ReadingState::Idle,
        }
        Ok(outcome)
    }

    pub fn submit_question(&mut self, text: &str) -> Result<(), SessionError> {
        if !matches!(self.state, ReadingState::Idle) {
            return Err(self.invalid("ask a question"));
        }
        let question = validate_question(text)?;
        self.state = ReadingState::Shuffling { question };
        Ok(())
    }

    /// Ends the shuffle. The draw starts from an empty hand.
    pub fn finish_shuffle(&mut self) -> Result<(), SessionError> {
        let ReadingState::Shuffling { question } = &mut self.state else {
            return Err(self.invalid("finish shuffling"));
        };
        let question = mem::take(question);
        self.state = ReadingState::Drawing {
            question,
            cards: Vec::with_capacity(SPREAD_SIZE),
            drawn: HashSet::with_capacity(SPREAD_SIZE),
        };
        Ok(())
    }

    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        deck: &Deck,
        rng: &mut R,
    ) -> Result<DrawOutcome, SessionError> {
        let phase = self.phase();
        let ReadingState::Drawing {
            question,
            cards,
            drawn,
        } = &mut self.state
        else {
            return Err(SessionError::InvalidTransition {
                action: "draw a card",
                phase,
            });
        };

        let position = Position::from_draw_index(cards.len()).ok_or(
            SessionError::InvalidTransition {
                action: "draw a card",
                phase,
            },
        )?;
        let card = deck
            .draw_excluding(drawn, rng)
            .ok_or(SessionError::DeckExhausted)?
            .clone();
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Upright
        } else {
            Orientation::Reversed
        };

        drawn.insert(card.serial_number);
        let drawn_card = DrawnCard {
            card,
            orientation,
            position,
        };
        cards.push(drawn_card.clone());

        if cards.len() < SPREAD_SIZE {
            return Ok(DrawOutcome::Drawn(drawn_card));
        }

        let spread = Spread::try_from(mem::take(cards)).map_err(spread_invariant)?;
        let question = mem::take(question);
        self.state = ReadingState::Revealing {
            question,
            spread,
            revealed: 0,
        };
        Ok(DrawOutcome::SpreadComplete(drawn_card))
    }

    /// Reveals the card at `index`. Only the next unrevealed card can be
    /// turned; anything else is ignored.
    pub fn reveal(&mut self, index: usize) -> Result<RevealOutcome, SessionError> {
        match &mut self.state {
            ReadingState::Revealing {
                question,
                spread,
                revealed,
            } => {
                if *revealed >= SPREAD_SIZE || index != *revealed {
                    return Ok(RevealOutcome::Ignored);
                }
                *revealed += 1;
                if *revealed < SPREAD_SIZE {
                    return Ok(RevealOutcome::Revealed { index });
                }

                let request = InterpretationRequest::new(question.clone(), spread);
                let spread = spread.clone();
                let question = mem::take(question);
                self.state = ReadingState::Interpreting { question, spread };
                Ok(RevealOutcome::Interpret(request))
            }
            ReadingState::Interpreting { .. } | ReadingState::Complete { .. } => {
                Ok(RevealOutcome::Ignored)
            }
            _ => Err(self.invalid("reveal a card")),
        }
    }

    pub fn reveal_next(&mut self) -> Result<RevealOutcome, SessionError> {
        let next = self.reveal_count();
        self.reveal(next)
    }

    /// Stores the interpretation. A failed or blank result is replaced by the
    /// fallback narrative, so this always ends in `Complete`.
    pub fn complete_interpretation<E: fmt::Display>(
        &mut self,
        result: Result<String, E>,
    ) -> Result<InterpretationSource, SessionError> {
        let ReadingState::Interpreting { question, spread } = &mut self.state else {
            return Err(self.invalid("complete an interpretation"));
        };

        let (interpretation, source) = match result {
            Ok(text) if !text.trim().is_empty() => (text, InterpretationSource::Service),
            Ok(_) => (
                fallback_interpretation(spread),
                InterpretationSource::Fallback {
                    reason: "interpretation service returned no text".to_string(),
                },
            ),
            Err(err) => (
                fallback_interpretation(spread),
                InterpretationSource::Fallback {
                    reason: err.to_string(),
                },
            ),
        };

        let question = mem::take(question);
        let spread = spread.clone();
        self.state = ReadingState::Complete {
            question,
            spread,
            interpretation,
            source: source.clone(),
        };
        Ok(source)
    }

    /// Back to the question prompt. The gate stays open.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, ReadingState::Complete { .. }) {
            return Err(self.invalid("start a new reading"));
        }
        self.state = ReadingState::Idle;
        Ok(())
    }

    pub fn share_text(&self) -> Result<String, SessionError> {
        match &self.state {
            ReadingState::Complete {
                question,
                spread,
                interpretation,
                ..
            } => Ok(format_share_text(question, spread, interpretation)),
            _ => Err(self.invalid("share a reading")),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase(),
        }
    }
}

fn spread_invariant(err: SpreadError) -> SessionError {
    SessionError::IncompleteSpread(err.count)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

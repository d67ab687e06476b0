use thiserror::Error;

use crate::session::Phase;

pub const MIN_QUESTION_CHARS: usize = 3;
pub const MAX_QUESTION_CHARS: usize = 100;
pub const ACCESS_CODE_LEN: usize = 6;

/// Local input problems. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please ask a question to the cards.")]
    QuestionTooShort,
    #[error("Your question is too long.")]
    QuestionTooLong,
    #[error("The seal code accepts digits only.")]
    CodeNotNumeric,
    #[error("The seal code has 6 digits.")]
    CodeTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("the deck has no undrawn cards left")]
    DeckExhausted,
    #[error("a spread needs 3 cards, got {0}")]
    IncompleteSpread(usize),
}

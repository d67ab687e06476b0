//! Client side of a three-card reading: the session state machine, the deck it
//! draws from, and the call to the interpretation service.

pub mod controller;
pub mod deck;
pub mod error;
pub mod fallback;
pub mod gate;
pub mod interpreter;
pub mod session;
pub mod share;

pub use controller::{ReadingController, RevealResult, DEFAULT_SHUFFLE_DELAY};
pub use deck::{Deck, DeckError};
pub use error::{SessionError, ValidationError};
pub use gate::GateOutcome;
pub use interpreter::{HttpInterpreter, InterpretClientError, Interpreter};
pub use session::{InterpretationSource, Phase, Session};
pub use share::Clipboard;

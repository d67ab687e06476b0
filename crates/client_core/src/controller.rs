use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    deck::Deck,
    error::SessionError,
    gate::GateOutcome,
    interpreter::Interpreter,
    session::{DrawOutcome, InterpretationSource, RevealOutcome, Session},
    share::Clipboard,
};

pub const DEFAULT_SHUFFLE_DELAY: Duration = Duration::from_secs(2);

/// Result of a reveal as seen by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealResult {
    Ignored,
    Revealed { index: usize },
    /// The last card was revealed and the reading is complete.
    Completed(InterpretationSource),
}

/// Drives one [`Session`] through a reading. All transitions take `&mut self`,
/// so two of them can never run at once.
pub struct ReadingController {
    session: Session,
    deck: Arc<Deck>,
    interpreter: Arc<dyn Interpreter>,
    rng: StdRng,
    shuffle_delay: Duration,
}

impl ReadingController {
    pub fn new(deck: Arc<Deck>, interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            session: Session::new(),
            deck,
            interpreter,
            rng: StdRng::from_entropy(),
            shuffle_delay: DEFAULT_SHUFFLE_DELAY,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_shuffle_delay(mut self, delay: Duration) -> Self {
        self.shuffle_delay = delay;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn unlock(&mut self, code: &str) -> Result<GateOutcome, SessionError> {
        let outcome = self.session.enter_code(code)?;
        if outcome == GateOutcome::Unlocked {
            info!("reading unlocked");
        }
        Ok(outcome)
    }

    /// Submits the question, then waits out the shuffle before drawing opens.
    pub async fn ask(&mut self, question: &str) -> Result<(), SessionError> {
        self.session.submit_question(question)?;
        debug!(delay_ms = self.shuffle_delay.as_millis() as u64, "shuffling");
        tokio::time::sleep(self.shuffle_delay).await;
        self.session.finish_shuffle()
    }

    pub fn draw(&mut self) -> Result<DrawOutcome, SessionError> {
        let outcome = self.session.draw(&self.deck, &mut self.rng)?;
        debug!(
            position = %outcome.card().position,
            card = outcome.card().id().0,
            "card drawn"
        );
        Ok(outcome)
    }

    pub async fn reveal(&mut self, index: usize) -> Result<RevealResult, SessionError> {
        match self.session.reveal(index)? {
            RevealOutcome::Ignored => Ok(RevealResult::Ignored),
            RevealOutcome::Revealed { index } => Ok(RevealResult::Revealed { index }),
            RevealOutcome::Interpret(request) => {
                let result = self.interpreter.interpret(&request).await;
                if let Err(error) = &result {
                    warn!(%error, "interpretation unavailable; using fallback reading");
                }
                let source = self.session.complete_interpretation(result)?;
                info!(fallback = source.is_fallback(), "reading complete");
                Ok(RevealResult::Completed(source))
            }
        }
    }

    pub async fn reveal_next(&mut self) -> Result<RevealResult, SessionError> {
        let next = self.session.reveal_count();
        self.reveal(next).await
    }

    pub fn share(&self, clipboard: &mut dyn Clipboard) -> anyhow::Result<String> {
        let text = self.session.share_text()?;
        clipboard.set_text(text.clone())?;
        Ok(text)
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.session.reset()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

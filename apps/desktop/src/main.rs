use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    Clipboard, Deck, GateOutcome, HttpInterpreter, InterpretationSource, Phase, ReadingController,
    RevealResult,
};
use shared::domain::DrawnCard;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Three-card tarot reading in the terminal")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    server_url: String,
    /// JSON deck file; the bundled Major Arcana is used when omitted.
    #[arg(long)]
    deck: Option<String>,
    #[arg(long, default_value_t = 2000)]
    shuffle_ms: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

/// Quiet by default; info lines would interleave with the prompts.
const DEFAULT_LOG_FILTER: &str = "warn";

struct SystemClipboard(arboard::Clipboard);

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: String) -> Result<()> {
        self.0.set_text(text)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
    let args = Args::parse();

    let deck = match &args.deck {
        Some(path) => Deck::load(path)?,
        None => Deck::builtin()?,
    };
    let interpreter =
        HttpInterpreter::new(&args.server_url, Duration::from_secs(args.timeout_secs))?;
    let mut controller = ReadingController::new(Arc::new(deck), Arc::new(interpreter))
        .with_shuffle_delay(Duration::from_millis(args.shuffle_ms));
    if let Some(seed) = args.seed {
        controller = controller.with_seed(seed);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Lumina Tarot");
    while step(&mut controller, &mut lines).await? {}
    Ok(())
}

/// Runs one prompt for the current phase. Returns false once the user quits.
async fn step(
    controller: &mut ReadingController,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    match controller.session().phase() {
        Phase::Locked => {
            let Some(code) = prompt(lines, "Enter the six-digit seal code:").await? else {
                return Ok(false);
            };
            match controller.unlock(&code) {
                Ok(GateOutcome::Unlocked) => println!("The seal breaks. The cards await."),
                Ok(GateOutcome::Rejected) => println!("The seal holds. Try again."),
                Ok(GateOutcome::Incomplete) => println!("The seal needs six digits."),
                Err(err) => println!("{err}"),
            }
        }
        Phase::Idle => {
            let Some(question) = prompt(lines, "What do you ask the cards?").await? else {
                return Ok(false);
            };
            if is_quit(&question) {
                return Ok(false);
            }
            println!("Shuffling...");
            if let Err(err) = controller.ask(&question).await {
                println!("{err}");
            }
        }
        Phase::Drawing => {
            let drawn = controller.session().drawn_cards().len();
            let label = format!("Press Enter to draw card {} of 3.", drawn + 1);
            if prompt(lines, &label).await?.is_none() {
                return Ok(false);
            }
            let outcome = controller.draw()?;
            println!("A card is placed face down for {}.", outcome.card().position.label());
        }
        Phase::Revealing => {
            let next = controller.session().reveal_count();
            let label = format!("Press Enter to reveal card {} of 3.", next + 1);
            if prompt(lines, &label).await?.is_none() {
                return Ok(false);
            }
            if next + 1 == 3 {
                println!("Reading the cards...");
            }
            match controller.reveal(next).await? {
                RevealResult::Ignored => {}
                RevealResult::Revealed { index } => print_revealed(controller, index),
                RevealResult::Completed(source) => {
                    print_revealed(controller, next);
                    if cfg!(debug_assertions) {
                        if let InterpretationSource::Fallback { reason } = &source {
                            println!("[dev] interpretation service unavailable: {reason}");
                        }
                    }
                    if let Some(text) = controller.session().interpretation() {
                        println!("\n{text}\n");
                    }
                }
            }
        }
        Phase::Complete => {
            let Some(choice) = prompt(lines, "Type 'share', 'new' or 'quit':").await? else {
                return Ok(false);
            };
            match choice.as_str() {
                "share" => share(controller),
                "new" => controller.reset()?,
                _ if is_quit(&choice) => return Ok(false),
                _ => println!("Unknown choice."),
            }
        }
        // ask and reveal await these phases to completion.
        Phase::Shuffling | Phase::Interpreting => {}
    }
    Ok(true)
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    println!("{label}");
    let line = lines.next_line().await.context("failed to read stdin")?;
    Ok(line.map(|line| line.trim().to_string()))
}

fn is_quit(input: &str) -> bool {
    matches!(input, "quit" | "exit")
}

fn print_revealed(controller: &ReadingController, index: usize) {
    let cards = controller.session().drawn_cards();
    if let Some(card) = cards.get(index) {
        println!("{}", describe(card));
    }
}

fn describe(card: &DrawnCard) -> String {
    format!(
        "{}: {} ({}) - {}",
        card.position.label(),
        card.name(),
        card.orientation,
        card.card.keywords.join(", ")
    )
}

fn share(controller: &ReadingController) {
    let copied = arboard::Clipboard::new()
        .map_err(anyhow::Error::from)
        .and_then(|clipboard| controller.share(&mut SystemClipboard(clipboard)));
    match copied {
        Ok(_) => println!("Reading copied to the clipboard."),
        Err(err) => {
            warn!(error = %err, "clipboard unavailable");
            match controller.session().share_text() {
                Ok(text) => println!("\n{text}\n"),
                Err(err) => println!("{err}"),
            }
        }
    }
}

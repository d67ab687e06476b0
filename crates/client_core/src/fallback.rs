use shared::domain::{DrawnCard, Position, Spread};

fn theme(card: &DrawnCard) -> &str {
    card.first_keyword().unwrap_or(match card.position {
        Position::Past => "experience",
        Position::Present => "change",
        Position::Future => "possibility",
    })
}

/// Narrative used when the interpretation service cannot be reached. Depends
/// only on the three cards' names and first keywords.
pub fn fallback_interpretation(spread: &Spread) -> String {
    let past = spread.past();
    let present = spread.present();
    let future = spread.future();
    format!(
        "The cards suggest a journey of transformation. \
         {} in your past indicates a foundation of {}. \
         Currently, {} brings energy of {}, asking you to focus on the present moment. \
         Looking ahead, {} reveals a potential for {} if you stay true to your path. \
         Trust your intuition as you move forward.",
        past.name(),
        theme(past),
        present.name(),
        theme(present),
        future.name(),
        theme(future),
    )
}

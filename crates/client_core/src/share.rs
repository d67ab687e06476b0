use shared::domain::Spread;

pub const SHARE_TITLE: &str = "Lumina Tarot Reading";

/// Write-only access to the system clipboard.
pub trait Clipboard {
    fn set_text(&mut self, text: String) -> anyhow::Result<()>;
}

pub fn format_share_text(question: &str, spread: &Spread, interpretation: &str) -> String {
    format!(
        "{SHARE_TITLE}\n\n\
         Question: {question}\n\n\
         Past: {}\n\
         Present: {}\n\
         Future: {}\n\n\
         Interpretation:\n{interpretation}\n\n\
         Discover your fate at Lumina Tarot.",
        spread.past().name(),
        spread.present().name(),
        spread.future().name(),
    )
}

//! `bashpilot history`: saved conversations.

use bashpilot_agent::ConversationStore;
use bashpilot_config::AppConfig;

const PREVIEW_CHARS: usize = 60;

fn store() -> Result<ConversationStore, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(ConversationStore::new(config.history_dir()))
}

/// Single-line preview of a first message.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut short: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        short.push('…');
    }
    short
}

pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    let store = store()?;
    let conversations = store.list()?;

    if conversations.is_empty() {
        println!("No saved conversations in {}", store.dir().display());
        return Ok(());
    }

    println!("💬 Conversations (newest first)");
    println!("─────────────────────────────────────────────────────");
    for c in &conversations {
        let date = c.timestamp.get(..19).unwrap_or(&c.timestamp);
        println!("  {}  {}  {}", c.id, date, preview(&c.preview));
    }
    println!();
    println!("  Resume one with: bashpilot chat --conversation <id>");
    Ok(())
}

pub fn show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let records = store()?.load(id)?;
    if records.is_empty() {
        return Err(format!("No conversation with id {id}").into());
    }

    for record in &records {
        println!("[{}]", record.role);
        println!("{}", record.content);
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_previews_are_untouched() {
        assert_eq!(preview("list files"), "list files");
    }

    #[test]
    fn long_or_multiline_previews_are_cut() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("first\nsecond"), "first…");
    }
}

//! Outreach message templates.

/// Used when the commenter's name is unknown.
const FALLBACK_FIRST_NAME: &str = "there";

/// Invitation notes longer than this are rejected by the platform.
const CONNECTION_NOTE_MAX_CHARS: usize = 300;

/// First word of the display name, or "there".
pub fn first_name(name: Option<&str>) -> String {
    name.and_then(|n| n.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FIRST_NAME.to_string())
}

pub fn direct_message(first_name: &str, trigger_word: &str) -> String {
    format!(
        "Hey {}! Thanks for commenting \"{}\" on my post. Here it is, as promised.",
        first_name, trigger_word
    )
}

pub fn email_acknowledgement(first_name: &str) -> String {
    format!("Thanks {}! Check your inbox, it's on its way.", first_name)
}

pub fn connection_reply(first_name: &str) -> String {
    format!(
        "Hey {}! Just sent you a connection request so I can DM it over.",
        first_name
    )
}

pub fn connection_note(first_name: &str, trigger_word: &str) -> String {
    let note = format!(
        "Hi {}, saw your \"{}\" comment. Connecting so I can send it over.",
        first_name, trigger_word
    );
    truncate_chars(note, CONNECTION_NOTE_MAX_CHARS)
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_falls_back() {
        assert_eq!(first_name(Some("Ada Lovelace")), "Ada");
        assert_eq!(first_name(Some("   ")), "there");
        assert_eq!(first_name(None), "there");
    }

    #[test]
    fn direct_message_mentions_trigger() {
        assert_eq!(
            direct_message("Ada", "guide"),
            "Hey Ada! Thanks for commenting \"guide\" on my post. Here it is, as promised."
        );
    }

    #[test]
    fn connection_note_is_capped() {
        let long_trigger = "x".repeat(400);
        assert_eq!(
            connection_note("Ada", &long_trigger).chars().count(),
            CONNECTION_NOTE_MAX_CHARS
        );
    }
}

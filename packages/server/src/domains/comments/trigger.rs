//! Trigger word matching.
//!
//! A comment triggers outreach when it contains the job's trigger word,
//! ignoring case. Words of four or more characters also tolerate a single
//! typo ("intrested" for "interested"). There is no fallback trigger: the
//! caller always supplies the job's own word.

/// Shortest trigger word that gets typo tolerance. Below this a single edit
/// turns too many ordinary words into matches ("cat" / "bat").
const FUZZY_MIN_LEN: usize = 4;

/// Maximum edit distance accepted for a fuzzy token match.
const MAX_EDITS: usize = 1;

/// Returns the job's trigger word if `text` matches it, `None` otherwise.
pub fn match_trigger(text: &str, trigger_word: &str) -> Option<String> {
    let trigger = trigger_word.trim();
    if trigger.is_empty() {
        return None;
    }

    let needle = trigger.to_lowercase();
    let haystack = text.to_lowercase();

    if haystack.contains(&needle) {
        return Some(trigger.to_string());
    }

    let needle_len = needle.chars().count();
    if needle_len < FUZZY_MIN_LEN {
        return None;
    }

    haystack
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .any(|token| is_near_miss(token, &needle, needle_len))
        .then(|| trigger.to_string())
}

fn is_near_miss(token: &str, needle: &str, needle_len: usize) -> bool {
    let token_len = token.chars().count();
    if token_len.abs_diff(needle_len) > MAX_EDITS {
        return false;
    }
    strsim::levenshtein(token, needle) <= MAX_EDITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case() {
        assert_eq!(
            match_trigger("INTERESTED now!", "interested"),
            Some("interested".to_string())
        );
    }

    #[test]
    fn returns_the_jobs_trigger_word() {
        assert_eq!(
            match_trigger("send me the guide please", "Guide"),
            Some("Guide".to_string())
        );
    }

    #[test]
    fn single_deletion_matches() {
        assert_eq!(
            match_trigger("I am intrested", "interested"),
            Some("interested".to_string())
        );
    }

    #[test]
    fn single_substitution_matches() {
        assert_eq!(
            match_trigger("Intarested!", "interested"),
            Some("interested".to_string())
        );
    }

    #[test]
    fn single_insertion_matches() {
        assert_eq!(
            match_trigger("playbookk please", "playbook"),
            Some("playbook".to_string())
        );
    }

    #[test]
    fn punctuation_is_trimmed_before_fuzzy_compare() {
        assert_eq!(
            match_trigger("(intrested)...", "interested"),
            Some("interested".to_string())
        );
    }

    #[test]
    fn two_edits_do_not_match() {
        assert_eq!(match_trigger("I am intrestd", "interested"), None);
    }

    #[test]
    fn length_gap_over_one_does_not_match() {
        assert_eq!(match_trigger("inter", "interested"), None);
    }

    #[test]
    fn short_triggers_are_exact_only() {
        assert_eq!(match_trigger("cat", "bat"), None);
        assert_eq!(match_trigger("gide", "ai"), None);
        assert_eq!(match_trigger("AI please", "ai"), Some("ai".to_string()));
    }

    #[test]
    fn blank_trigger_never_matches() {
        assert_eq!(match_trigger("anything at all", ""), None);
        assert_eq!(match_trigger("anything at all", "   "), None);
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert_eq!(match_trigger("Great post, thanks!", "interested"), None);
    }
}

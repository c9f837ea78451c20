use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{BaseEmailExtractor, EmailConfidence, EmailExtraction};

lazy_static! {
    // Email pattern - RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"
    ).unwrap();

    // "ada [at] example [dot] org" and friends
    static ref OBFUSCATED_EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b([A-Z0-9._%+-]+)\s*[\[\(]\s*at\s*[\]\)]\s*([A-Z0-9-]+(?:\s*(?:[\[\(]\s*dot\s*[\]\)]|\.)\s*[A-Z0-9-]+)+)"
    ).unwrap();

    static ref DOT_REGEX: Regex = Regex::new(r"(?i)\s*(?:[\[\(]\s*dot\s*[\]\)]|\.)\s*").unwrap();
}

/// Domains people paste as examples rather than as their own address.
const PLACEHOLDER_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "domain.com",
    "email.com",
];

/// Pattern-based email extraction from comment text.
///
/// - one well-formed address: high confidence
/// - several distinct addresses: medium, first one wins
/// - obfuscated or placeholder address: low
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexEmailExtractor;

impl RegexEmailExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> EmailExtraction {
        let mut found: Vec<String> = Vec::new();
        for m in EMAIL_REGEX.find_iter(text) {
            let email = m.as_str().to_lowercase();
            if !found.contains(&email) {
                found.push(email);
            }
        }

        if let Some(first) = found.first() {
            let confidence = if is_placeholder(first) {
                EmailConfidence::Low
            } else if found.len() == 1 {
                EmailConfidence::High
            } else {
                EmailConfidence::Medium
            };
            return EmailExtraction {
                email: Some(first.clone()),
                confidence,
            };
        }

        if let Some(caps) = OBFUSCATED_EMAIL_REGEX.captures(text) {
            let local = caps[1].to_lowercase();
            let domain = DOT_REGEX.replace_all(&caps[2], ".").to_lowercase();
            return EmailExtraction {
                email: Some(format!("{}@{}", local, domain)),
                confidence: EmailConfidence::Low,
            };
        }

        EmailExtraction::none()
    }
}

fn is_placeholder(email: &str) -> bool {
    email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| PLACEHOLDER_DOMAINS.contains(&domain))
}

#[async_trait]
impl BaseEmailExtractor for RegexEmailExtractor {
    async fn extract_email(&self, text: &str) -> Result<EmailExtraction> {
        Ok(self.extract(text))
    }
}

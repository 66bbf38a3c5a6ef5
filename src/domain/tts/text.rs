use crate::domain::user::{Caller, SubscriptionTier};
use html2text::from_read;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"));
static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Clean text by removing HTML tags and URLs and normalizing whitespace
pub fn clean_text(text: &str) -> String {
    let plain_text = if text.contains('<') {
        from_read(text.as_bytes(), usize::MAX)
    } else {
        text.to_string()
    };

    let without_urls = URL_PATTERN.replace_all(&plain_text, "");
    let normalized = WHITESPACE_PATTERN.replace_all(&without_urls, " ");

    normalized.trim().to_string()
}

/// Maximum characters per request for each kind of caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimits {
    pub guest: usize,
    pub free: usize,
    pub pro: usize,
    pub premium: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            guest: 500,
            free: 1000,
            pro: 2500,
            premium: 4000,
        }
    }
}

impl TextLimits {
    /// Admins are held to the premium limit
    pub fn limit_for(&self, caller: &Caller) -> usize {
        if caller.is_admin() {
            return self.premium;
        }
        if !caller.is_authenticated() {
            return self.guest;
        }
        match caller.tier {
            SubscriptionTier::Free => self.free,
            SubscriptionTier::Pro => self.pro,
            SubscriptionTier::Premium => self.premium,
        }
    }

    pub fn max(&self) -> usize {
        self.guest.max(self.free).max(self.pro).max(self.premium)
    }
}

/// Length as users perceive it: Unicode scalar values, not bytes
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

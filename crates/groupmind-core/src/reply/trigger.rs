//! Message heuristics: whether to attempt a reply, and whether to nudge the
//! model toward web search.

use groupmind_types::config::TriggerConfig;
use groupmind_types::message::InboundMessage;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Appended to the user turn when a search hint pattern matches.
pub const SEARCH_HINT: &str = "\n\n[Note: use web_search to verify current data]";

/// Compile case-insensitive patterns, dropping (and logging) invalid ones.
pub fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "ignoring invalid pattern");
                    None
                }
            }
        })
        .collect()
}

/// What to do with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Run the reply orchestrator.
    Reply,
    /// Persist the message and index it, but stay quiet.
    SaveOnly,
}

/// Mention / trigger-word gate for group conversations.
///
/// Private conversations always trigger. With `trigger_on_mention` off every
/// message triggers and the model decides via the skip marker.
pub struct TriggerPolicy {
    trigger_on_mention: bool,
    mention: Option<String>,
    trigger_words: Vec<Regex>,
}

impl TriggerPolicy {
    pub fn new(config: &TriggerConfig) -> Self {
        let username = config.bot_username.trim().trim_start_matches('@');
        Self {
            trigger_on_mention: config.trigger_on_mention,
            mention: (!username.is_empty()).then(|| format!("@{}", username.to_lowercase())),
            trigger_words: compile_patterns(&config.trigger_words),
        }
    }

    pub fn decide(&self, message: &InboundMessage) -> TriggerDecision {
        if message.is_private || !self.trigger_on_mention {
            return TriggerDecision::Reply;
        }
        if self.is_mentioned(&message.text) || self.trigger_words.iter().any(|re| re.is_match(&message.text)) {
            TriggerDecision::Reply
        } else {
            TriggerDecision::SaveOnly
        }
    }

    fn is_mentioned(&self, text: &str) -> bool {
        self.mention
            .as_ref()
            .is_some_and(|mention| text.to_lowercase().contains(mention))
    }
}

/// Detects messages asking about current events.
pub struct SearchHint {
    patterns: Vec<Regex>,
}

impl SearchHint {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: compile_patterns(patterns),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

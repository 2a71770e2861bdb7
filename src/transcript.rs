//! Conversation transcript management
//!
//! This module records the turns of a visitor conversation. The transcript is
//! append-only and feeds both the transcript sink and the human-handoff
//! summary.

use crate::preferences::TravelerPreferences;
use crate::types::{SessionId, TurnId};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Number of trailing turns included in the handoff summary
const HANDOFF_TURN_WINDOW: usize = 10;

/// Maximum characters per summarized turn line
const HANDOFF_LINE_LIMIT: usize = 100;

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex literal"))
}

/// Who produced a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSender {
    /// The site visitor
    User,
    /// The automated assistant
    Bot,
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique identifier for the turn
    pub id: TurnId,
    /// Who spoke
    pub sender: TurnSender,
    /// The message text, exactly as shown to the visitor
    pub message: String,
    /// Timestamp when the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new visitor turn
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            sender: TurnSender::User,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new bot turn
    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            sender: TurnSender::Bot,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of every turn in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Session this transcript belongs to
    pub session_id: SessionId,
    /// Turns in the order they were spoken
    turns: Vec<Turn>,
    /// Timestamp when the session was opened
    pub started_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a new empty transcript
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            turns: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Append a turn. There is no removal or edit API.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in conversation order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The last `n` turns in conversation order
    pub fn last_n(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Number of turns recorded so far
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Discard all turns and restart the session clock. Used by Start Over.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.started_at = Utc::now();
    }

    /// Render the human-readable summary handed to a live agent.
    ///
    /// Includes the session start time, any captured traveler preferences,
    /// and the last ten turns with markup stripped and each line truncated
    /// to 100 characters.
    pub fn handoff_summary(&self, preferences: &TravelerPreferences) -> String {
        let mut summary = format!(
            "🗓️ Session: {}\n\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        if !preferences.is_empty() {
            summary.push_str("👤 TRAVELER PREFERENCES:\n");
            if let Some(budget) = preferences.budget {
                summary.push_str(&format!("💰 Budget: {}\n", budget.label()));
            }
            if let Some(duration) = preferences.duration {
                summary.push_str(&format!("📅 Duration: {}\n", duration.label()));
            }
            if !preferences.interests.is_empty() {
                let interests: Vec<&str> = preferences
                    .interests
                    .iter()
                    .map(|i| i.label())
                    .collect();
                summary.push_str(&format!("🎯 Interests: {}\n", interests.join(", ")));
            }
            if let Some(experience) = preferences.experience {
                summary.push_str(&format!("🔍 Experience: {}\n", experience.label()));
            }
            summary.push('\n');
        }

        summary.push_str("💬 KEY CONVERSATION POINTS:\n");
        for turn in self.last_n(HANDOFF_TURN_WINDOW) {
            let sender = match turn.sender {
                TurnSender::User => "Traveler",
                TurnSender::Bot => "AI Assistant",
            };
            let clean = clean_for_handoff(&turn.message);
            let truncated = clean.chars().count() > HANDOFF_LINE_LIMIT;
            let line: String = clean.chars().take(HANDOFF_LINE_LIMIT).collect();
            summary.push_str(&format!(
                "[{}] {}: {}{}\n",
                turn.timestamp.format("%H:%M:%S"),
                sender,
                line,
                if truncated { "..." } else { "" }
            ));
        }

        summary
    }
}

/// Strip markup and collapse newlines. Truncation happens at the call site
/// so the pre-truncation length decides whether an ellipsis is warranted.
fn clean_for_handoff(message: &str) -> String {
    let stripped = markup_pattern().replace_all(message, "");
    stripped.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{BudgetBand, Interest};

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("Hello");
        assert_eq!(turn.sender, TurnSender::User);
        assert_eq!(turn.message, "Hello");

        let reply = Turn::bot("Karibu!");
        assert_eq!(reply.sender, TurnSender::Bot);
    }

    #[test]
    fn test_transcript_push_preserves_order() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::user("First"));
        transcript.push(Turn::bot("Second"));
        transcript.push(Turn::user("Third"));

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns()[0].message, "First");
        assert_eq!(transcript.turns()[1].message, "Second");
        assert_eq!(transcript.turns()[2].message, "Third");
    }

    #[test]
    fn test_transcript_last_n() {
        let mut transcript = Transcript::new(SessionId::new());
        for i in 0..15 {
            transcript.push(Turn::user(format!("Turn {}", i)));
        }

        let last = transcript.last_n(10);
        assert_eq!(last.len(), 10);
        assert_eq!(last[0].message, "Turn 5");
        assert_eq!(last[9].message, "Turn 14");
    }

    #[test]
    fn test_transcript_last_n_fewer_than_n() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::user("Only one"));

        assert_eq!(transcript.last_n(10).len(), 1);
    }

    #[test]
    fn test_transcript_reset() {
        let session_id = SessionId::new();
        let mut transcript = Transcript::new(session_id);
        transcript.push(Turn::user("Hello"));

        transcript.reset();

        assert!(transcript.is_empty());
        assert_eq!(transcript.session_id, session_id);
    }

    #[test]
    fn test_handoff_summary_includes_preferences() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::user("Hello"));
        transcript.push(Turn::bot("Karibu! How can I help?"));

        let mut prefs = TravelerPreferences::new();
        prefs.set_budget(BudgetBand::Range700To1000);
        prefs.add_interest(Interest::GorillaTrekking);

        let summary = transcript.handoff_summary(&prefs);
        assert!(summary.contains("TRAVELER PREFERENCES"));
        assert!(summary.contains("$700-$1000"));
        assert!(summary.contains("Gorilla Trekking"));
        assert!(summary.contains("Traveler: Hello"));
        assert!(summary.contains("AI Assistant: Karibu! How can I help?"));
    }

    #[test]
    fn test_handoff_summary_skips_empty_preferences() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::user("Hi"));

        let summary = transcript.handoff_summary(&TravelerPreferences::new());
        assert!(!summary.contains("TRAVELER PREFERENCES"));
        assert!(summary.contains("KEY CONVERSATION POINTS"));
    }

    #[test]
    fn test_handoff_summary_strips_markup_and_truncates() {
        let mut transcript = Transcript::new(SessionId::new());
        let long_message = format!("<b>Bold</b> {}", "x".repeat(200));
        transcript.push(Turn::bot(long_message));

        let summary = transcript.handoff_summary(&TravelerPreferences::new());
        assert!(!summary.contains("<b>"));
        assert!(summary.contains("Bold"));
        assert!(summary.contains("..."));
    }

    #[test]
    fn test_handoff_summary_ellipsis_only_past_the_limit() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::bot("y".repeat(100)));
        transcript.push(Turn::bot("z".repeat(101)));

        let summary = transcript.handoff_summary(&TravelerPreferences::new());
        let exact: String = "y".repeat(100);
        let over: String = "z".repeat(100);
        assert!(summary.contains(&format!("{}\n", exact)));
        assert!(summary.contains(&format!("{}...", over)));
    }

    #[test]
    fn test_handoff_summary_limits_to_last_ten_turns() {
        let mut transcript = Transcript::new(SessionId::new());
        for i in 0..12 {
            transcript.push(Turn::user(format!("message number {}", i)));
        }

        let summary = transcript.handoff_summary(&TravelerPreferences::new());
        assert!(!summary.contains("message number 0"));
        assert!(!summary.contains("message number 1\n"));
        assert!(summary.contains("message number 2"));
        assert!(summary.contains("message number 11"));
    }

    #[test]
    fn test_transcript_serialization() {
        let mut transcript = Transcript::new(SessionId::new());
        transcript.push(Turn::user("Hello"));
        transcript.push(Turn::bot("Karibu!"));

        let json = serde_json::to_string(&transcript).unwrap();
        let deserialized: Transcript = serde_json::from_str(&json).unwrap();

        assert_eq!(transcript, deserialized);
    }
}

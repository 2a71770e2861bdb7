//! Keyword dispatcher for free-text questions
//!
//! Free text that reaches the engine outside a structured question is routed
//! to an informational topic by keyword. Rules are declared in a fixed order
//! and compiled into one case-insensitive Aho-Corasick automaton; when a
//! message hits keywords from several rules, the rule declared first wins.
//! That first-match-wins order is the documented contract, not an accident.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Informational topic a free-text message resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    ExchangeRates,
    Population,
    Leaders,
    Capitals,
    Geography,
    SafariTiming,
    Visa,
    Wildlife,
    Languages,
    Climate,
    /// No keyword hit; the generic pitch
    Fallback,
}

/// A topic plus the keyword literals that trigger it
#[derive(Debug, Clone)]
pub struct DispatchRule {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
}

/// The rule table in priority order
const RULES: &[DispatchRule] = &[
    DispatchRule {
        topic: Topic::ExchangeRates,
        keywords: &["exchange", "rate", "dollar", "usd"],
    },
    DispatchRule {
        topic: Topic::Population,
        keywords: &["population", "people", "demographics"],
    },
    DispatchRule {
        topic: Topic::Leaders,
        keywords: &["president", "leader", "government"],
    },
    DispatchRule {
        topic: Topic::Capitals,
        keywords: &["capital", "city", "urban"],
    },
    DispatchRule {
        topic: Topic::Geography,
        keywords: &["location", "where is", "geography"],
    },
    DispatchRule {
        topic: Topic::SafariTiming,
        keywords: &["best time", "when to visit", "safari season"],
    },
    DispatchRule {
        topic: Topic::Visa,
        keywords: &["visa", "passport", "entry requirements"],
    },
    DispatchRule {
        topic: Topic::Wildlife,
        keywords: &["wildlife", "animals", "big five"],
    },
    DispatchRule {
        topic: Topic::Languages,
        keywords: &["language", "speak", "languages"],
    },
    DispatchRule {
        topic: Topic::Climate,
        keywords: &["climate", "weather", "temperature"],
    },
];

/// Keyword dispatcher compiled from the fixed rule table
pub struct KeywordDispatcher {
    automaton: AhoCorasick,
    /// Pattern index to rule index
    pattern_to_rule: Vec<usize>,
}

impl KeywordDispatcher {
    /// Compile the built-in rule table
    pub fn new() -> Self {
        let mut patterns: Vec<&'static str> = Vec::new();
        let mut pattern_to_rule = Vec::new();

        for (rule_idx, rule) in RULES.iter().enumerate() {
            for keyword in rule.keywords {
                patterns.push(keyword);
                pattern_to_rule.push(rule_idx);
            }
        }

        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .expect("Failed to build Aho-Corasick automaton");

        Self {
            automaton,
            pattern_to_rule,
        }
    }

    /// Resolve a message to a topic.
    ///
    /// Scans the whole message and picks the hit rule with the lowest
    /// declaration index; with no hits at all this returns `Topic::Fallback`.
    pub fn dispatch(&self, message: &str) -> Topic {
        let mut best_rule: Option<usize> = None;

        for mat in self.automaton.find_iter(message) {
            let rule_idx = self.pattern_to_rule[mat.pattern().as_usize()];
            trace!(pattern = mat.pattern().as_usize(), rule = rule_idx, "keyword hit");
            best_rule = Some(match best_rule {
                Some(current) => current.min(rule_idx),
                None => rule_idx,
            });
        }

        let topic = best_rule.map(|idx| RULES[idx].topic).unwrap_or(Topic::Fallback);
        debug!(?topic, "dispatched free text");
        topic
    }
}

impl Default for KeywordDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

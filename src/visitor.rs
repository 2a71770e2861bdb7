//! Visitor identity and the pre-chat gate
//!
//! Conversation processing is locked until the visitor has supplied a name,
//! a plausible email address, and explicit consent. This module holds the
//! validated visitor record, the gate validation itself, and the profile
//! cache the record is persisted to between page visits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".+@.+\..+").expect("valid regex literal"))
}

/// Check a candidate email against the gate's pattern
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// A visitor who has passed the pre-chat gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    /// Display name as entered, trimmed
    pub name: String,
    /// Email address matching the gate pattern
    pub email: String,
    /// Whether the visitor ticked the consent box
    pub consent: bool,
    /// When the gate was passed
    pub captured_at: DateTime<Utc>,
}

impl Visitor {
    /// Single source of truth for the gating invariant
    pub fn gate_satisfied(&self) -> bool {
        !self.name.trim().is_empty() && is_valid_email(&self.email) && self.consent
    }

    /// First word of the visitor's name, used in greetings
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }

    /// Split the name into (first, rest) for lead payloads
    pub fn split_name(&self) -> (String, String) {
        let mut parts = self.name.split_whitespace();
        let first = parts.next().unwrap_or("AI").to_string();
        let rest: Vec<&str> = parts.collect();
        let last = if rest.is_empty() {
            "Visitor".to_string()
        } else {
            rest.join(" ")
        };
        (first, last)
    }
}

/// Outcome of validating a gate submission
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// All fields valid; the visitor record is ready to store
    Accepted(Visitor),
    /// One or more fields failed; the captions of the missing fields
    Rejected(Vec<String>),
}

/// Validate a pre-chat gate submission.
///
/// Name must be non-empty after trimming, email must match the gate
/// pattern, and consent must be ticked. All failures are reported at once.
pub fn validate_gate(name: &str, email: &str, consent: bool) -> GateOutcome {
    let mut missing = Vec::new();

    if name.trim().is_empty() {
        missing.push("your name".to_string());
    }
    if !is_valid_email(email) {
        missing.push("a valid email address".to_string());
    }
    if !consent {
        missing.push("consent to be contacted".to_string());
    }

    if missing.is_empty() {
        GateOutcome::Accepted(Visitor {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            consent,
            captured_at: Utc::now(),
        })
    } else {
        GateOutcome::Rejected(missing)
    }
}

/// Local cache for the visitor profile, so returning visitors skip the gate
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Load the cached visitor, if any
    async fn load(&self) -> Option<Visitor>;

    /// Store a visitor, replacing any previous record
    async fn store(&self, visitor: Visitor);

    /// Remove the cached record. This is the "forget me" operation.
    async fn clear(&self);
}

/// In-memory profile cache, the default backend
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileCache {
    inner: Arc<RwLock<Option<Visitor>>>,
}

impl InMemoryProfileCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileCache for InMemoryProfileCache {
    async fn load(&self) -> Option<Visitor> {
        self.inner.read().await.clone()
    }

    async fn store(&self, visitor: Visitor) {
        *self.inner.write().await = Some(visitor);
    }

    async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

//! # Karibu - Gated Safari Lead-Capture Chat Engine
//!
//! Karibu is a Rust library implementing a pre-chat-gated, state-machine
//! driven conversation engine for East Africa safari lead capture. It walks
//! a visitor from a consent gate through budget, duration, interest, and
//! experience questions, scores a package catalog against the captured
//! preferences, and hands qualified leads to HTTP sinks and human agents.
//!
//! ## Features
//!
//! - 🚪 **Pre-Chat Gate**: Name, email, and consent required before any turn is recorded
//! - 🗺️ **Guided Flow**: Explicit finite-state machine over budget, duration, interests, and experience
//! - 🎯 **Package Scoring**: Weighted, deterministic matching of preferences against a catalog
//! - 💬 **Keyword Dispatch**: Ordered first-match-wins topic routing over free text
//! - 🌍 **Live Data**: Exchange rates, country facts, and leaders with cached HTTP providers and static fallbacks
//! - 📤 **Lead & Transcript Sinks**: HTTP delivery with a fire-and-forget best-effort flush policy
//! - 🤝 **Human Handoff**: WhatsApp and phone deep links carrying a conversation summary
//!
//! ## Quick Start
//!
//! ```no_run
//! use karibu::{ConversationEngine, EngineInput, HttpLeadSink, HttpTranscriptSink};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let lead_sink = HttpLeadSink::new("https://example.com/api/submit-booking.php")?;
//! let transcript_sink =
//!     HttpTranscriptSink::new("https://example.com/api/chat-transcript.php", "secret")?;
//!
//! let mut engine = ConversationEngine::builder()
//!     .with_lead_sink(Arc::new(lead_sink))
//!     .with_transcript_sink(Arc::new(transcript_sink))
//!     .build()?;
//!
//! // Gate first, then converse
//! let reply = engine
//!     .handle(EngineInput::GateSubmit {
//!         name: "Jane Doe".to_string(),
//!         email: "jane@example.com".to_string(),
//!         consent: true,
//!     })
//!     .await?;
//!
//! for message in &reply.messages {
//!     println!("Bot: {}", message);
//! }
//!
//! let reply = engine
//!     .handle(EngineInput::QuickAction("Under $700".to_string()))
//!     .await?;
//! println!("Next question: {:?}", reply.messages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Mounting a Widget
//!
//! ```no_run
//! use karibu::{ConversationEngine, WidgetHost};
//! # use karibu::{HttpLeadSink, HttpTranscriptSink};
//! # use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let engine = ConversationEngine::builder()
//! #     .with_lead_sink(Arc::new(HttpLeadSink::new("https://example.com/lead")?))
//! #     .with_transcript_sink(Arc::new(HttpTranscriptSink::new("https://example.com/t", "k")?))
//! #     .build()?;
//! let host = WidgetHost::new();
//! let widget = host.mount(engine).await;
//!
//! // A second mount hands back the same widget
//! let mut nudges = widget.nudges().await.ok_or("nudges already taken")?;
//! tokio::spawn(async move {
//!     while let Some(nudge) = nudges.recv().await {
//!         println!("Bot (unsolicited): {:?}", nudge.messages);
//!     }
//! });
//!
//! host.unmount().await;
//! # Ok(())
//! # }
//! ```

// Core id types
pub mod types;

// Error types
pub mod error;

// Conversation transcript and handoff summary rendering
pub mod transcript;

// Traveler preference vocabulary
pub mod preferences;

// Gate validation and the visitor profile cache
pub mod visitor;

// Package catalog
pub mod catalog;

// Preference scoring and recommendations
pub mod scoring;

// Keyword topic dispatcher
pub mod dispatch;

// Live data providers (exchange rates, country facts, leaders)
pub mod livedata;

// Lead and transcript delivery
pub mod sink;

// WhatsApp and phone handoff links
pub mod handoff;

// The conversation state machine
pub mod engine;

// Widget mounting and the inactivity monitor
pub mod widget;

pub use catalog::{CapabilityTag, Catalog, Package};
pub use dispatch::{KeywordDispatcher, Topic};
pub use engine::{
    ConversationEngine, ConversationState, EngineBuilder, EngineInput, EngineReply, HostMeta,
};
pub use error::{EngineError, LiveDataError, LiveDataResult, Result, SinkError, SinkResult};
pub use handoff::{HandoffConfig, HandoffLink};
pub use livedata::{
    CachedLiveData, Country, CountryFacts, ExchangeRates, HttpLiveData, HttpLiveDataConfig,
    LeaderFacts, LiveData, StaticLiveData,
};
pub use preferences::{
    BudgetBand, DurationBand, ExperienceLevel, GroupSize, Interest, TravelWindow,
    TravelerPreferences,
};
pub use scoring::{recommend, ScoredPackage};
pub use sink::{
    BestEffort, FlushReason, HttpLeadSink, HttpTranscriptSink, LeadPayload, LeadSink,
    TranscriptMeta, TranscriptPayload, TranscriptSink,
};
pub use transcript::{Transcript, Turn, TurnSender};
pub use types::{LeadId, SessionId, TurnId};
pub use visitor::{
    is_valid_email, validate_gate, GateOutcome, InMemoryProfileCache, ProfileCache, Visitor,
};
pub use widget::{ChatWidget, WidgetHost};

//! The conversation engine
//!
//! A single-owner, event-driven finite-state dialogue manager. The host
//! feeds it `EngineInput` events one at a time and renders the returned
//! `EngineReply`; all state transitions happen inside `handle`, so no two
//! transitions can interleave. The pre-chat gate is enforced here: until the
//! visitor record satisfies the gating invariant, nothing is appended to the
//! transcript and no state changes.

use crate::catalog::Catalog;
use crate::dispatch::{KeywordDispatcher, Topic};
use crate::error::{EngineError, Result};
use crate::handoff::{HandoffConfig, HandoffLink};
use crate::livedata::{Country, CountryFacts, ExchangeRates, LeaderFacts, LiveData, StaticLiveData};
use crate::preferences::{
    BudgetBand, DurationBand, ExperienceLevel, GroupSize, Interest, TravelWindow,
    TravelerPreferences,
};
use crate::scoring::recommend;
use crate::sink::{
    BestEffort, FlushReason, LeadPayload, LeadSink, TranscriptMeta, TranscriptPayload,
    TranscriptSink,
};
use crate::transcript::{Transcript, Turn};
use crate::types::{LeadId, SessionId};
use crate::visitor::{is_valid_email, validate_gate, GateOutcome, InMemoryProfileCache,
    ProfileCache, Visitor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default inactivity timeout before the handoff nudge
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

const DESTINATION_CHOICES: [&str; 5] = ["Uganda", "Kenya", "Tanzania", "Rwanda", "Multi-Country"];

const FINAL_ACTIONS: [&str; 5] = [
    "Start Guided Booking",
    "Book Consultation Call",
    "More Details",
    "Start Over",
    "Contact WhatsApp",
];

const INACTIVITY_ACTIONS: [&str; 4] = [
    "Talk to Human",
    "Continue with AI",
    "Get Phone Number",
    "Send Email Summary",
];

const EMAIL_FALLBACK_ACTIONS: [&str; 2] = ["Contact WhatsApp", "Get Phone Number"];

const CONTINUE_ACTION: &str = "Continue →";

/// Which question the conversation is currently on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    Budget,
    Duration,
    Interests,
    Experience,
    Final,
    CollectDestination,
    CollectGroup,
    CollectDate,
    AwaitingEmailForLead,
}

/// One event from the host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    /// The chat window was opened
    Open,
    /// The pre-chat gate form was submitted
    GateSubmit {
        name: String,
        email: String,
        consent: bool,
    },
    /// The visitor asked to be forgotten
    ForgetMe,
    /// A quick-action button was tapped; the value is its caption
    QuickAction(String),
    /// Free text was typed into the input
    FreeText(String),
}

/// What the host should render after an event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineReply {
    /// Bot messages in display order
    pub messages: Vec<String>,
    /// Quick-action captions to offer, in display order
    pub quick_actions: Vec<String>,
    /// The gate form must be shown before anything else happens
    pub gate_required: bool,
    /// Deep links for human contact, when a handoff was offered
    pub handoff: Option<HandoffLink>,
}

impl EngineReply {
    fn gate() -> Self {
        Self {
            gate_required: true,
            ..Self::default()
        }
    }

    fn say(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    fn offer<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    fn with_handoff(mut self, link: HandoffLink) -> Self {
        self.handoff = Some(link);
        self
    }
}

/// Host-environment details attached to transcript flushes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostMeta {
    /// URL of the page hosting the widget
    pub page: String,
    pub user_agent: String,
    /// Visitor timezone offset in minutes from UTC
    pub timezone_offset: i32,
}

/// The gated lead-capture conversation engine
pub struct ConversationEngine {
    session_id: SessionId,
    state: ConversationState,
    visitor: Option<Visitor>,
    preferences: TravelerPreferences,
    transcript: Transcript,
    catalog: Catalog,
    dispatcher: KeywordDispatcher,
    live_data: Arc<dyn LiveData>,
    lead_sink: Arc<dyn LeadSink>,
    transcript_flusher: BestEffort<dyn TranscriptSink>,
    profile_cache: Arc<dyn ProfileCache>,
    handoff: HandoffConfig,
    host_meta: HostMeta,
    inactivity_timeout: Duration,
    last_activity: DateTime<Utc>,
    inactivity_notified: bool,
    widget_open: bool,
}

impl ConversationEngine {
    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// This conversation's session id
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current state
    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Preferences captured so far
    pub fn preferences(&self) -> &TravelerPreferences {
        &self.preferences
    }

    /// The transcript so far
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The gated visitor record, if captured
    pub fn visitor(&self) -> Option<&Visitor> {
        self.visitor.as_ref()
    }

    /// Process one host event and produce the reply to render.
    ///
    /// While the gate is unsatisfied every conversational input short-circuits
    /// to a `gate_required` reply without touching the transcript or state.
    pub async fn handle(&mut self, input: EngineInput) -> Result<EngineReply> {
        match input {
            EngineInput::Open => self.handle_open().await,
            EngineInput::GateSubmit {
                name,
                email,
                consent,
            } => self.handle_gate_submit(&name, &email, consent).await,
            EngineInput::ForgetMe => self.handle_forget_me().await,
            EngineInput::QuickAction(action) => {
                if !self.unlocked().await {
                    return Ok(EngineReply::gate());
                }
                self.note_visitor_activity();
                self.transcript.push(Turn::user(&action));
                let reply = self.handle_quick_action(&action).await?;
                Ok(self.record_reply(reply))
            }
            EngineInput::FreeText(text) => {
                // When the engine is waiting for a lead email the visitor
                // record may not satisfy the gate yet; this one turn is the
                // email capture itself
                let capturing_email = self.state == ConversationState::AwaitingEmailForLead;
                if !capturing_email && !self.unlocked().await {
                    return Ok(EngineReply::gate());
                }
                self.note_visitor_activity();
                self.transcript.push(Turn::user(&text));
                let reply = self.handle_free_text(&text).await?;
                Ok(self.record_reply(reply))
            }
        }
    }

    /// Emit the inactivity nudge if the quiet period has been crossed.
    ///
    /// Fires at most once per crossing: the notified flag is set here and
    /// only cleared when the visitor acts again. Never changes state.
    pub fn check_inactivity(&mut self, now: DateTime<Utc>) -> Option<EngineReply> {
        if !self.widget_open || self.inactivity_notified {
            return None;
        }
        let timeout = chrono::Duration::from_std(self.inactivity_timeout).ok()?;
        if now.signed_duration_since(self.last_activity) <= timeout {
            return None;
        }

        info!(session_id = %self.session_id, "inactivity timeout crossed");
        self.inactivity_notified = true;
        self.flush_transcript(FlushReason::InactivityTimeout);

        let reply = EngineReply::default()
            .say(
                "👋 I noticed you've been quiet for a while. Would you like me to connect \
                 you with a human safari expert, or is there anything else I can help you with?",
            )
            .offer(INACTIVITY_ACTIONS);
        Some(self.record_reply(reply))
    }

    /// Fire one best-effort transcript flush with the given reason
    pub fn flush_transcript(&self, reason: FlushReason) {
        let payload = TranscriptPayload {
            visitor: self.visitor.clone(),
            session_start: self.transcript.started_at,
            session_end: Utc::now(),
            history: self.transcript.turns().to_vec(),
            preferences: self.preferences.clone(),
            meta: TranscriptMeta {
                page: self.host_meta.page.clone(),
                user_agent: self.host_meta.user_agent.clone(),
                timezone_offset: self.host_meta.timezone_offset,
                reason,
            },
        };
        self.transcript_flusher.flush(payload);
    }

    async fn unlocked(&mut self) -> bool {
        if self.visitor.is_none() {
            self.visitor = self.profile_cache.load().await;
        }
        self.visitor
            .as_ref()
            .map(Visitor::gate_satisfied)
            .unwrap_or(false)
    }

    fn note_visitor_activity(&mut self) {
        self.last_activity = Utc::now();
        self.inactivity_notified = false;
    }

    /// Append the reply's messages as bot turns and bump the activity clock
    fn record_reply(&mut self, reply: EngineReply) -> EngineReply {
        for message in &reply.messages {
            self.transcript.push(Turn::bot(message));
        }
        if !reply.messages.is_empty() {
            self.last_activity = Utc::now();
        }
        reply
    }

    async fn handle_open(&mut self) -> Result<EngineReply> {
        self.widget_open = true;
        if !self.unlocked().await {
            return Ok(EngineReply::gate());
        }
        if self.state != ConversationState::Greeting {
            // Reopening mid-conversation; nothing new to say
            return Ok(EngineReply::default());
        }

        let reply = self.greeting_reply(None);
        Ok(self.record_reply(reply))
    }

    async fn handle_gate_submit(
        &mut self,
        name: &str,
        email: &str,
        consent: bool,
    ) -> Result<EngineReply> {
        if self.unlocked().await {
            // Already unlocked; resubmission has no effect
            debug!(session_id = %self.session_id, "gate resubmission ignored");
            return Ok(EngineReply::default());
        }

        match validate_gate(name, email, consent) {
            GateOutcome::Accepted(visitor) => {
                info!(session_id = %self.session_id, "gate passed");
                self.profile_cache.store(visitor.clone()).await;
                let first_name = visitor.first_name().to_string();
                self.visitor = Some(visitor);
                self.widget_open = true;

                if self.state == ConversationState::Greeting {
                    let reply = self.greeting_reply(Some(&first_name));
                    Ok(self.record_reply(reply))
                } else {
                    let reply = EngineReply::default()
                        .say(format!("👋 Welcome back, {}!", first_name));
                    Ok(self.record_reply(reply))
                }
            }
            GateOutcome::Rejected(missing) => {
                debug!(session_id = %self.session_id, ?missing, "gate submission rejected");
                let mut reply = EngineReply::gate();
                reply.messages.push(format!(
                    "Before we chat, I still need {}.",
                    missing.join(", ")
                ));
                Ok(reply)
            }
        }
    }

    async fn handle_forget_me(&mut self) -> Result<EngineReply> {
        info!(session_id = %self.session_id, "visitor asked to be forgotten");
        self.profile_cache.clear().await;
        self.visitor = None;
        let mut reply = EngineReply::gate();
        reply
            .messages
            .push("Your details have been removed from this device.".to_string());
        Ok(reply)
    }

    fn greeting_reply(&mut self, first_name: Option<&str>) -> EngineReply {
        let welcome = match first_name {
            Some(name) => format!(
                "👋 Karibu, {}! I'm your AI Safari Assistant with live data from global \
                 APIs. I'll help you find the perfect East Africa safari package!",
                name
            ),
            None => "👋 Hi! I'm your AI Safari Assistant with live data from global APIs. \
                     I'll help you find the perfect East Africa safari package!"
                .to_string(),
        };
        self.transition(ConversationState::Budget);
        EngineReply::default()
            .say(welcome)
            .say("Let's start with a quick question: What's your approximate budget per person?")
            .offer(BudgetBand::ALL.iter().map(|b| b.label()))
    }

    fn transition(&mut self, next: ConversationState) {
        debug!(session_id = %self.session_id, from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    async fn handle_quick_action(&mut self, action: &str) -> Result<EngineReply> {
        // Handoff and navigation actions work in any state
        match action {
            "Start Guided Booking" => return Ok(self.start_guided_booking()),
            "Start Over" => return Ok(self.start_over()),
            "Contact WhatsApp" | "Talk to Human" | "Book via WhatsApp" | "WhatsApp Now" => {
                return Ok(self.whatsapp_handoff())
            }
            "Get Phone Number" | "Direct Call Now" | "Call Now" => {
                return Ok(self.phone_handoff())
            }
            "Book Consultation Call" => return Ok(self.consultation_pitch()),
            "Continue with AI" => return Ok(self.exploration_prompt()),
            "More Details" => return Ok(self.detail_topics()),
            "Send Email Summary" => return Ok(self.email_summary()),
            _ => {}
        }

        match self.state {
            ConversationState::Budget => {
                if let Some(band) = BudgetBand::from_label(action) {
                    self.preferences.set_budget(band);
                    self.transition(ConversationState::Duration);
                    return Ok(EngineReply::default()
                        .say("Perfect! How many days do you have for your safari adventure?")
                        .offer(DurationBand::ALL.iter().map(|d| d.label())));
                }
            }
            ConversationState::Duration => {
                if let Some(band) = DurationBand::from_label(action) {
                    self.preferences.set_duration(band);
                    self.transition(ConversationState::Interests);
                    return Ok(EngineReply::default()
                        .say(
                            "Great! What interests you most in an African safari? \
                             (You can select multiple)",
                        )
                        .offer(Interest::ALL.iter().map(|i| i.label())));
                }
            }
            ConversationState::Interests => {
                if action == CONTINUE_ACTION && !self.preferences.interests.is_empty() {
                    return Ok(self.experience_question());
                }
                if let Some(interest) = Interest::from_label(action) {
                    self.preferences.add_interest(interest);
                    if self.preferences.interests.len() >= 2 {
                        return Ok(self.experience_question());
                    }
                    let mut actions: Vec<String> = Interest::ALL
                        .iter()
                        .take(5)
                        .map(|i| i.label().to_string())
                        .collect();
                    actions.push(CONTINUE_ACTION.to_string());
                    return Ok(EngineReply::default()
                        .say(
                            "Great choice! Feel free to select more interests, or click \
                             'Continue' to proceed.",
                        )
                        .offer(actions));
                }
            }
            ConversationState::Experience => {
                if let Some(level) = ExperienceLevel::from_label(action) {
                    self.preferences.set_experience(level);
                    return Ok(self.recommendations_reply());
                }
            }
            ConversationState::Final => {
                return Ok(EngineReply::default()
                    .say("I didn't understand that option. Would you like to try again?")
                    .offer(FINAL_ACTIONS));
            }
            ConversationState::CollectDestination => {
                if DESTINATION_CHOICES.contains(&action) {
                    self.preferences.set_destination(action);
                    self.transition(ConversationState::CollectGroup);
                    return Ok(EngineReply::default()
                        .say("How many travelers are in your party?")
                        .offer(GroupSize::ALL.iter().map(|g| g.label())));
                }
            }
            ConversationState::CollectGroup => {
                if let Some(size) = GroupSize::from_label(action) {
                    self.preferences.set_group_size(size);
                    self.transition(ConversationState::CollectDate);
                    return Ok(EngineReply::default()
                        .say("When do you plan to travel? You can pick a general window.")
                        .offer(TravelWindow::ALL.iter().map(|w| w.label())));
                }
            }
            ConversationState::CollectDate => {
                if let Some(window) = TravelWindow::from_label(action) {
                    self.preferences.set_travel_window(window);
                    return self.submit_guided_lead().await;
                }
            }
            ConversationState::Greeting | ConversationState::AwaitingEmailForLead => {}
        }

        // Unrecognized caption in a structured state: answer it like free
        // text, without a transition
        self.handle_free_text(action).await
    }

    fn experience_question(&mut self) -> EngineReply {
        self.transition(ConversationState::Experience);
        EngineReply::default()
            .say("Excellent choices! One final question: Is this your first African safari?")
            .offer(ExperienceLevel::ALL.iter().map(|l| l.label()))
    }

    fn recommendations_reply(&mut self) -> EngineReply {
        let recommendations = recommend(&self.catalog, &self.preferences);
        info!(
            session_id = %self.session_id,
            count = recommendations.len(),
            "generated recommendations"
        );

        let mut reply = EngineReply::default()
            .say("Perfect! Based on your preferences, I'm analyzing the best safari packages for you...")
            .say(format!(
                "🎯 I found {} perfect safari packages for you:",
                recommendations.len()
            ));

        for scored in &recommendations {
            let pkg = scored.package;
            reply = reply.say(format!(
                "{} — From ${}\n📍 {} • {} days\n🌟 Highlights: {}\n🎯 {}% match for your preferences\n{}",
                pkg.name,
                pkg.price,
                pkg.country,
                pkg.duration_days,
                pkg.highlights.join(", "),
                scored.match_percentage(),
                pkg.detail_url
            ));
        }

        self.transition(ConversationState::Final);
        reply
            .say(
                "Would you like more details about any of these packages, start a guided \
                 booking, or book a FREE consultation call?",
            )
            .offer(FINAL_ACTIONS)
    }

    fn start_guided_booking(&mut self) -> EngineReply {
        self.transition(ConversationState::CollectDestination);
        EngineReply::default()
            .say("🧭 Great! Let's capture a few details to create your booking lead.")
            .say("Which destination are you most interested in?")
            .offer(DESTINATION_CHOICES)
    }

    fn start_over(&mut self) -> EngineReply {
        info!(session_id = %self.session_id, "conversation reset");
        self.preferences.reset();
        self.transcript.reset();
        self.transition(ConversationState::Budget);
        EngineReply::default()
            .say(
                "🔄 Let's start fresh! I'm your AI Safari Assistant ready to help you \
                 find the perfect East African adventure.",
            )
            .say("What's your approximate budget per person for the safari?")
            .offer(BudgetBand::ALL.iter().map(|b| b.label()))
    }

    fn whatsapp_handoff(&self) -> EngineReply {
        let summary = self.transcript.handoff_summary(&self.preferences);
        EngineReply::default()
            .say(
                "💬 Connecting you with our safari experts on WhatsApp! Your conversation \
                 summary goes with you so you won't repeat yourself.",
            )
            .with_handoff(self.handoff.link(&summary))
    }

    fn phone_handoff(&self) -> EngineReply {
        let summary = self.transcript.handoff_summary(&self.preferences);
        EngineReply::default()
            .say(format!(
                "📞 You can also call us directly for immediate assistance!\n\n\
                 📱 Call Our Safari Experts: {}\n\
                 Available: Mon-Sun, 8AM-10PM (East Africa Time)\n\n\
                 💡 Tip: Mention you spoke with the AI assistant for faster service!",
                self.handoff.phone_number
            ))
            .with_handoff(self.handoff.link(&summary))
    }

    fn consultation_pitch(&self) -> EngineReply {
        EngineReply::default()
            .say("📞 Perfect! Let me help you book a FREE consultation call with our safari experts.")
            .say(
                "🎯 During your call, we'll:\n• Review your preferences in detail\n\
                 • Suggest personalized safari packages\n• Answer all your questions\n\
                 • Provide booking assistance\n\nWould you prefer to book via WhatsApp \
                 or direct call?",
            )
            .offer(["Book via WhatsApp", "Direct Call Now", "Email My Details"])
    }

    fn exploration_prompt(&self) -> EngineReply {
        EngineReply::default()
            .say("🤖 Great! I'm here to help. What would you like to explore?")
            .offer([
                "Live Exchange Rates",
                "Country Information",
                "Safari Tips",
                "Wildlife Guide",
                "Best Travel Time",
                "Packing List",
            ])
    }

    fn detail_topics(&self) -> EngineReply {
        EngineReply::default()
            .say("📋 I'd be happy to provide more details! What specific information would you like?")
            .offer([
                "Package Inclusions",
                "Accommodation Details",
                "Transport Options",
                "Visa Requirements",
                "Health & Safety",
                "Weather & Climate",
            ])
    }

    fn email_summary(&self) -> EngineReply {
        EngineReply::default()
            .say("📧 I'm sending a summary of our conversation to our team right now!")
            .say(
                "✅ Our safari experts will review your preferences and follow up within \
                 24 hours.\n\n📞 For immediate assistance, you can also call or WhatsApp us!",
            )
            .offer(["Call Now", "WhatsApp Now", "Continue Browsing"])
    }

    async fn handle_free_text(&mut self, text: &str) -> Result<EngineReply> {
        if self.state == ConversationState::AwaitingEmailForLead {
            return self.handle_lead_email(text).await;
        }

        let topic = self.dispatcher.dispatch(text);
        Ok(self.render_topic(topic).await)
    }

    async fn handle_lead_email(&mut self, text: &str) -> Result<EngineReply> {
        let candidate = text.trim();
        if !is_valid_email(candidate) {
            return Ok(EngineReply::default()
                .say("That does not look like a valid email. Please try again, or tap Contact WhatsApp.")
                .offer(EMAIL_FALLBACK_ACTIONS));
        }

        let visitor = match self.visitor.take() {
            Some(mut v) => {
                v.email = candidate.to_string();
                v.consent = true;
                v
            }
            None => Visitor {
                name: "AI Visitor".to_string(),
                email: candidate.to_string(),
                consent: true,
                captured_at: Utc::now(),
            },
        };
        self.profile_cache.store(visitor.clone()).await;
        self.visitor = Some(visitor);

        let submission = self.submit_guided_lead().await?;
        let mut reply =
            EngineReply::default().say("👍 Thanks! Using that email to submit your lead.");
        reply.messages.extend(submission.messages);
        reply.quick_actions = submission.quick_actions;
        reply.handoff = submission.handoff;
        Ok(reply)
    }

    async fn submit_guided_lead(&mut self) -> Result<EngineReply> {
        let visitor = match &self.visitor {
            Some(v) if is_valid_email(&v.email) => v.clone(),
            _ => {
                self.transition(ConversationState::AwaitingEmailForLead);
                return Ok(EngineReply::default().say(
                    "📧 To submit your lead to our team, please provide your email. \
                     Type it below and press Enter.",
                ));
            }
        };

        let summary = self.transcript.handoff_summary(&self.preferences);
        let (first_name, last_name) = visitor.split_name();
        let payload = LeadPayload {
            first_name,
            last_name,
            email: visitor.email.clone(),
            phone: String::new(),
            country: self
                .preferences
                .destination
                .clone()
                .unwrap_or_else(|| "Uganda".to_string()),
            package_name: "AI Guided Booking Lead".to_string(),
            package_type: "ai-bot".to_string(),
            duration: self
                .preferences
                .duration
                .map(|d| d.label().to_string())
                .unwrap_or_default(),
            group_size: self
                .preferences
                .group_size
                .map(|g| g.label().to_string())
                .unwrap_or_default(),
            travel_date: String::new(),
            budget: self
                .preferences
                .budget
                .map(|b| b.label().to_string())
                .unwrap_or_default(),
            accommodation_level: String::new(),
            special_requirements: String::new(),
            message: summary.clone(),
        };

        let lead_id = LeadId::new();
        self.transition(ConversationState::Final);
        match self.lead_sink.submit(&payload).await {
            Ok(()) => {
                info!(session_id = %self.session_id, %lead_id, "lead submitted");
                self.flush_transcript(FlushReason::LeadSubmitted);
                Ok(EngineReply::default()
                    .say(
                        "✅ Lead submitted! Our team will reach out within 24 hours. \
                         Would you also like to chat on WhatsApp now?",
                    )
                    .offer(["Contact WhatsApp", "Book Consultation Call", "Continue with AI"])
                    .with_handoff(self.handoff.link(&summary)))
            }
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "lead submission failed");
                Ok(EngineReply::default()
                    .say(
                        "⚠️ Sorry, I could not submit your lead right now. You can still \
                         reach us on WhatsApp.",
                    )
                    .offer(EMAIL_FALLBACK_ACTIONS))
            }
        }
    }

    // Live-data outages must never fail the visitor's turn. Each lookup
    // falls back to the static tables, same as `CachedLiveData` does.
    async fn live_rates(&self) -> ExchangeRates {
        match self.live_data.exchange_rates().await {
            Ok(rates) => rates,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "exchange rate lookup failed, using static fallback");
                StaticLiveData.rates()
            }
        }
    }

    async fn live_country_facts(&self, country: Country) -> CountryFacts {
        match self.live_data.country_facts(country).await {
            Ok(facts) => facts,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, ?country, "country lookup failed, using static fallback");
                StaticLiveData.facts(country)
            }
        }
    }

    async fn live_leader_facts(&self, country: Country) -> LeaderFacts {
        match self.live_data.leader_facts(country).await {
            Ok(facts) => facts,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, ?country, "leader lookup failed, using static fallback");
                StaticLiveData.leader(country)
            }
        }
    }

    async fn render_topic(&self, topic: Topic) -> EngineReply {
        match topic {
            Topic::ExchangeRates => {
                let rates = self.live_rates().await;
                let mut lines = Vec::new();
                for country in Country::ALL {
                    if let Some(rate) = rates.rate(country.currency()) {
                        lines.push(format!(
                            "{} 1 USD = {} {}",
                            country.flag(),
                            format_rate(rate),
                            country.currency()
                        ));
                    }
                }
                EngineReply::default()
                    .say("💱 Current Exchange Rates (Live from API):")
                    .say(lines.join("\n"))
                    .say("📈 Exchange rates update every hour from live financial markets!")
                    .offer(["Currency Tips", "Payment Methods", "ATM Locations", "More Info"])
            }
            Topic::Population => {
                let mut lines = Vec::new();
                let mut total: u64 = 0;
                for country in Country::ALL {
                    let facts = self.live_country_facts(country).await;
                    total += facts.population;
                    lines.push(format!(
                        "{} {}: {} people",
                        country.flag(),
                        facts.name,
                        group_digits(facts.population)
                    ));
                }
                EngineReply::default()
                    .say("👥 East African Populations (Live from REST Countries API):")
                    .say(lines.join("\n"))
                    .say(format!("💡 Total East Africa: {}+ people", group_digits(total)))
                    .offer(["Youth Demographics", "Cultural Diversity", "Economic Growth"])
            }
            Topic::Leaders => {
                let mut lines = Vec::new();
                for country in Country::ALL {
                    let facts = self.live_leader_facts(country).await;
                    lines.push(format!(
                        "{} {}: {} ({} since {})",
                        country.flag(),
                        country.name(),
                        facts.name,
                        facts.title,
                        facts.since
                    ));
                }
                EngineReply::default()
                    .say("🏛️ East African Leaders (Live Data):")
                    .say(lines.join("\n"))
                    .say(
                        "All countries have stable governments focused on tourism \
                         development and wildlife conservation!",
                    )
                    .offer(["Political Stability", "Tourism Policies", "Safety Record"])
            }
            Topic::Capitals => {
                let mut lines = Vec::new();
                for country in Country::ALL {
                    let facts = self.live_country_facts(country).await;
                    lines.push(format!("{} {}: {}", country.flag(), facts.name, facts.capital));
                }
                EngineReply::default()
                    .say("🏙️ East African Capital Cities (Live from REST Countries API):")
                    .say(lines.join("\n"))
                    .say(
                        "✈️ Most safaris start from these cities - we arrange airport \
                         transfers and city tours!",
                    )
                    .offer(["City Tours", "Airport Transfers", "Urban Attractions"])
            }
            Topic::Geography => EngineReply::default()
                .say("🌍 East Africa is a fascinating region! Let me tell you about the safari destinations:")
                .say(
                    "🇺🇬 Uganda - Landlocked, famous for mountain gorillas\n\
                     🇰🇪 Kenya - Coastal, home to Masai Mara and Big Five\n\
                     🇹🇿 Tanzania - Largest, contains Serengeti and Kilimanjaro\n\
                     🇷🇼 Rwanda - Smallest, known as 'Land of a Thousand Hills'",
                )
                .say(
                    "✨ All these countries offer unique safari experiences with diverse \
                     landscapes, from savannas to rainforests!",
                )
                .offer(["Uganda Details", "Kenya Details", "Tanzania Details", "Rwanda Details"]),
            Topic::SafariTiming => EngineReply::default()
                .say("📅 Great question! Safari timing depends on what you want to see. Let me break it down:")
                .say(
                    "🌿 Dry Season (June-October):\n• Best wildlife viewing\n\
                     • Animals gather at water sources\n• Great Migration in Masai Mara (July-Oct)\n\n\
                     🌧️ Wet Season (Nov-May):\n• Lush landscapes & fewer crowds\n\
                     • Baby animals born (Jan-Mar)\n• Great for photography\n• Lower prices",
                )
                .say(
                    "🎡 Special Events: Wildebeest calving (Jan-Mar), Great Migration \
                     river crossings (July-Sep)!",
                )
                .offer(["Dry Season Safaris", "Wet Season Deals", "Migration Calendar", "Best for Photography"]),
            Topic::Visa => EngineReply::default()
                .say("📋 Visa requirements vary by your nationality. Here's what you need to know:")
                .say(
                    "🌍 East African Tourist Visa (Recommended):\n• Valid for Uganda, \
                     Kenya & Rwanda\n• 90 days, multiple entry\n• $100 USD\n\n\
                     🇺🇬 Uganda: eVisa or on arrival - $50\n🇰🇪 Kenya: eVisa or ETA - $50\n\
                     🇹🇿 Tanzania: eVisa - $50-100\n🇷🇼 Rwanda: eVisa or on arrival - $50",
                )
                .say(
                    "⚠️ Important: Requirements change by nationality. We provide detailed \
                     visa assistance for all bookings!",
                )
                .offer(["Visa Assistance", "Document Checklist", "Processing Times", "Multi-Country Visa"]),
            Topic::Wildlife => EngineReply::default()
                .say("🦁 East Africa is the world's premier wildlife destination! Here's what you can see:")
                .say(
                    "🐅 The Big Five:\n• African Lion\n• African Elephant\n• Cape Buffalo\n\
                     • Leopard\n• Black Rhinoceros\n\n🦍 Primates:\n• Mountain Gorillas\n\
                     • Chimpanzees\n• Golden Monkeys\n\n🦓 Great Migration: 2+ million \
                     wildebeest, zebras & gazelles!",
                )
                .say("📸 Plus hundreds of bird species, hippos, crocodiles, giraffes, and much more!")
                .offer(["Big Five Safari", "Gorilla Trekking", "Migration Safari", "Bird Watching"]),
            Topic::Languages => EngineReply::default()
                .say("🗣️ Language won't be a barrier on your East African safari! Here's what's spoken:")
                .say(
                    "🇺🇬 Uganda: English (Official), Luganda\n🇰🇪 Kenya: English & Swahili (Official)\n\
                     🇹🇿 Tanzania: Swahili (Official), English\n🇷🇼 Rwanda: English, French, Kinyarwanda",
                )
                .say(
                    "✨ Good news: All our guides speak fluent English, and tourism staff \
                     are English-speaking throughout the region!",
                )
                .offer(["Basic Phrases", "Cultural Tips", "Guide Languages", "Communication Tips"]),
            Topic::Climate => EngineReply::default()
                .say("🌡️ East Africa has a tropical climate with distinct seasons. Here's what to expect:")
                .say(
                    "🌡️ Temperatures:\n• Daytime: 20-28°C (68-82°F)\n• Nighttime: 10-18°C (50-64°F)\n\
                     • Higher altitudes cooler\n\n🌧️ Rainy Seasons:\n• Long rains: March-May\n\
                     • Short rains: November-December\n\n☀️ Dry Seasons:\n\
                     • June-October (Best for safari)\n• December-February",
                )
                .say("🎅 Tip: Pack layers! Mornings can be cool, afternoons warm, and evenings chilly.")
                .offer(["Packing List", "Seasonal Calendar", "Weather by Month", "Altitude Effects"]),
            Topic::Fallback => EngineReply::default()
                .say(
                    "🤔 That's a fascinating question! I'm powered by live APIs for \
                     real-time data about East Africa.",
                )
                .say(
                    "I can provide real-time data on exchange rates, country information, \
                     populations, and more. What would you like to explore?",
                )
                .offer([
                    "Live Exchange Rates",
                    "Country Info",
                    "Safari Planning",
                    "Current Leaders",
                    "Population Data",
                    "Travel Tips",
                ]),
        }
    }
}

fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        group_digits(rate as u64)
    } else {
        format!("{:.2}", rate)
    }
}

/// Insert thousands separators, e.g. 48600000 -> "48,600,000"
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Builder for `ConversationEngine`
pub struct EngineBuilder {
    lead_sink: Option<Arc<dyn LeadSink>>,
    transcript_sink: Option<Arc<dyn TranscriptSink>>,
    profile_cache: Option<Arc<dyn ProfileCache>>,
    catalog: Option<Catalog>,
    live_data: Option<Arc<dyn LiveData>>,
    handoff: HandoffConfig,
    host_meta: HostMeta,
    inactivity_timeout: Duration,
}

impl EngineBuilder {
    /// Create a builder with defaults for everything optional
    pub fn new() -> Self {
        Self {
            lead_sink: None,
            transcript_sink: None,
            profile_cache: None,
            catalog: None,
            live_data: None,
            handoff: HandoffConfig::default(),
            host_meta: HostMeta::default(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
        }
    }

    /// Set the lead sink. Required.
    pub fn with_lead_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.lead_sink = Some(sink);
        self
    }

    /// Set the transcript sink. Required.
    pub fn with_transcript_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.transcript_sink = Some(sink);
        self
    }

    /// Set the profile cache. Defaults to `InMemoryProfileCache`.
    pub fn with_profile_cache(mut self, cache: Arc<dyn ProfileCache>) -> Self {
        self.profile_cache = Some(cache);
        self
    }

    /// Set the catalog. Defaults to the built-in five packages.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the live data provider. Defaults to the static tables.
    pub fn with_live_data(mut self, live_data: Arc<dyn LiveData>) -> Self {
        self.live_data = Some(live_data);
        self
    }

    /// Set the handoff contact points
    pub fn with_handoff(mut self, handoff: HandoffConfig) -> Self {
        self.handoff = handoff;
        self
    }

    /// Attach host-environment metadata for transcript flushes
    pub fn with_host_meta(mut self, host_meta: HostMeta) -> Self {
        self.host_meta = host_meta;
        self
    }

    /// Set the inactivity timeout. Defaults to 60 seconds.
    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<ConversationEngine> {
        let lead_sink = self
            .lead_sink
            .ok_or_else(|| EngineError::Configuration("lead sink is required".to_string()))?;
        let transcript_sink = self.transcript_sink.ok_or_else(|| {
            EngineError::Configuration("transcript sink is required".to_string())
        })?;

        let session_id = SessionId::new();
        Ok(ConversationEngine {
            session_id,
            state: ConversationState::Greeting,
            visitor: None,
            preferences: TravelerPreferences::new(),
            transcript: Transcript::new(session_id),
            catalog: self.catalog.unwrap_or_default(),
            dispatcher: KeywordDispatcher::new(),
            live_data: self
                .live_data
                .unwrap_or_else(|| Arc::new(StaticLiveData)),
            lead_sink,
            transcript_flusher: BestEffort::new(transcript_sink),
            profile_cache: self
                .profile_cache
                .unwrap_or_else(|| Arc::new(InMemoryProfileCache::new())),
            handoff: self.handoff,
            host_meta: self.host_meta,
            inactivity_timeout: self.inactivity_timeout,
            last_activity: Utc::now(),
            inactivity_notified: false,
            widget_open: false,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Traveler preference capture
//!
//! This module defines the closed preference vocabularies offered as quick
//! actions during the conversation, and the `TravelerPreferences` record the
//! engine fills in as the visitor answers.

use serde::{Deserialize, Serialize};

/// Budget band per person, as offered in the budget question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetBand {
    Under700,
    Range700To1000,
    Range1000To1500,
    Over1500,
    NotSure,
}

impl BudgetBand {
    /// All bands in the order they are offered
    pub const ALL: [BudgetBand; 5] = [
        BudgetBand::Under700,
        BudgetBand::Range700To1000,
        BudgetBand::Range1000To1500,
        BudgetBand::Over1500,
        BudgetBand::NotSure,
    ];

    /// The exact quick-action caption for this band
    pub fn label(&self) -> &'static str {
        match self {
            BudgetBand::Under700 => "Under $700",
            BudgetBand::Range700To1000 => "$700-$1000",
            BudgetBand::Range1000To1500 => "$1000-$1500",
            BudgetBand::Over1500 => "Over $1500",
            BudgetBand::NotSure => "Not sure yet",
        }
    }

    /// Parse a quick-action caption back into a band
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.label() == label)
    }

    /// Inclusive price range in USD this band scores against.
    /// "Not sure yet" carries no range and never scores.
    pub fn price_range(&self) -> Option<(u32, u32)> {
        match self {
            BudgetBand::Under700 => Some((0, 700)),
            BudgetBand::Range700To1000 => Some((700, 1000)),
            BudgetBand::Range1000To1500 => Some((1000, 1500)),
            BudgetBand::Over1500 => Some((1500, 5000)),
            BudgetBand::NotSure => None,
        }
    }
}

/// How many days the visitor has for the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBand {
    Days3To4,
    Days5To7,
    Days8To10,
    TwoPlusWeeks,
    Flexible,
}

impl DurationBand {
    /// All bands in the order they are offered
    pub const ALL: [DurationBand; 5] = [
        DurationBand::Days3To4,
        DurationBand::Days5To7,
        DurationBand::Days8To10,
        DurationBand::TwoPlusWeeks,
        DurationBand::Flexible,
    ];

    /// The exact quick-action caption for this band
    pub fn label(&self) -> &'static str {
        match self {
            DurationBand::Days3To4 => "3-4 days",
            DurationBand::Days5To7 => "5-7 days",
            DurationBand::Days8To10 => "8-10 days",
            DurationBand::TwoPlusWeeks => "2+ weeks",
            DurationBand::Flexible => "Flexible",
        }
    }

    /// Parse a quick-action caption back into a band
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.label() == label)
    }

    /// Whether a package of `days` length fits this band.
    /// "Flexible" carries no predicate and never scores.
    pub fn matches(&self, days: u32) -> bool {
        match self {
            DurationBand::Days3To4 => days <= 4,
            DurationBand::Days5To7 => (5..=7).contains(&days),
            DurationBand::Days8To10 => (8..=10).contains(&days),
            DurationBand::TwoPlusWeeks => days >= 14,
            DurationBand::Flexible => false,
        }
    }
}

/// Safari interest tags the visitor can pick (multiple allowed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interest {
    GorillaTrekking,
    BigFiveSafari,
    GreatMigration,
    CulturalExperiences,
    Photography,
    LuxuryExperience,
}

impl Interest {
    /// All interests in the order they are offered
    pub const ALL: [Interest; 6] = [
        Interest::GorillaTrekking,
        Interest::BigFiveSafari,
        Interest::GreatMigration,
        Interest::CulturalExperiences,
        Interest::Photography,
        Interest::LuxuryExperience,
    ];

    /// The exact quick-action caption for this interest
    pub fn label(&self) -> &'static str {
        match self {
            Interest::GorillaTrekking => "Gorilla Trekking 🦍",
            Interest::BigFiveSafari => "Big Five Safari 🦁",
            Interest::GreatMigration => "Great Migration 🦓",
            Interest::CulturalExperiences => "Cultural Experiences 👥",
            Interest::Photography => "Photography 📸",
            Interest::LuxuryExperience => "Luxury Experience ✨",
        }
    }

    /// Parse a quick-action caption back into an interest
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.label() == label)
    }
}

/// Safari experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    FirstSafari,
    ReturningVisitor,
    FirstTimeEastAfrica,
}

impl ExperienceLevel {
    /// All levels in the order they are offered
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::FirstSafari,
        ExperienceLevel::ReturningVisitor,
        ExperienceLevel::FirstTimeEastAfrica,
    ];

    /// The exact quick-action caption for this level
    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::FirstSafari => "Yes, first time!",
            ExperienceLevel::ReturningVisitor => "No, I've been before",
            ExperienceLevel::FirstTimeEastAfrica => "First time in East Africa",
        }
    }

    /// Parse a quick-action caption back into a level
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.label() == label)
    }
}

/// Number of travelers in the party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupSize {
    One,
    Two,
    ThreeToFour,
    FiveToSeven,
    EightPlus,
}

impl GroupSize {
    /// All sizes in the order they are offered
    pub const ALL: [GroupSize; 5] = [
        GroupSize::One,
        GroupSize::Two,
        GroupSize::ThreeToFour,
        GroupSize::FiveToSeven,
        GroupSize::EightPlus,
    ];

    /// The exact quick-action caption for this size
    pub fn label(&self) -> &'static str {
        match self {
            GroupSize::One => "1",
            GroupSize::Two => "2",
            GroupSize::ThreeToFour => "3-4",
            GroupSize::FiveToSeven => "5-7",
            GroupSize::EightPlus => "8+",
        }
    }

    /// Parse a quick-action caption back into a size
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.label() == label)
    }
}

/// Rough travel window for the guided booking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelWindow {
    ThisMonth,
    OneToThreeMonths,
    ThreeToSixMonths,
    SixToTwelveMonths,
    Flexible,
}

impl TravelWindow {
    /// All windows in the order they are offered
    pub const ALL: [TravelWindow; 5] = [
        TravelWindow::ThisMonth,
        TravelWindow::OneToThreeMonths,
        TravelWindow::ThreeToSixMonths,
        TravelWindow::SixToTwelveMonths,
        TravelWindow::Flexible,
    ];

    /// The exact quick-action caption for this window
    pub fn label(&self) -> &'static str {
        match self {
            TravelWindow::ThisMonth => "This Month",
            TravelWindow::OneToThreeMonths => "1-3 Months",
            TravelWindow::ThreeToSixMonths => "3-6 Months",
            TravelWindow::SixToTwelveMonths => "6-12 Months",
            TravelWindow::Flexible => "Flexible",
        }
    }

    /// Parse a quick-action caption back into a window
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.label() == label)
    }
}

/// Everything the engine has learned about the visitor's trip so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TravelerPreferences {
    /// Budget band, if answered
    pub budget: Option<BudgetBand>,
    /// Duration band, if answered
    pub duration: Option<DurationBand>,
    /// Selected interests, insertion-ordered and deduplicated
    pub interests: Vec<Interest>,
    /// Experience level, if answered
    pub experience: Option<ExperienceLevel>,
    /// Destination from the guided booking flow
    pub destination: Option<String>,
    /// Group size from the guided booking flow
    pub group_size: Option<GroupSize>,
    /// Travel window from the guided booking flow
    pub travel_window: Option<TravelWindow>,
}

impl TravelerPreferences {
    /// Create an empty preference record
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the budget band. Answering again overwrites.
    pub fn set_budget(&mut self, budget: BudgetBand) {
        self.budget = Some(budget);
    }

    /// Store the duration band. Answering again overwrites.
    pub fn set_duration(&mut self, duration: DurationBand) {
        self.duration = Some(duration);
    }

    /// Add an interest if not already present. Returns true if it was added.
    pub fn add_interest(&mut self, interest: Interest) -> bool {
        if self.interests.contains(&interest) {
            false
        } else {
            self.interests.push(interest);
            true
        }
    }

    /// Store the experience level. Answering again overwrites.
    pub fn set_experience(&mut self, experience: ExperienceLevel) {
        self.experience = Some(experience);
    }

    /// Store the destination from the guided booking flow
    pub fn set_destination(&mut self, destination: impl Into<String>) {
        self.destination = Some(destination.into());
    }

    /// Store the group size from the guided booking flow
    pub fn set_group_size(&mut self, group_size: GroupSize) {
        self.group_size = Some(group_size);
    }

    /// Store the travel window from the guided booking flow
    pub fn set_travel_window(&mut self, window: TravelWindow) {
        self.travel_window = Some(window);
    }

    /// Whether nothing has been captured yet
    pub fn is_empty(&self) -> bool {
        self.budget.is_none()
            && self.duration.is_none()
            && self.interests.is_empty()
            && self.experience.is_none()
            && self.destination.is_none()
            && self.group_size.is_none()
            && self.travel_window.is_none()
    }

    /// Clear everything. Only Start Over calls this.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

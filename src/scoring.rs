//! Deterministic recommendation scoring
//!
//! Packages are scored against the captured preferences with fixed weights:
//! 30 points for a budget range hit, 25 for a duration predicate hit, and
//! 15 per capability tag shared between a selected interest and the package.
//! No randomness and no learned weights; the same preferences always produce
//! the same ranking.

use crate::catalog::{Catalog, Package};
use crate::preferences::TravelerPreferences;
use tracing::debug;

/// Points for a package price inside the chosen budget range
const BUDGET_WEIGHT: u32 = 30;

/// Points for a package length matching the chosen duration band
const DURATION_WEIGHT: u32 = 25;

/// Points per capability tag shared with a selected interest
const INTEREST_TAG_WEIGHT: u32 = 15;

/// Maximum number of recommendations shown
const MAX_RECOMMENDATIONS: usize = 3;

/// A package together with its score for the current preferences
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPackage<'a> {
    /// The catalog package
    pub package: &'a Package,
    /// Raw score under the fixed weights
    pub score: u32,
}

impl ScoredPackage<'_> {
    /// Displayed match percentage: the raw score clamped to 75..=95
    pub fn match_percentage(&self) -> u32 {
        self.score.clamp(75, 95)
    }
}

/// Score a single package against the preferences
pub fn score_package(preferences: &TravelerPreferences, package: &Package) -> u32 {
    let mut score = 0;

    if let Some((min, max)) = preferences.budget.and_then(|b| b.price_range()) {
        if package.price >= min && package.price <= max {
            score += BUDGET_WEIGHT;
        }
    }

    if let Some(duration) = preferences.duration {
        if duration.matches(package.duration_days) {
            score += DURATION_WEIGHT;
        }
    }

    for interest in &preferences.interests {
        for tag in interest.capability_tags() {
            if package.best_for.contains(tag) {
                score += INTEREST_TAG_WEIGHT;
            }
        }
    }

    score
}

/// Rank the catalog for the given preferences.
///
/// Packages scoring zero are dropped. The sort is stable and descending,
/// so packages with equal scores keep their catalog order. At most three
/// recommendations are returned.
pub fn recommend<'a>(
    catalog: &'a Catalog,
    preferences: &TravelerPreferences,
) -> Vec<ScoredPackage<'a>> {
    let mut scored: Vec<ScoredPackage<'a>> = catalog
        .packages()
        .iter()
        .map(|package| ScoredPackage {
            score: score_package(preferences, package),
            package,
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_RECOMMENDATIONS);

    debug!(
        recommendations = scored.len(),
        top_score = scored.first().map(|s| s.score).unwrap_or(0),
        "ranked catalog"
    );

    scored
}

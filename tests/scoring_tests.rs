// Scoring properties over the built-in catalog

use karibu::{
    recommend, BudgetBand, Catalog, DurationBand, Interest, TravelerPreferences,
};

fn prefs(budget: BudgetBand, duration: DurationBand, interests: &[Interest]) -> TravelerPreferences {
    let mut p = TravelerPreferences::new();
    p.set_budget(budget);
    p.set_duration(duration);
    for interest in interests {
        p.add_interest(*interest);
    }
    p
}

// Budget in range (30) + duration match (25) + one shared capability tag (15)
// gives a raw score of 70, displayed as the 75% floor
#[test]
fn test_partial_match_clamps_to_floor() {
    let catalog = Catalog::default();
    let p = prefs(
        BudgetBand::Range700To1000,
        DurationBand::Days5To7,
        &[Interest::CulturalExperiences],
    );

    let ranked = recommend(&catalog, &p);
    let kenya = ranked
        .iter()
        .find(|s| s.package.id == "kenya-big-five")
        .expect("kenya package should be recommended");

    assert_eq!(kenya.score, 70);
    assert_eq!(kenya.match_percentage(), 75);
}

// A strong alignment lands between the floor and the 95% ceiling
#[test]
fn test_strong_match_lands_between_floor_and_ceiling() {
    let catalog = Catalog::default();
    let p = prefs(
        BudgetBand::Under700,
        DurationBand::Days3To4,
        &[Interest::GorillaTrekking],
    );

    let ranked = recommend(&catalog, &p);
    let uganda = ranked
        .iter()
        .find(|s| s.package.id == "uganda-gorilla")
        .expect("uganda package should be recommended");

    // 30 budget + 25 duration + two tag hits at 15 each
    assert_eq!(uganda.score, 85);
    assert_eq!(uganda.match_percentage(), 85);
}

#[test]
fn test_overqualified_match_clamps_to_ceiling() {
    let catalog = Catalog::default();
    let p = prefs(
        BudgetBand::Under700,
        DurationBand::Days3To4,
        &[Interest::GorillaTrekking, Interest::Photography],
    );

    let ranked = recommend(&catalog, &p);
    let uganda = ranked
        .iter()
        .find(|s| s.package.id == "uganda-gorilla")
        .expect("uganda package should be recommended");

    assert!(uganda.score > 95);
    assert_eq!(uganda.match_percentage(), 95);
    assert!(ranked.iter().all(|s| s.match_percentage() <= 95));
}

#[test]
fn test_recommendations_capped_at_three() {
    let catalog = Catalog::default();
    let p = prefs(
        BudgetBand::Over1500,
        DurationBand::Flexible,
        &[
            Interest::GorillaTrekking,
            Interest::BigFiveSafari,
            Interest::GreatMigration,
            Interest::CulturalExperiences,
            Interest::Photography,
            Interest::LuxuryExperience,
        ],
    );

    let ranked = recommend(&catalog, &p);
    assert!(ranked.len() <= 3);
    assert!(!ranked.is_empty());
}

#[test]
fn test_ranking_is_descending_and_deterministic() {
    let catalog = Catalog::default();
    let p = prefs(
        BudgetBand::Range700To1000,
        DurationBand::Days5To7,
        &[Interest::BigFiveSafari, Interest::Photography],
    );

    let first = recommend(&catalog, &p);
    for window in first.windows(2) {
        assert!(window[0].score >= window[1].score);
    }

    for _ in 0..10 {
        let again = recommend(&catalog, &p);
        let ids: Vec<&str> = again.iter().map(|s| s.package.id.as_str()).collect();
        let expected: Vec<&str> = first.iter().map(|s| s.package.id.as_str()).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn test_empty_preferences_recommend_nothing() {
    let catalog = Catalog::default();
    let p = TravelerPreferences::new();
    assert!(recommend(&catalog, &p).is_empty());
}

#[test]
fn test_unsure_budget_contributes_nothing() {
    let catalog = Catalog::default();
    let with_unsure = prefs(
        BudgetBand::NotSure,
        DurationBand::Days3To4,
        &[Interest::GorillaTrekking],
    );
    let without_budget = {
        let mut p = TravelerPreferences::new();
        p.set_duration(DurationBand::Days3To4);
        p.add_interest(Interest::GorillaTrekking);
        p
    };

    let a = recommend(&catalog, &with_unsure);
    let b = recommend(&catalog, &without_budget);
    let scores_a: Vec<u32> = a.iter().map(|s| s.score).collect();
    let scores_b: Vec<u32> = b.iter().map(|s| s.score).collect();
    assert_eq!(scores_a, scores_b);
}

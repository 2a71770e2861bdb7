//! Safari package catalog
//!
//! The catalog is a read-only list of offered packages with the metadata
//! the recommendation scorer consumes. The built-in default mirrors the
//! packages on the booking site.

use crate::preferences::Interest;
use serde::{Deserialize, Serialize};

/// Audience tag a package is marketed toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTag {
    FirstTime,
    WildlifeLovers,
    Photography,
    ClassicSafari,
    Cultural,
    Luxury,
    OnceInLifetime,
    Honeymoon,
    Convenience,
    Comprehensive,
}

impl Interest {
    /// Capability tags an interest scores against. Fixed table.
    pub fn capability_tags(&self) -> &'static [CapabilityTag] {
        match self {
            Interest::GorillaTrekking => {
                &[CapabilityTag::FirstTime, CapabilityTag::WildlifeLovers]
            }
            Interest::BigFiveSafari => {
                &[CapabilityTag::ClassicSafari, CapabilityTag::WildlifeLovers]
            }
            Interest::GreatMigration => {
                &[CapabilityTag::Photography, CapabilityTag::OnceInLifetime]
            }
            Interest::CulturalExperiences => &[CapabilityTag::Cultural],
            Interest::Photography => &[CapabilityTag::Photography],
            Interest::LuxuryExperience => &[CapabilityTag::Luxury, CapabilityTag::Honeymoon],
        }
    }
}

/// A bookable safari package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Stable catalog identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Price per person in USD
    pub price: u32,
    /// Trip length in days
    pub duration_days: u32,
    /// Destination country (or "Multi-Country")
    pub country: String,
    /// Marketing highlights shown on the recommendation card
    pub highlights: Vec<String>,
    /// Audience tags the scorer matches interests against
    pub best_for: Vec<CapabilityTag>,
    /// Relative URL of the package detail page
    pub detail_url: String,
}

/// Read-only collection of offered packages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    /// Build a catalog from an explicit package list
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// The packages in catalog order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a package by its catalog id
    pub fn get(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Number of packages offered
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Default for Catalog {
    /// The built-in catalog of five East Africa packages
    fn default() -> Self {
        Self::new(vec![
            Package {
                id: "uganda-gorilla".to_string(),
                name: "Uganda Gorilla Trekking".to_string(),
                price: 650,
                duration_days: 3,
                country: "Uganda".to_string(),
                highlights: vec![
                    "Mountain Gorillas".to_string(),
                    "Bwindi Forest".to_string(),
                    "Expert Guides".to_string(),
                ],
                best_for: vec![
                    CapabilityTag::FirstTime,
                    CapabilityTag::WildlifeLovers,
                    CapabilityTag::Photography,
                ],
                detail_url: "packages/uganda-gorilla-trekking.html".to_string(),
            },
            Package {
                id: "kenya-big-five".to_string(),
                name: "Kenya Big Five Safari".to_string(),
                price: 750,
                duration_days: 5,
                country: "Kenya".to_string(),
                highlights: vec![
                    "Big Five".to_string(),
                    "Masai Mara".to_string(),
                    "Cultural Experience".to_string(),
                ],
                best_for: vec![
                    CapabilityTag::ClassicSafari,
                    CapabilityTag::WildlifeLovers,
                    CapabilityTag::Cultural,
                ],
                detail_url: "packages/kenya-masai-mara-big-five.html".to_string(),
            },
            Package {
                id: "tanzania-migration".to_string(),
                name: "Tanzania Great Migration".to_string(),
                price: 950,
                duration_days: 6,
                country: "Tanzania".to_string(),
                highlights: vec![
                    "Great Migration".to_string(),
                    "Serengeti".to_string(),
                    "Ngorongoro Crater".to_string(),
                ],
                best_for: vec![
                    CapabilityTag::Luxury,
                    CapabilityTag::Photography,
                    CapabilityTag::OnceInLifetime,
                ],
                detail_url: "packages/tanzania-serengeti.html".to_string(),
            },
            Package {
                id: "rwanda-luxury".to_string(),
                name: "Rwanda Luxury Gorilla Trek".to_string(),
                price: 850,
                duration_days: 3,
                country: "Rwanda".to_string(),
                highlights: vec![
                    "Mountain Gorillas".to_string(),
                    "Luxury Lodges".to_string(),
                    "Golden Monkeys".to_string(),
                ],
                best_for: vec![
                    CapabilityTag::Luxury,
                    CapabilityTag::Honeymoon,
                    CapabilityTag::Convenience,
                ],
                detail_url: "packages/rwanda-gorilla-trekking.html".to_string(),
            },
            Package {
                id: "multi-country".to_string(),
                name: "East Africa Grand Tour".to_string(),
                price: 1850,
                duration_days: 14,
                country: "Multi-Country".to_string(),
                highlights: vec![
                    "All Big Destinations".to_string(),
                    "Comprehensive Tour".to_string(),
                    "VIP Treatment".to_string(),
                ],
                best_for: vec![
                    CapabilityTag::Luxury,
                    CapabilityTag::Comprehensive,
                    CapabilityTag::OnceInLifetime,
                ],
                detail_url: "packages/multi-country.html".to_string(),
            },
        ])
    }
}

//! Tag-driven feature estimates for tracks Spotify could not describe.
//!
//! Each estimated feature has an ordered list of buckets. A bucket matches
//! when any of the track's tags is exactly one of its keywords (after
//! lowercasing). The first matching bucket decides the value; later buckets
//! are not consulted even if they also match.

use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatedFeature {
    Energy,
    Danceability,
    Valence,
    Acousticness,
    Tempo,
}

#[derive(Debug)]
pub struct Bucket {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub value: f64,
}

#[derive(Debug)]
pub struct FeatureRule {
    pub feature: EstimatedFeature,
    pub buckets: &'static [Bucket],
    pub default: f64,
}

impl FeatureRule {
    /// Value of the first bucket any tag belongs to, else the default.
    pub fn evaluate(&self, tags: &HashSet<String>) -> f64 {
        self.matching_bucket(tags)
            .map(|bucket| bucket.value)
            .unwrap_or(self.default)
    }

    pub fn matching_bucket(&self, tags: &HashSet<String>) -> Option<&'static Bucket> {
        self.buckets
            .iter()
            .find(|bucket| bucket.keywords.iter().any(|kw| tags.contains(*kw)))
    }
}

pub const RULES: &[FeatureRule] = &[
    FeatureRule {
        feature: EstimatedFeature::Energy,
        buckets: &[
            Bucket {
                name: "high-energy",
                keywords: &[
                    "rock", "metal", "punk", "electronic", "dance", "edm", "techno", "hardcore",
                ],
                value: 0.8,
            },
            Bucket {
                name: "low-energy",
                keywords: &["ambient", "chill", "acoustic", "classical", "folk", "sleep"],
                value: 0.3,
            },
        ],
        default: 0.5,
    },
    FeatureRule {
        feature: EstimatedFeature::Danceability,
        buckets: &[Bucket {
            name: "danceable",
            keywords: &["dance", "edm", "pop", "disco", "funk", "house", "techno"],
            value: 0.8,
        }],
        default: 0.5,
    },
    FeatureRule {
        feature: EstimatedFeature::Valence,
        buckets: &[
            Bucket {
                name: "happy",
                keywords: &["happy", "upbeat", "cheerful", "party", "fun", "summer"],
                value: 0.8,
            },
            Bucket {
                name: "sad",
                keywords: &["sad", "melancholy", "depressing", "dark", "doom"],
                value: 0.3,
            },
        ],
        default: 0.5,
    },
    FeatureRule {
        feature: EstimatedFeature::Acousticness,
        buckets: &[Bucket {
            name: "acoustic",
            keywords: &["acoustic", "folk", "classical", "unplugged"],
            value: 0.8,
        }],
        default: 0.3,
    },
    FeatureRule {
        feature: EstimatedFeature::Tempo,
        buckets: &[
            Bucket {
                name: "fast",
                keywords: &["hardcore", "drum and bass", "speed metal", "thrash"],
                value: 160.0,
            },
            Bucket {
                name: "slow",
                keywords: &["ambient", "downtempo", "chill", "slowcore"],
                value: 80.0,
            },
        ],
        default: 120.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TagEstimate {
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub acousticness: f64,
    /// BPM
    pub tempo: f64,
}

pub fn normalize_tags(tags: &[String]) -> HashSet<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn rule_for(feature: EstimatedFeature) -> &'static FeatureRule {
    RULES
        .iter()
        .find(|rule| rule.feature == feature)
        .unwrap_or(&RULES[0])
}

pub fn estimate_from_tags(tags: &[String]) -> TagEstimate {
    let tags = normalize_tags(tags);
    let value = |feature| rule_for(feature).evaluate(&tags);

    TagEstimate {
        energy: value(EstimatedFeature::Energy),
        danceability: value(EstimatedFeature::Danceability),
        valence: value(EstimatedFeature::Valence),
        acousticness: value(EstimatedFeature::Acousticness),
        tempo: value(EstimatedFeature::Tempo),
    }
}

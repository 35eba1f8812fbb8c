//! Symptom questionnaire — reported symptoms in, ranked deficiencies out.
//!
//! DESIGN
//! ======
//! A fixed rule table, evaluated locally. Each profile spreads 100 points over
//! its indicative symptoms; a deficiency's probability is the share of its
//! points the user reported, capped at 0.95. Integer weights keep scores exact
//! (three 26-point symptoms score exactly 0.78).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnosis::{CandidateFilter, Scored};

/// Highest score a questionnaire can produce, in points.
const MAX_SCORE: u32 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Symptom {
    Fatigue,
    PaleSkin,
    Breathlessness,
    BrittleNails,
    ColdHands,
    Numbness,
    MouthUlcers,
    MemoryProblems,
    BonePain,
    MuscleWeakness,
    FrequentInfections,
    BleedingGums,
    EasyBruising,
    SlowWoundHealing,
    MuscleCramps,
    IrregularHeartbeat,
    NightBlindness,
    DrySkin,
}

impl Symptom {
    pub const ALL: [Self; 18] = [
        Self::Fatigue,
        Self::PaleSkin,
        Self::Breathlessness,
        Self::BrittleNails,
        Self::ColdHands,
        Self::Numbness,
        Self::MouthUlcers,
        Self::MemoryProblems,
        Self::BonePain,
        Self::MuscleWeakness,
        Self::FrequentInfections,
        Self::BleedingGums,
        Self::EasyBruising,
        Self::SlowWoundHealing,
        Self::MuscleCramps,
        Self::IrregularHeartbeat,
        Self::NightBlindness,
        Self::DrySkin,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fatigue => "Fatigue",
            Self::PaleSkin => "Pale skin",
            Self::Breathlessness => "Shortness of breath",
            Self::BrittleNails => "Brittle nails",
            Self::ColdHands => "Cold hands and feet",
            Self::Numbness => "Numbness or tingling",
            Self::MouthUlcers => "Mouth ulcers",
            Self::MemoryProblems => "Memory problems",
            Self::BonePain => "Bone pain",
            Self::MuscleWeakness => "Muscle weakness",
            Self::FrequentInfections => "Frequent infections",
            Self::BleedingGums => "Bleeding gums",
            Self::EasyBruising => "Easy bruising",
            Self::SlowWoundHealing => "Slow wound healing",
            Self::MuscleCramps => "Muscle cramps",
            Self::IrregularHeartbeat => "Irregular heartbeat",
            Self::NightBlindness => "Night blindness",
            Self::DrySkin => "Dry skin",
        }
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// SYMPTOM SET
// =============================================================================

/// Reported symptoms. Deserializes from `{ "fatigue": true, ... }`; only
/// `true` entries count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomSet(BTreeSet<Symptom>);

impl SymptomSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symptom: Symptom) {
        self.0.insert(symptom);
    }

    #[must_use]
    pub fn contains(&self, symptom: Symptom) -> bool {
        self.0.contains(&symptom)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symptom> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Symptom> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = Symptom>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for SymptomSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let answers = std::collections::BTreeMap::<Symptom, bool>::deserialize(deserializer)?;
        Ok(answers.into_iter().filter_map(|(s, present)| present.then_some(s)).collect())
    }
}

impl Serialize for SymptomSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for symptom in &self.0 {
            map.serialize_entry(symptom, &true)?;
        }
        map.end()
    }
}

// =============================================================================
// PROFILES
// =============================================================================

struct Profile {
    name: &'static str,
    description: &'static str,
    weights: &'static [(Symptom, u32)],
    sources: &'static [&'static str],
}

const PROFILES: &[Profile] = &[
    Profile {
        name: "Iron Deficiency",
        description: "Low iron reduces haemoglobin production, limiting oxygen delivery to tissues.",
        weights: &[
            (Symptom::Fatigue, 26),
            (Symptom::PaleSkin, 26),
            (Symptom::Breathlessness, 26),
            (Symptom::BrittleNails, 12),
            (Symptom::ColdHands, 10),
        ],
        sources: &["Red meat", "Lentils and beans", "Spinach", "Fortified cereals"],
    },
    Profile {
        name: "Vitamin B12 Deficiency",
        description: "B12 is needed for red blood cell formation and nerve function.",
        weights: &[
            (Symptom::Numbness, 30),
            (Symptom::Fatigue, 15),
            (Symptom::MouthUlcers, 20),
            (Symptom::MemoryProblems, 20),
            (Symptom::PaleSkin, 15),
        ],
        sources: &["Eggs", "Dairy products", "Fish", "Fortified plant milks"],
    },
    Profile {
        name: "Vitamin D Deficiency",
        description: "Vitamin D regulates calcium absorption and supports bone and immune health.",
        weights: &[
            (Symptom::BonePain, 35),
            (Symptom::MuscleWeakness, 30),
            (Symptom::FrequentInfections, 20),
            (Symptom::Fatigue, 15),
        ],
        sources: &["Sunlight exposure", "Oily fish", "Egg yolks", "Fortified milk"],
    },
    Profile {
        name: "Vitamin C Deficiency",
        description: "Vitamin C is essential for collagen synthesis and wound repair.",
        weights: &[
            (Symptom::BleedingGums, 35),
            (Symptom::EasyBruising, 25),
            (Symptom::SlowWoundHealing, 25),
            (Symptom::Fatigue, 15),
        ],
        sources: &["Citrus fruits", "Bell peppers", "Strawberries", "Broccoli"],
    },
    Profile {
        name: "Magnesium Deficiency",
        description: "Magnesium supports muscle contraction, nerve signalling, and heart rhythm.",
        weights: &[
            (Symptom::MuscleCramps, 40),
            (Symptom::IrregularHeartbeat, 25),
            (Symptom::Fatigue, 20),
            (Symptom::Numbness, 15),
        ],
        sources: &["Nuts and seeds", "Whole grains", "Dark chocolate", "Leafy greens"],
    },
    Profile {
        name: "Vitamin A Deficiency",
        description: "Vitamin A maintains vision in low light, skin integrity, and immunity.",
        weights: &[(Symptom::NightBlindness, 50), (Symptom::DrySkin, 25), (Symptom::FrequentInfections, 25)],
        sources: &["Carrots", "Sweet potatoes", "Liver", "Dark leafy greens"],
    },
];

// =============================================================================
// ASSESSMENT
// =============================================================================

/// A suspected deficiency with its questionnaire score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deficiency {
    pub name: String,
    pub probability: f64,
    pub description: String,
    /// Labels of every symptom associated with this deficiency.
    pub symptoms: Vec<String>,
    /// Labels of the reported symptoms that contributed to the score.
    pub matched: Vec<String>,
    pub sources: Vec<String>,
}

impl Scored for Deficiency {
    fn probability(&self) -> f64 {
        self.probability
    }
}

fn score(profile: &Profile, set: &SymptomSet) -> Deficiency {
    let points: u32 = profile.weights.iter().filter(|(s, _)| set.contains(*s)).map(|(_, w)| w).sum();
    Deficiency {
        name: profile.name.into(),
        probability: f64::from(points.min(MAX_SCORE)) / 100.0,
        description: profile.description.into(),
        symptoms: profile.weights.iter().map(|(s, _)| s.label().to_string()).collect(),
        matched: profile
            .weights
            .iter()
            .filter(|(s, _)| set.contains(*s))
            .map(|(s, _)| s.label().to_string())
            .collect(),
        sources: profile.sources.iter().map(|s| (*s).to_string()).collect(),
    }
}

/// Score every profile against `set` and keep those passing `filter`.
#[must_use]
pub fn assess(set: &SymptomSet, filter: CandidateFilter) -> Vec<Deficiency> {
    let scored: Vec<Deficiency> = PROFILES.iter().map(|p| score(p, set)).collect();
    let kept = filter.apply(scored);
    debug!(reported = set.len(), kept = kept.len(), "symptoms: assessed");
    kept
}

#[cfg(test)]
#[path = "symptoms_test.rs"]
mod tests;

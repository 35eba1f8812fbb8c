//! Diagnosis candidate model and the health-assessment wire format.

use serde::{Deserialize, Serialize};

use super::filter::Scored;

/// Treatment options split by approach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(default)]
    pub biological: Vec<String>,
    #[serde(default)]
    pub chemical: Vec<String>,
    #[serde(default)]
    pub prevention: Vec<String>,
}

impl Treatment {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.biological.is_empty() && self.chemical.is_empty() && self.prevention.is_empty()
    }
}

/// Taxonomy of the pathogen behind a diagnosed condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub kingdom: String,
    #[serde(default)]
    pub phylum: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub genus: String,
}

/// A named condition with the service's confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub probability: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Treatment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<Taxonomy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Scored for Candidate {
    fn probability(&self) -> f64 {
        self.probability
    }
}

/// Filtered outcome of one image assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub candidates: Vec<Candidate>,
    pub is_healthy: Option<bool>,
    pub is_healthy_probability: Option<f64>,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct HealthAssessmentRequest<'a> {
    pub api_key: &'a str,
    pub images: [&'a str; 1],
    pub modifiers: &'static [&'static str],
    pub disease_details: &'static [&'static str],
    pub language: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthAssessmentResponse {
    pub health_assessment: HealthAssessment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthAssessment {
    pub diseases: Vec<WireDisease>,
    #[serde(default)]
    pub is_healthy: Option<bool>,
    #[serde(default)]
    pub is_healthy_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDisease {
    pub name: String,
    pub probability: f64,
    #[serde(default)]
    pub disease_details: Option<WireDiseaseDetails>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub treatment: Option<Treatment>,
    #[serde(default)]
    pub classification: Option<WireClassification>,
    #[serde(default)]
    pub common_names: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Newer API revisions nest details under `disease_details`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireDiseaseDetails {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub treatment: Option<Treatment>,
    #[serde(default)]
    pub classification: Option<WireClassification>,
    #[serde(default)]
    pub common_names: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireClassification {
    #[serde(default)]
    pub taxonomy: Option<Taxonomy>,
}

impl From<WireDisease> for Candidate {
    fn from(wire: WireDisease) -> Self {
        let details = wire.disease_details.unwrap_or_default();
        Self {
            name: wire.name,
            probability: wire.probability,
            description: wire.description.or(details.description).unwrap_or_default(),
            treatment: wire.treatment.or(details.treatment),
            taxonomy: wire.classification.or(details.classification).and_then(|c| c.taxonomy),
            common_names: wire.common_names.or(details.common_names),
            url: wire.url.or(details.url),
        }
    }
}

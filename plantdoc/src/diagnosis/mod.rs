//! Image diagnosis — plant photo in, filtered disease candidates out.
//!
//! DESIGN
//! ======
//! The hosted health-assessment service is an opaque collaborator. This
//! module builds its request, decodes its response into [`Candidate`]s, and
//! applies the local probability cutoff. A response without
//! `health_assessment.diseases` is a terminal shape error, never an empty
//! result.

pub mod filter;
pub mod types;

use base64::Engine;
use dispatch::{DispatchError, Dispatcher, Endpoint, ErrorCode};
use tracing::{info, warn};

use crate::config::PlantIdConfig;
pub use filter::{CandidateFilter, Scored};
pub use types::{Assessment, Candidate, Taxonomy, Treatment};
use types::{HealthAssessmentRequest, HealthAssessmentResponse};

const MODIFIERS: &[&str] = &["health_all"];
const DISEASE_DETAILS: &[&str] = &["description", "treatment", "classification"];
const LANGUAGE: &str = "en";

#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    /// No image data was supplied; nothing was sent.
    #[error("image is empty")]
    EmptyImage,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ErrorCode for DiagnosisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyImage => "E_EMPTY_IMAGE",
            Self::Dispatch(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Dispatch(e) if e.retryable())
    }
}

// =============================================================================
// IMAGE ENCODING
// =============================================================================

/// Standard base64 of raw image bytes.
#[must_use]
pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Drop a `data:<mime>;base64,` prefix if present.
#[must_use]
pub fn strip_data_url(image: &str) -> &str {
    if image.starts_with("data:") {
        if let Some((_, payload)) = image.split_once(',') {
            return payload;
        }
    }
    image
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct PlantIdClient {
    dispatcher: Dispatcher,
    endpoint: Endpoint,
    api_key: String,
    filter: CandidateFilter,
}

impl PlantIdClient {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: &PlantIdConfig) -> Self {
        Self {
            dispatcher,
            endpoint: Endpoint::new("plant.id", format!("{}/health_assessment", config.base_url)),
            api_key: config.api_key.clone(),
            filter: CandidateFilter::new(config.threshold, config.top_only),
        }
    }

    /// Override the cutoff configured at construction.
    #[must_use]
    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn filter(&self) -> CandidateFilter {
        self.filter
    }

    /// Assess a base64-encoded image (a `data:` URL prefix is accepted).
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosisError::EmptyImage`] for empty input, otherwise any
    /// terminal dispatch error, including an unexpected response shape.
    pub async fn identify(&self, image_b64: &str) -> Result<Assessment, DiagnosisError> {
        let image = strip_data_url(image_b64).trim();
        if image.is_empty() {
            return Err(DiagnosisError::EmptyImage);
        }

        let request = HealthAssessmentRequest {
            api_key: &self.api_key,
            images: [image],
            modifiers: MODIFIERS,
            disease_details: DISEASE_DETAILS,
            language: LANGUAGE,
        };
        let response: HealthAssessmentResponse = self.dispatcher.call(&self.endpoint, &request).await?;
        let assessment = into_assessment(response, self.filter);

        info!(
            kept = assessment.candidates.len(),
            threshold = self.filter.threshold,
            top_only = self.filter.top_only,
            "diagnosis: assessment complete"
        );
        Ok(assessment)
    }
}

pub(crate) fn into_assessment(response: HealthAssessmentResponse, filter: CandidateFilter) -> Assessment {
    let health = response.health_assessment;
    let candidates: Vec<Candidate> = health
        .diseases
        .into_iter()
        .map(Candidate::from)
        .filter(|c| {
            let valid = (0.0..=1.0).contains(&c.probability);
            if !valid {
                warn!(name = %c.name, probability = c.probability, "diagnosis: dropping out-of-range probability");
            }
            valid
        })
        .collect();

    Assessment {
        candidates: filter.apply(candidates),
        is_healthy: health.is_healthy,
        is_healthy_probability: health.is_healthy_probability,
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

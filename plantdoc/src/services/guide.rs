//! Expert guide for a diagnosed plant condition.
//!
//! ERROR HANDLING
//! ==============
//! Guide generation is best-effort. Any failure is logged and replaced by a
//! fixed fallback text so result panels always have something to show.

use std::fmt::Write;

use dispatch::ErrorCode;
use tracing::{info, warn};

use crate::diagnosis::Candidate;
use crate::llm::{GenerationConfig, TextGenerator};

pub const GUIDE_FALLBACK: &str = "Unable to generate enhanced information at this time. Please try again later.";

const GUIDE_SECTIONS: [&str; 7] = [
    "A brief introduction to this plant disease",
    "Clear symptoms identification with visual cues",
    "Causes and environmental factors",
    "Progression stages",
    "Treatment options with organic and chemical solutions",
    "Prevention strategies for gardeners",
    "Risk levels to other plants, humans, or pets",
];

/// Prompt asking for a gardener-facing guide to `candidate`.
#[must_use]
pub fn disease_guide_prompt(candidate: &Candidate) -> String {
    let description =
        if candidate.description.is_empty() { "No detailed description available." } else { &candidate.description };

    let mut prompt = format!(
        "You are a plant disease expert specialized in {name}.\n\n\
         Disease details:\n\
         - Name: {name}\n\
         - Description: {description}\n\
         - Probability: {probability:.2}%\n",
        name = candidate.name,
        probability = candidate.probability * 100.0,
    );
    if let Some(t) = &candidate.taxonomy {
        let _ = writeln!(prompt, "- Plant taxonomy: Kingdom {}, Family {}, Genus {}", t.kingdom, t.family, t.genus);
    }
    if let Some(names) = candidate.common_names.as_ref().filter(|n| !n.is_empty()) {
        let _ = writeln!(prompt, "- Common names: {}", names.join(", "));
    }

    prompt.push_str("\nCreate a comprehensive plant disease guide that includes:\n");
    for (i, section) in GUIDE_SECTIONS.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {section}", i + 1);
    }
    prompt.push_str(
        "\nFormat your response with markdown for better readability.\n\
         Use bullet points for lists of treatment options or prevention steps.\n\
         Include scientific terminology where relevant but explain it for amateur gardeners.\n\
         Keep your response focused, engaging, and actionable.\n\
         Focus especially on detailed biological control methods.\n",
    );
    prompt
}

/// Generate the guide for `candidate`, or [`GUIDE_FALLBACK`] on any failure.
pub async fn enhanced_info(generator: &dyn TextGenerator, candidate: &Candidate) -> String {
    let prompt = disease_guide_prompt(candidate);
    match generator.generate(&prompt, &GenerationConfig::guide()).await {
        Ok(text) => {
            info!(disease = %candidate.name, chars = text.len(), "guide: generated");
            text
        }
        Err(e) => {
            warn!(disease = %candidate.name, code = e.error_code(), error = %e, "guide: generation failed");
            GUIDE_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
#[path = "guide_test.rs"]
mod tests;

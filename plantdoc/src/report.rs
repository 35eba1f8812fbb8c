//! Plain-text report panels for diagnosis and questionnaire results.
//!
//! Rendering is pure string building so front ends (and tests) can print or
//! embed the output as they see fit.

use std::fmt::{self, Write};

use crate::diagnosis::{Assessment, Candidate};
use crate::symptoms::Deficiency;

const MAX_SEVERITY_BARS: u32 = 5;

/// Whole percent, rounded half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percent(p: f64) -> i64 {
    (p * 100.0).round() as i64
}

/// `p` as a percentage string with `decimals` places, e.g. `"78.0%"`.
#[must_use]
pub fn percent_label(p: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", p * 100.0)
}

/// How clearly the visual indicators match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    VeryDistinct,
    Present,
    Possible,
}

impl ConfidenceTier {
    #[must_use]
    pub fn of(p: f64) -> Self {
        if p > 0.9 {
            Self::VeryDistinct
        } else if p > 0.7 {
            Self::Present
        } else {
            Self::Possible
        }
    }

    #[must_use]
    pub fn sentence(self) -> &'static str {
        match self {
            Self::VeryDistinct => "The visual indicators are very distinct and clear.",
            Self::Present => "Some key visual indicators are present.",
            Self::Possible => "A few indicators suggest this condition may be present.",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VeryDistinct => "Very distinct",
            Self::Present => "Present",
            Self::Possible => "Possible",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
}

impl RiskLevel {
    #[must_use]
    pub fn of(p: f64) -> Self {
        if p > 0.8 { Self::High } else { Self::Medium }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "High",
            Self::Medium => "Medium",
        })
    }
}

/// Filled bars out of five: `ceil(p * 5)`, clamped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn severity_bars(p: f64) -> u32 {
    if !p.is_finite() || p <= 0.0 {
        return 0;
    }
    ((p * f64::from(MAX_SEVERITY_BARS)).ceil() as u32).min(MAX_SEVERITY_BARS)
}

fn bar_gauge(p: f64) -> String {
    let filled = severity_bars(p) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(MAX_SEVERITY_BARS as usize - filled))
}

fn list_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {title}:");
    for item in items {
        let _ = writeln!(out, "    - {item}");
    }
}

// =============================================================================
// DIAGNOSIS
// =============================================================================

/// Render a filtered image assessment.
#[must_use]
pub fn render_assessment(assessment: &Assessment) -> String {
    let mut out = String::new();
    if let Some(p) = assessment.is_healthy_probability {
        let verdict = if assessment.is_healthy == Some(true) { "healthy" } else { "not healthy" };
        let _ = writeln!(out, "Plant appears {verdict} ({} healthy)\n", percent_label(p, 0));
    }

    if assessment.candidates.is_empty() {
        out.push_str("No Issues Detected: no condition matched with enough confidence.\n");
        return out;
    }

    for candidate in &assessment.candidates {
        render_candidate(&mut out, candidate);
    }
    out
}

fn render_candidate(out: &mut String, c: &Candidate) {
    let tier = ConfidenceTier::of(c.probability);
    let _ = writeln!(out, "== {} ({}% confidence) ==", c.name, percent(c.probability));
    let _ = writeln!(out, "  Severity: {} {}", RiskLevel::of(c.probability), bar_gauge(c.probability));
    let _ = writeln!(out, "  Indicators: {tier}. {}", tier.sentence());
    if let Some(names) = c.common_names.as_ref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "  Also known as: {}", names.join(", "));
    }
    if !c.description.is_empty() {
        let _ = writeln!(out, "  {}", c.description);
    }
    if let Some(t) = &c.taxonomy {
        let _ = writeln!(out, "  Taxonomy: {} > {} > {} > {}", t.kingdom, t.class, t.family, t.genus);
    }
    if let Some(treatment) = c.treatment.as_ref().filter(|t| !t.is_empty()) {
        list_section(out, "Biological treatment", &treatment.biological);
        list_section(out, "Chemical treatment", &treatment.chemical);
        list_section(out, "Prevention", &treatment.prevention);
    }
    if let Some(url) = &c.url {
        let _ = writeln!(out, "  More: {url}");
    }
    out.push('\n');
}

// =============================================================================
// DEFICIENCIES
// =============================================================================

/// Render questionnaire results.
#[must_use]
pub fn render_deficiencies(deficiencies: &[Deficiency]) -> String {
    let mut out = String::new();
    if deficiencies.is_empty() {
        out.push_str("No Deficiencies Detected: no deficiency matched with enough confidence.\n");
        return out;
    }

    for d in deficiencies {
        let tier = ConfidenceTier::of(d.probability);
        let _ = writeln!(out, "== {} ({}% match) ==", d.name, percent(d.probability));
        let _ = writeln!(out, "  Severity: {} {}", RiskLevel::of(d.probability), bar_gauge(d.probability));
        let _ = writeln!(out, "  Indicators: {tier}. {}", tier.sentence());
        let _ = writeln!(out, "  {}", d.description);
        list_section(&mut out, "Reported symptoms", &d.matched);
        list_section(&mut out, "Common symptoms", &d.symptoms);
        list_section(&mut out, "Dietary sources", &d.sources);
        let _ = writeln!(
            out,
            "  Consider discussing {} with a healthcare provider before supplementing.",
            d.name.to_lowercase()
        );
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

//! Probability cutoff and top-result selection.

/// Anything carrying a confidence in `[0, 1]`.
pub trait Scored {
    fn probability(&self) -> f64;
}

/// Keep items strictly above `threshold`, best first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub threshold: f64,
    /// Keep only the single highest-probability item.
    pub top_only: bool,
}

impl CandidateFilter {
    #[must_use]
    pub fn new(threshold: f64, top_only: bool) -> Self {
        Self { threshold, top_only }
    }

    /// Filter and order `items`. Ties keep their input order.
    #[must_use]
    pub fn apply<T: Scored>(&self, items: Vec<T>) -> Vec<T> {
        let mut kept: Vec<T> = items.into_iter().filter(|item| item.probability() > self.threshold).collect();
        kept.sort_by(|a, b| b.probability().total_cmp(&a.probability()));
        if self.top_only {
            kept.truncate(1);
        }
        kept
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;

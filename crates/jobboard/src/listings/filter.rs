use serde::{Deserialize, Serialize};

use super::domain::JobPosting;

/// Search term plus exact-match constraints. Empty strings impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience: String,
}

impl FilterState {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..Self::default()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search_term.is_empty() && self.location.is_empty() && self.experience.is_empty()
    }

    /// Terms are matched literally; whitespace is not trimmed.
    pub fn matches(&self, posting: &JobPosting) -> bool {
        let term = self.search_term.to_lowercase();
        self.matches_with_term(posting, &term)
    }

    fn matches_with_term(&self, posting: &JobPosting, lowered_term: &str) -> bool {
        posting.title.to_lowercase().contains(lowered_term)
            && (self.location.is_empty() || posting.location == self.location)
            && (self.experience.is_empty() || posting.experience == self.experience)
    }
}

/// Visible subset of `postings`, in their original order. Absent slots are dropped.
pub fn filter_postings<'a, I>(postings: I, filter: &FilterState) -> Vec<JobPosting>
where
    I: IntoIterator<Item = &'a Option<JobPosting>>,
{
    let term = filter.search_term.to_lowercase();
    postings
        .into_iter()
        .flatten()
        .filter(|posting| filter.matches_with_term(posting, &term))
        .cloned()
        .collect()
}

use serde::{Deserialize, Serialize};

use super::domain::{JobPosting, PostingStatus};

/// Public job-board filters. Unlike the moderation filters, location and salary are substring matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default)]
    pub salary_range: String,
}

impl BrowseFilter {
    pub fn matches(&self, posting: &JobPosting) -> bool {
        posting.status == PostingStatus::Approved
            && posting
                .title
                .to_lowercase()
                .contains(&self.query.to_lowercase())
            && (self.location.is_empty() || posting.location.contains(&self.location))
            && (!self.remote_only || posting.is_remote)
            && (self.salary_range.is_empty() || posting.salary.contains(&self.salary_range))
    }
}

/// Approved postings visible to job seekers, newest first.
pub fn browse<'a, I>(postings: I, filter: &BrowseFilter) -> Vec<JobPosting>
where
    I: IntoIterator<Item = &'a Option<JobPosting>>,
{
    let mut visible: Vec<JobPosting> = postings
        .into_iter()
        .flatten()
        .filter(|posting| filter.matches(posting))
        .cloned()
        .collect();
    visible.sort_by(|a, b| b.posted_on.cmp(&a.posted_on));
    visible
}

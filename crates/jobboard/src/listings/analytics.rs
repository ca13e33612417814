use serde::Serialize;

use super::domain::{JobPosting, PostingStatus};

/// Locations broken out on the analytics dashboard.
pub const TRACKED_LOCATIONS: [&str; 3] = ["New York", "San Francisco", "Remote"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    pub name: &'static str,
    pub value: usize,
}

/// Status and location counts over a posting snapshot. Always a full recount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub status_breakdown: Vec<BreakdownEntry>,
    pub location_breakdown: Vec<BreakdownEntry>,
}

impl ListingSummary {
    pub fn from_postings<'a, I>(postings: I) -> Self
    where
        I: IntoIterator<Item = &'a Option<JobPosting>>,
    {
        let present: Vec<&JobPosting> = postings.into_iter().flatten().collect();
        let count_status =
            |status: PostingStatus| present.iter().filter(|p| p.status == status).count();

        let approved = count_status(PostingStatus::Approved);
        let rejected = count_status(PostingStatus::Rejected);
        let pending = count_status(PostingStatus::Pending);

        let status_breakdown = PostingStatus::ordered()
            .into_iter()
            .map(|status| BreakdownEntry {
                name: status.display_name(),
                value: count_status(status),
            })
            .collect();

        let location_breakdown = TRACKED_LOCATIONS
            .into_iter()
            .map(|location| BreakdownEntry {
                name: location,
                value: present.iter().filter(|p| p.location == location).count(),
            })
            .collect();

        Self {
            total: present.len(),
            approved,
            rejected,
            pending,
            status_breakdown,
            location_breakdown,
        }
    }
}

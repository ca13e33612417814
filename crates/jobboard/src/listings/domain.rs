use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_COMPANY: &str = "Unknown";
pub const DEFAULT_LOCATION: &str = "Remote";
pub const DEFAULT_EXPERIENCE: &str = "0+ years";

/// Store-assigned identifier for a job posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobPostingId(pub String);

impl JobPostingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobPostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobPostingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Moderation state of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Pending,
    Approved,
    Rejected,
}

impl PostingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PostingStatus::Pending => "pending",
            PostingStatus::Approved => "approved",
            PostingStatus::Rejected => "rejected",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            PostingStatus::Pending => "Pending",
            PostingStatus::Approved => "Approved",
            PostingStatus::Rejected => "Rejected",
        }
    }

    pub fn ordered() -> [PostingStatus; 3] {
        [
            PostingStatus::Approved,
            PostingStatus::Rejected,
            PostingStatus::Pending,
        ]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PostingStatus::Pending),
            "approved" => Some(PostingStatus::Approved),
            "rejected" => Some(PostingStatus::Rejected),
            _ => None,
        }
    }

    /// Statuses only move forward: a decided posting is never reopened.
    pub const fn can_transition_to(self, next: PostingStatus) -> bool {
        matches!(
            (self, next),
            (PostingStatus::Pending, PostingStatus::Approved)
                | (PostingStatus::Pending, PostingStatus::Rejected)
        )
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Document shape held by the listing store. Every field except the id may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDocument {
    pub id: JobPostingId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub posted_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub is_remote: Option<bool>,
}

/// A normalized job posting with display placeholders applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobPostingId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience: String,
    pub status: PostingStatus,
    pub posted_on: DateTime<Utc>,
    pub description: String,
    pub salary: String,
    pub is_remote: bool,
}

impl JobPosting {
    /// Normalize a raw document. Returns `None` when the stored status is unrecognized.
    pub fn from_document(document: ListingDocument, now: DateTime<Utc>) -> Option<Self> {
        let status = match document.status.as_deref() {
            None | Some("") => PostingStatus::Pending,
            Some(raw) => match PostingStatus::parse(raw) {
                Some(status) => status,
                None => {
                    warn!(posting_id = %document.id, status = raw, "skipping posting with unknown status");
                    return None;
                }
            },
        };

        Some(Self {
            id: document.id,
            title: or_placeholder(document.title, UNTITLED),
            company: or_placeholder(document.company, UNKNOWN_COMPANY),
            location: or_placeholder(document.location, DEFAULT_LOCATION),
            experience: or_placeholder(document.experience, DEFAULT_EXPERIENCE),
            status,
            posted_on: document.posted_on.unwrap_or(now),
            description: document.description.unwrap_or_default(),
            salary: document.salary.unwrap_or_default(),
            is_remote: document.is_remote.unwrap_or(false),
        })
    }
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Fields supplied when an employer creates a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub experience: String,
    pub description: String,
    pub salary: String,
    pub is_remote: bool,
}

impl NewPosting {
    /// Build the stored document. New postings always start out pending.
    pub fn into_document(self, id: JobPostingId, posted_on: DateTime<Utc>) -> ListingDocument {
        ListingDocument {
            id,
            title: Some(self.title),
            company: Some(self.company),
            location: Some(self.location),
            experience: Some(self.experience),
            status: Some(PostingStatus::Pending.label().to_string()),
            posted_on: Some(posted_on),
            description: Some(self.description),
            salary: Some(self.salary),
            is_remote: Some(self.is_remote),
        }
    }
}

/// In-memory snapshot where absent entries stand in for rows that did not load.
pub type PostingSnapshot = Vec<Option<JobPosting>>;

/// Normalize every document, keeping a slot for rows that could not be read.
pub fn catalog_snapshot(documents: Vec<ListingDocument>, now: DateTime<Utc>) -> PostingSnapshot {
    documents
        .into_iter()
        .map(|document| JobPosting::from_document(document, now))
        .collect()
}

/// Snapshot for the moderation queue: anything not pending becomes an empty slot.
pub fn pending_snapshot(documents: Vec<ListingDocument>, now: DateTime<Utc>) -> PostingSnapshot {
    catalog_snapshot(documents, now)
        .into_iter()
        .map(|posting| posting.filter(|posting| posting.status == PostingStatus::Pending))
        .collect()
}

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{
    catalog_snapshot, pending_snapshot, JobPostingId, ListingDocument, NewPosting, PostingSnapshot,
    PostingStatus,
};

/// Durable document collection that owns job postings.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError>;

    async fn update_status(
        &self,
        id: &JobPostingId,
        status: PostingStatus,
    ) -> Result<(), StoreError>;

    /// Persist a new posting. Stores assign the id and always start at `pending`.
    async fn create(&self, posting: NewPosting) -> Result<JobPostingId, StoreError>;

    /// Pending postings; decided rows are filtered client-side and leave empty slots.
    async fn fetch_pending(&self) -> Result<PostingSnapshot, StoreError> {
        let documents = self.fetch_all().await?;
        Ok(pending_snapshot(documents, Utc::now()))
    }

    /// Every readable posting regardless of status.
    async fn fetch_catalog(&self) -> Result<PostingSnapshot, StoreError> {
        let documents = self.fetch_all().await?;
        Ok(catalog_snapshot(documents, Utc::now()))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("posting {0} not found")]
    NotFound(JobPostingId),
    #[error("posting {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobPostingId,
        from: PostingStatus,
        to: PostingStatus,
    },
    #[error("listing store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed listing data: {0}")]
    Malformed(String),
}

//! Job postings: normalization, filtering, moderation, analytics, and intake.

pub mod analytics;
pub mod browse;
pub mod debounce;
pub mod domain;
pub mod filter;
pub mod import;
pub mod intake;
pub mod moderation;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use analytics::{BreakdownEntry, ListingSummary, TRACKED_LOCATIONS};
pub use browse::{browse, BrowseFilter};
pub use debounce::Debounced;
pub use domain::{
    catalog_snapshot, pending_snapshot, JobPosting, JobPostingId, ListingDocument, NewPosting,
    PostingSnapshot, PostingStatus,
};
pub use filter::{filter_postings, FilterState};
pub use import::{CatalogImporter, ImportError};
pub use intake::{submit_posting, IntakeError, PostingDraft, PostingStep};
pub use moderation::{
    FilterSnapshot, ModerationDecision, ModerationDesk, ModerationDesks, ModerationOutcome,
    Notification, NotificationKind,
};
pub use router::{listings_router, ListingsState};
pub use store::{ListingStore, StoreError};

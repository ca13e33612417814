use crate::infra::{InMemoryListingStore, Services};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use clap::Args;
use jobboard::config::{ModerationConfig, ResumeConfig};
use jobboard::error::AppError;
use jobboard::listings::{
    catalog_snapshot, CatalogImporter, FilterState, JobPosting, JobPostingId, ListingDocument,
    ListingStore, ListingSummary, ModerationDesk, ModerationOutcome, NewPosting, PostingStatus,
    StoreError,
};
use jobboard::session::{Credentials, Registration, Role};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CatalogSummaryArgs {
    /// CSV catalog export to summarize
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional CSV catalog to seed the demo store; a built-in sample is used otherwise.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn run_catalog_summary(args: CatalogSummaryArgs) -> Result<(), AppError> {
    let documents = CatalogImporter::from_path(&args.csv)?;
    let snapshot = catalog_snapshot(documents, Utc::now());
    let unreadable = snapshot.iter().filter(|posting| posting.is_none()).count();

    println!("Catalog summary for {}", args.csv.display());
    render_summary(&ListingSummary::from_postings(&snapshot));
    if unreadable > 0 {
        println!("- {unreadable} rows skipped (unknown status)");
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let documents = match args.csv {
        Some(path) => CatalogImporter::from_path(path)?,
        None => sample_catalog(),
    };
    let store = InMemoryListingStore::with_documents(documents);
    let services = Services::in_memory(
        store.clone(),
        &ModerationConfig::default(),
        &ResumeConfig::default(),
    );

    println!("Job board moderation demo");
    let registration = Registration {
        full_name: "Morgan Demo".to_string(),
        email: "counselor@example.com".to_string(),
        password: "demo-password".to_string(),
        role: Role::Counselor,
    };
    let profile = match services.sessions.register(registration).await {
        Ok(profile) => profile,
        Err(err) => {
            println!("  Registration failed: {err}");
            return Ok(());
        }
    };
    let session = match services
        .sessions
        .sign_in(Credentials {
            email: profile.email.clone(),
            password: "demo-password".to_string(),
        })
        .await
    {
        Ok(session) => session,
        Err(err) => {
            println!("  Sign-in failed: {err}");
            return Ok(());
        }
    };
    println!("- Signed in as {} ({})", session.user.full_name, session.role());

    let desk = services.desks.open(&session.token).await;
    println!("\nPending queue ({} postings)", desk.pending_count());
    render_postings(&desk.visible());

    desk.update_filters(FilterState {
        search_term: String::new(),
        location: "Remote".to_string(),
        experience: String::new(),
    });
    println!("\nLocation = Remote");
    render_postings(&desk.visible());

    desk.set_search_term("engineer");
    println!(
        "\nSearch 'engineer' (applies after {} ms idle)",
        ModerationConfig::default().search_debounce.as_millis()
    );
    let filtered = desk.visible_when_settled().await;
    render_postings(&filtered);

    desk.update_filters(FilterState::default());
    let queue = desk.visible_when_settled().await;
    let mut decisions = queue.iter();
    if let Some(posting) = decisions.next() {
        render_outcome(&desk.approve(&posting.id).await);
        render_outcome(&desk.reject(&posting.id).await);
    }
    if let Some(posting) = decisions.next() {
        render_outcome(&desk.reject(&posting.id).await);
    }

    println!("\nStore outage while moderating");
    let flaky = Arc::new(RejectingWrites(store.clone()));
    let outage_desk = ModerationDesk::new(flaky, &ModerationConfig::default());
    outage_desk.load().await;
    if let Some(posting) = outage_desk.visible().first() {
        render_outcome(&outage_desk.approve(&posting.id).await);
        println!("  Posting still pending: {}", outage_desk.contains(&posting.id));
    }

    println!("\nNotifications");
    for notification in desk
        .take_notifications()
        .into_iter()
        .chain(outage_desk.take_notifications())
    {
        println!(
            "  - [{:?}] {}: {}",
            notification.kind, notification.title, notification.description
        );
    }

    let catalog = store.fetch_catalog().await?;
    println!("\nCatalog analytics");
    render_summary(&ListingSummary::from_postings(&catalog));

    services.sessions.sign_out(&session.token);
    println!(
        "\nSigned out; moderation desk closed: {}",
        desk.is_closed()
    );
    Ok(())
}

/// Reads from the wrapped store but refuses every status change.
struct RejectingWrites(InMemoryListingStore);

#[async_trait]
impl ListingStore for RejectingWrites {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError> {
        self.0.fetch_all().await
    }

    async fn update_status(
        &self,
        _id: &JobPostingId,
        _status: PostingStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write quorum lost".to_string()))
    }

    async fn create(&self, posting: NewPosting) -> Result<JobPostingId, StoreError> {
        self.0.create(posting).await
    }
}

fn render_postings(postings: &[JobPosting]) {
    if postings.is_empty() {
        println!("  (no matching postings)");
    }
    for posting in postings {
        println!(
            "  - {} | {} @ {} | {} | {}",
            posting.id, posting.title, posting.company, posting.location, posting.experience
        );
    }
}

fn render_outcome(outcome: &ModerationOutcome) {
    match outcome {
        ModerationOutcome::Applied { id, status } => println!("  {id} -> {status}"),
        ModerationOutcome::NotPending { id } => println!("  {id} is no longer pending; skipped"),
        ModerationOutcome::Failed { id, reason } => println!("  {id} unchanged: {reason}"),
        ModerationOutcome::Discarded { id } => println!("  {id} result discarded"),
    }
}

fn render_summary(summary: &ListingSummary) {
    println!(
        "- {} postings | {} approved | {} rejected | {} pending",
        summary.total, summary.approved, summary.rejected, summary.pending
    );
    println!("Locations:");
    for entry in &summary.location_breakdown {
        println!("  - {}: {}", entry.name, entry.value);
    }
}

fn sample_catalog() -> Vec<ListingDocument> {
    let rows = [
        ("job-101", "Frontend Engineer", "Northwind", "Remote", "2+ years", "pending", 1),
        ("job-102", "Data Analyst", "Contoso", "New York", "1+ years", "pending", 2),
        ("job-103", "Platform Engineer", "Fabrikam", "Remote", "5+ years", "pending", 3),
        ("job-104", "Recruiter", "Tailspin", "San Francisco", "3+ years", "pending", 4),
        ("job-105", "Product Designer", "Litware", "Remote", "3+ years", "approved", 9),
        ("job-106", "QA Engineer", "Proseware", "New York", "2+ years", "rejected", 12),
    ];
    let now = Utc::now();

    let mut documents: Vec<ListingDocument> = rows
        .into_iter()
        .map(
            |(id, title, company, location, experience, status, age_days)| ListingDocument {
                id: JobPostingId::from(id),
                title: Some(title.to_string()),
                company: Some(company.to_string()),
                location: Some(location.to_string()),
                experience: Some(experience.to_string()),
                status: Some(status.to_string()),
                posted_on: Some(now - Duration::days(age_days)),
                description: None,
                salary: None,
                is_remote: Some(location == "Remote"),
            },
        )
        .collect();
    // A bare row, as left behind by a half-written import.
    documents.push(ListingDocument {
        id: JobPostingId::from("job-107"),
        ..ListingDocument::default()
    });
    documents
}

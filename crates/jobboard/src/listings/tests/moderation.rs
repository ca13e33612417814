use super::common::*;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ModerationConfig;
use crate::listings::{
    FilterState, JobPostingId, ListingStore, ListingSummary, ModerationDesk, ModerationDesks,
    ModerationOutcome, NewPosting, NotificationKind, PostingStatus,
};
use crate::session::SessionToken;

async fn loaded_desk<S: ListingStore + 'static>(store: Arc<S>) -> ModerationDesk<S> {
    let desk = ModerationDesk::new(store, &ModerationConfig::default());
    desk.load().await;
    desk
}

fn visible_ids<S: ListingStore + ?Sized>(desk: &ModerationDesk<S>) -> Vec<String> {
    desk.visible()
        .into_iter()
        .map(|posting| posting.id.0)
        .collect()
}

#[tokio::test]
async fn load_keeps_only_pending_postings() {
    let desk = loaded_desk(Arc::new(MemoryStore::seeded())).await;

    assert_eq!(desk.pending_count(), 3);
    assert_eq!(visible_ids(&desk), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn fetch_failure_leaves_an_empty_view() {
    let desk = loaded_desk(Arc::new(UnavailableStore)).await;

    assert_eq!(desk.pending_count(), 0);
    assert!(desk.visible().is_empty());
    assert!(desk.notifications().is_empty());
}

#[tokio::test]
async fn approval_removes_posting_after_store_confirms() {
    let store = Arc::new(MemoryStore::seeded());
    let desk = loaded_desk(Arc::clone(&store)).await;

    let outcome = desk.approve(&JobPostingId::from("b")).await;

    assert_eq!(
        outcome,
        ModerationOutcome::Applied {
            id: JobPostingId::from("b"),
            status: PostingStatus::Approved,
        }
    );
    assert_eq!(visible_ids(&desk), vec!["a", "c"]);
    assert_eq!(store.status_of("b").as_deref(), Some("approved"));

    let notifications = desk.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Success);
    assert_eq!(notifications[0].title, "Approved");
    assert_eq!(notifications[0].description, "Job posting has been approved.");
    assert!(desk.notifications().is_empty());
}

#[tokio::test]
async fn failed_update_keeps_posting_and_reports_error() {
    let store = Arc::new(MemoryStore::seeded());
    let desk = loaded_desk(Arc::clone(&store)).await;
    store.fail_updates(true);

    let outcome = desk.reject(&JobPostingId::from("a")).await;

    assert!(matches!(outcome, ModerationOutcome::Failed { .. }));
    assert_eq!(visible_ids(&desk), vec!["a", "b", "c"]);
    assert_eq!(store.status_of("a").as_deref(), Some("pending"));

    let notifications = desk.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Error);
    assert_eq!(notifications[0].title, "Error");
    assert_eq!(notifications[0].description, "Failed to reject the job.");
}

#[tokio::test]
async fn second_decision_on_same_posting_skips_the_store() {
    let store = Arc::new(MemoryStore::seeded());
    let desk = loaded_desk(Arc::clone(&store)).await;
    let id = JobPostingId::from("c");

    let first = desk.approve(&id).await;
    let second = desk.reject(&id).await;

    assert!(matches!(first, ModerationOutcome::Applied { .. }));
    assert_eq!(second, ModerationOutcome::NotPending { id: id.clone() });
    assert_eq!(store.update_calls(), 1);
    assert_eq!(store.status_of("c").as_deref(), Some("approved"));
    assert_eq!(desk.notifications().len(), 1);
}

#[tokio::test]
async fn summary_recounts_after_approval() {
    let batches = [
        ("ok", "Remote", PostingStatus::Approved, 3),
        ("no", "New York", PostingStatus::Rejected, 2),
        ("wait", "San Francisco", PostingStatus::Pending, 5),
    ];
    let documents = batches
        .into_iter()
        .flat_map(|(prefix, location, status, count)| {
            (0..count).map(move |index| {
                document(&format!("{prefix}-{index}"), "Analyst", location, "1+ years", status)
            })
        })
        .collect();
    let store = Arc::new(MemoryStore::with_documents(documents));

    let before = ListingSummary::from_postings(&store.fetch_catalog().await.expect("catalog"));
    assert_eq!((before.approved, before.rejected, before.pending), (3, 2, 5));

    let desk = loaded_desk(Arc::clone(&store)).await;
    desk.approve(&JobPostingId::from("wait-0")).await;

    let after = ListingSummary::from_postings(&store.fetch_catalog().await.expect("catalog"));
    assert_eq!((after.approved, after.rejected, after.pending), (4, 2, 4));
    assert_eq!(after.total, 10);
}

#[tokio::test(start_paused = true)]
async fn search_term_waits_for_idle_period() {
    let desk = loaded_desk(Arc::new(MemoryStore::seeded())).await;

    desk.set_search_term("dev");
    assert_eq!(visible_ids(&desk), vec!["a", "b", "c"]);
    assert_eq!(desk.filters().pending_search_term.as_deref(), Some("dev"));

    tokio::time::advance(Duration::from_millis(200)).await;
    desk.set_search_term("front");
    tokio::time::advance(Duration::from_millis(200)).await;
    assert_eq!(visible_ids(&desk), vec!["a", "b", "c"]);

    tokio::time::advance(Duration::from_millis(150)).await;
    assert_eq!(visible_ids(&desk), vec!["a"]);
    assert_eq!(desk.filters().applied.search_term, "front");
    assert!(desk.filters().pending_search_term.is_none());
}

#[tokio::test(start_paused = true)]
async fn location_and_experience_apply_immediately() {
    let desk = loaded_desk(Arc::new(MemoryStore::seeded())).await;

    desk.update_filters(FilterState {
        search_term: "developer".to_string(),
        location: "Remote".to_string(),
        experience: String::new(),
    });
    assert_eq!(visible_ids(&desk), vec!["a"]);

    desk.update_filters(FilterState {
        search_term: "developer".to_string(),
        location: String::new(),
        experience: "5+ years".to_string(),
    });
    assert_eq!(visible_ids(&desk), vec!["b"]);

    let settled: Vec<String> = desk
        .visible_when_settled()
        .await
        .into_iter()
        .map(|posting| posting.id.0)
        .collect();
    assert_eq!(settled, vec!["b"]);
}

#[tokio::test]
async fn closing_the_desk_discards_in_flight_results() {
    let store = Arc::new(GatedStore::seeded());
    let desk = Arc::new(loaded_desk(Arc::clone(&store)).await);

    let pending = {
        let desk = Arc::clone(&desk);
        tokio::spawn(async move { desk.approve(&JobPostingId::from("a")).await })
    };

    store.entered.notified().await;
    desk.close();
    store.release.notify_one();

    let outcome = pending.await.expect("task completes");
    assert_eq!(
        outcome,
        ModerationOutcome::Discarded {
            id: JobPostingId::from("a")
        }
    );
    assert_eq!(desk.pending_count(), 3);
    assert!(desk.notifications().is_empty());
    assert_eq!(store.inner.status_of("a").as_deref(), Some("approved"));
}

#[tokio::test]
async fn desks_are_per_session_and_close_independently() {
    let store = Arc::new(MemoryStore::seeded());
    let desks = ModerationDesks::new(Arc::clone(&store), ModerationConfig::default());
    let first = SessionToken("first".to_string());
    let second = SessionToken("second".to_string());

    let desk = desks.open(&first).await;
    desk.approve(&JobPostingId::from("a")).await;
    assert_eq!(desks.open(&first).await.pending_count(), 2);
    assert_eq!(desks.open(&second).await.pending_count(), 2);
    assert_eq!(desks.open_count(), 2);

    assert!(desks.close(&first));
    assert!(desk.is_closed());
    assert!(desks.get(&first).is_none());
    assert!(!desks.close(&first));
}

#[tokio::test]
async fn concurrent_decisions_on_one_posting_reach_the_store_once() {
    let store = Arc::new(GatedStore::seeded());
    let desk = Arc::new(loaded_desk(Arc::clone(&store)).await);
    let id = JobPostingId::from("a");

    let approval = {
        let desk = Arc::clone(&desk);
        let id = id.clone();
        tokio::spawn(async move { desk.approve(&id).await })
    };
    store.entered.notified().await;

    let rejection = desk.reject(&id).await;
    assert_eq!(rejection, ModerationOutcome::NotPending { id: id.clone() });

    store.release.notify_one();
    let approval = approval.await.expect("task completes");
    assert_eq!(
        approval,
        ModerationOutcome::Applied {
            id: id.clone(),
            status: PostingStatus::Approved,
        }
    );
    assert_eq!(store.inner.update_calls(), 1);
    assert_eq!(store.inner.status_of("a").as_deref(), Some("approved"));
    assert_eq!(desk.notifications().len(), 1);
    assert_eq!(visible_ids(&desk), vec!["b", "c"]);
}

#[tokio::test]
async fn failed_decision_can_be_retried() {
    let store = Arc::new(MemoryStore::seeded());
    let desk = loaded_desk(Arc::clone(&store)).await;
    let id = JobPostingId::from("b");

    store.fail_updates(true);
    assert!(matches!(desk.reject(&id).await, ModerationOutcome::Failed { .. }));

    store.fail_updates(false);
    assert!(matches!(
        desk.reject(&id).await,
        ModerationOutcome::Applied {
            status: PostingStatus::Rejected,
            ..
        }
    ));
    assert_eq!(store.update_calls(), 2);
}

#[tokio::test]
async fn stale_rows_drop_out_when_the_store_has_moved_on() {
    let store = Arc::new(MemoryStore::seeded());
    let desks = ModerationDesks::new(Arc::clone(&store), ModerationConfig::default());
    let first = desks.open(&SessionToken("first".to_string())).await;
    let second = desks.open(&SessionToken("second".to_string())).await;
    let id = JobPostingId::from("a");

    assert!(matches!(first.approve(&id).await, ModerationOutcome::Applied { .. }));
    assert!(second.contains(&id));

    let outcome = second.reject(&id).await;

    assert_eq!(outcome, ModerationOutcome::NotPending { id: id.clone() });
    assert!(!second.contains(&id));
    assert!(second.notifications().is_empty());
    assert_eq!(store.status_of("a").as_deref(), Some("approved"));
}

#[tokio::test]
async fn refresh_shows_postings_created_and_decided_elsewhere() {
    let store = Arc::new(MemoryStore::seeded());
    let desks = ModerationDesks::new(Arc::clone(&store), ModerationConfig::default());
    let first = SessionToken("first".to_string());
    let second = SessionToken("second".to_string());
    desks.open(&first).await;
    desks.open(&second).await;

    desks
        .open(&first)
        .await
        .approve(&JobPostingId::from("a"))
        .await;
    store
        .create(NewPosting {
            title: "Site Reliability Engineer".to_string(),
            company: "Fabrikam".to_string(),
            location: "Remote".to_string(),
            experience: "3+ years".to_string(),
            description: "Keep it running.".to_string(),
            salary: "$130,000".to_string(),
            is_remote: true,
        })
        .await
        .expect("posting created");

    assert_eq!(visible_ids(&*desks.open(&second).await), vec!["a", "b", "c"]);
    let refreshed = desks.refresh(&second).await;
    assert_eq!(visible_ids(&refreshed), vec!["b", "c", "new-1"]);
    assert_eq!(desks.open_count(), 2);
}

#[tokio::test]
async fn first_open_registers_the_desk_only_after_loading() {
    let store = Arc::new(GatedStore::holding_fetches());
    let desks = Arc::new(ModerationDesks::new(
        Arc::clone(&store),
        ModerationConfig::default(),
    ));
    let token = SessionToken("counselor".to_string());

    let opening = {
        let desks = Arc::clone(&desks);
        let token = token.clone();
        tokio::spawn(async move { desks.open(&token).await })
    };
    store.entered.notified().await;

    assert!(desks.get(&token).is_none());
    assert_eq!(desks.open_count(), 0);

    store.release.notify_one();
    let desk = opening.await.expect("task completes");
    assert_eq!(desk.pending_count(), 3);
    assert!(Arc::ptr_eq(&desk, &desks.get(&token).expect("desk registered")));
}

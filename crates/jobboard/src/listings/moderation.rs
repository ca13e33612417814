use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::debounce::Debounced;
use super::domain::{JobPosting, JobPostingId, PostingSnapshot, PostingStatus};
use super::filter::{filter_postings, FilterState};
use super::store::{ListingStore, StoreError};
use crate::config::ModerationConfig;
use crate::session::{SessionObserver, SessionToken};

/// Operator decision on a pending posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDecision {
    Approve,
    Reject,
}

impl ModerationDecision {
    pub const fn target_status(self) -> PostingStatus {
        match self {
            ModerationDecision::Approve => PostingStatus::Approved,
            ModerationDecision::Reject => PostingStatus::Rejected,
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            ModerationDecision::Approve => "approve",
            ModerationDecision::Reject => "reject",
        }
    }
}

/// Result of a single approve/reject call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModerationOutcome {
    Applied {
        id: JobPostingId,
        status: PostingStatus,
    },
    NotPending {
        id: JobPostingId,
    },
    Failed {
        id: JobPostingId,
        reason: String,
    },
    Discarded {
        id: JobPostingId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient operator-facing message, e.g. a toast in a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<JobPostingId>,
    pub recorded_at: DateTime<Utc>,
}

impl Notification {
    fn decided(decision: ModerationDecision, id: &JobPostingId) -> Self {
        let status = decision.target_status();
        Self {
            kind: NotificationKind::Success,
            title: status.display_name().to_string(),
            description: format!("Job posting has been {}.", status.label()),
            posting_id: Some(id.clone()),
            recorded_at: Utc::now(),
        }
    }

    fn failed(decision: ModerationDecision, id: &JobPostingId) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: format!("Failed to {} the job.", decision.verb()),
            posting_id: Some(id.clone()),
            recorded_at: Utc::now(),
        }
    }
}

/// Filters as seen by the operator: what is applied and what is still settling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSnapshot {
    pub applied: FilterState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_search_term: Option<String>,
}

#[derive(Debug)]
struct DeskState {
    postings: PostingSnapshot,
    search: Debounced<String>,
    location: String,
    experience: String,
    in_flight: HashSet<JobPostingId>,
    decided: HashSet<JobPostingId>,
}

impl DeskState {
    fn applied_filter(&mut self) -> FilterState {
        FilterState {
            search_term: self.search.settle().clone(),
            location: self.location.clone(),
            experience: self.experience.clone(),
        }
    }

    fn contains(&self, id: &JobPostingId) -> bool {
        self.postings
            .iter()
            .flatten()
            .any(|posting| &posting.id == id)
    }

    fn remove(&mut self, id: &JobPostingId) {
        self.postings
            .retain(|posting| posting.as_ref().map_or(true, |posting| &posting.id != id));
    }
}

/// Claim on a posting while its decision is with the store. Released on drop.
struct InFlight<'a> {
    state: &'a Mutex<DeskState>,
    id: JobPostingId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(&self.id);
    }
}

/// One operator's view of the moderation queue.
///
/// The pending view is only changed after the listing store acknowledges a
/// decision. Once the desk is closed, late store responses are dropped.
pub struct ModerationDesk<S: ?Sized> {
    store: Arc<S>,
    state: Mutex<DeskState>,
    notifications: Mutex<Vec<Notification>>,
    closed: AtomicBool,
}

impl<S> ModerationDesk<S>
where
    S: ListingStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: &ModerationConfig) -> Self {
        Self {
            store,
            state: Mutex::new(DeskState {
                postings: Vec::new(),
                search: Debounced::new(String::new(), config.search_debounce),
                location: String::new(),
                experience: String::new(),
                in_flight: HashSet::new(),
                decided: HashSet::new(),
            }),
            notifications: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the view with the store's pending postings. Fetch failures leave an empty view.
    ///
    /// Postings this desk has already decided stay out even if the fetch raced the decision.
    pub async fn load(&self) -> usize {
        let postings = match self.store.fetch_pending().await {
            Ok(postings) => postings,
            Err(err) => {
                error!(error = %err, "failed to fetch job postings");
                Vec::new()
            }
        };

        if self.is_closed() {
            debug!("moderation desk closed before postings loaded");
            return 0;
        }

        let mut state = self.state();
        let postings: PostingSnapshot = postings
            .into_iter()
            .map(|posting| posting.filter(|posting| !state.decided.contains(&posting.id)))
            .collect();
        let loaded = postings.iter().flatten().count();
        state.postings = postings;
        drop(state);
        info!(pending = loaded, "moderation queue loaded");
        loaded
    }

    pub async fn approve(&self, id: &JobPostingId) -> ModerationOutcome {
        self.decide(id, ModerationDecision::Approve).await
    }

    pub async fn reject(&self, id: &JobPostingId) -> ModerationOutcome {
        self.decide(id, ModerationDecision::Reject).await
    }

    pub async fn decide(&self, id: &JobPostingId, decision: ModerationDecision) -> ModerationOutcome {
        let Some(_claim) = self.claim(id) else {
            debug!(posting_id = %id, "posting not pending or already being decided");
            return ModerationOutcome::NotPending { id: id.clone() };
        };

        let status = decision.target_status();
        let result = self.store.update_status(id, status).await;

        if self.is_closed() {
            debug!(posting_id = %id, "discarding moderation result for closed desk");
            return ModerationOutcome::Discarded { id: id.clone() };
        }

        match result {
            Ok(()) => {
                self.settle(id);
                self.notify(Notification::decided(decision, id));
                info!(posting_id = %id, %status, "posting moderated");
                ModerationOutcome::Applied {
                    id: id.clone(),
                    status,
                }
            }
            Err(err @ (StoreError::NotFound(_) | StoreError::InvalidTransition { .. })) => {
                self.settle(id);
                info!(posting_id = %id, error = %err, "posting no longer pending in the store");
                ModerationOutcome::NotPending { id: id.clone() }
            }
            Err(err) => {
                warn!(posting_id = %id, error = %err, "failed to {} posting", decision.verb());
                self.notify(Notification::failed(decision, id));
                ModerationOutcome::Failed {
                    id: id.clone(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Record a new search term. It applies once the input has been idle for the configured period.
    pub fn set_search_term(&self, term: impl Into<String>) {
        self.state().search.input(term.into());
    }

    /// Location and experience selections apply immediately; the search term is debounced.
    pub fn update_filters(&self, filters: FilterState) {
        let mut state = self.state();
        state.search.input(filters.search_term);
        state.location = filters.location;
        state.experience = filters.experience;
    }

    pub fn filters(&self) -> FilterSnapshot {
        let mut state = self.state();
        let applied = state.applied_filter();
        FilterSnapshot {
            applied,
            pending_search_term: state.search.pending().cloned(),
        }
    }

    /// Pending postings matching the filters currently in effect.
    pub fn visible(&self) -> Vec<JobPosting> {
        let mut state = self.state();
        let filter = state.applied_filter();
        filter_postings(&state.postings, &filter)
    }

    /// Like [`visible`](Self::visible), but waits for the search term to settle first.
    pub async fn visible_when_settled(&self) -> Vec<JobPosting> {
        loop {
            let deadline = {
                let mut state = self.state();
                state.search.settle();
                state.search.deadline()
            };
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => break,
            }
        }
        self.visible()
    }

    pub fn contains(&self, id: &JobPostingId) -> bool {
        self.state().contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.state().postings.iter().flatten().count()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications_guard().clone()
    }

    /// Hand out and forget the recorded notifications.
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications_guard())
    }

    /// Tear the desk down; any store call still in flight will not touch the view.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark `id` as being decided, unless it is absent from the view or already claimed.
    fn claim(&self, id: &JobPostingId) -> Option<InFlight<'_>> {
        let mut state = self.state();
        if !state.contains(id) || !state.in_flight.insert(id.clone()) {
            return None;
        }
        Some(InFlight {
            state: &self.state,
            id: id.clone(),
        })
    }

    fn settle(&self, id: &JobPostingId) {
        let mut state = self.state();
        state.remove(id);
        state.decided.insert(id.clone());
    }

    fn notify(&self, notification: Notification) {
        self.notifications_guard().push(notification);
    }

    fn state(&self) -> MutexGuard<'_, DeskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notifications_guard(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Moderation desks keyed by the session that opened them.
pub struct ModerationDesks<S: ?Sized> {
    store: Arc<S>,
    config: ModerationConfig,
    desks: Mutex<HashMap<SessionToken, Arc<ModerationDesk<S>>>>,
}

impl<S> ModerationDesks<S>
where
    S: ListingStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: ModerationConfig) -> Self {
        Self {
            store,
            config,
            desks: Mutex::new(HashMap::new()),
        }
    }

    /// The session's desk, loading the pending queue the first time it is opened.
    ///
    /// A new desk is only registered once its queue has loaded. When two first
    /// opens race, the desk registered first wins.
    pub async fn open(&self, token: &SessionToken) -> Arc<ModerationDesk<S>> {
        if let Some(desk) = self.get(token) {
            return desk;
        }

        let desk = Arc::new(ModerationDesk::new(Arc::clone(&self.store), &self.config));
        desk.load().await;
        Arc::clone(self.desks().entry(token.clone()).or_insert(desk))
    }

    /// The session's desk with its pending view reloaded from the store.
    pub async fn refresh(&self, token: &SessionToken) -> Arc<ModerationDesk<S>> {
        match self.get(token) {
            Some(desk) => {
                desk.load().await;
                desk
            }
            None => self.open(token).await,
        }
    }

    pub fn get(&self, token: &SessionToken) -> Option<Arc<ModerationDesk<S>>> {
        self.desks().get(token).cloned()
    }

    pub fn close(&self, token: &SessionToken) -> bool {
        match self.desks().remove(token) {
            Some(desk) => {
                desk.close();
                true
            }
            None => false,
        }
    }

    pub fn open_count(&self) -> usize {
        self.desks().len()
    }

    fn desks(&self) -> MutexGuard<'_, HashMap<SessionToken, Arc<ModerationDesk<S>>>> {
        self.desks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> SessionObserver for ModerationDesks<S>
where
    S: ListingStore + ?Sized,
{
    fn session_ended(&self, token: &SessionToken) {
        if self.close(token) {
            debug!("moderation desk closed with its session");
        }
    }
}

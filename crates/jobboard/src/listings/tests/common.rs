use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::ModerationConfig;
use crate::listings::{
    listings_router, JobPostingId, ListingDocument, ListingStore, ListingsState, ModerationDesks,
    NewPosting, PostingStatus, StoreError,
};
use crate::session::{
    Credentials, DirectoryError, IdentityError, IdentityProvider, Registration, Role,
    SessionRegistry, SessionToken, UserDirectory, UserId, UserRecord,
};

pub(super) fn document(
    id: &str,
    title: &str,
    location: &str,
    experience: &str,
    status: PostingStatus,
) -> ListingDocument {
    ListingDocument {
        id: JobPostingId::from(id),
        title: Some(title.to_string()),
        company: Some("Contoso".to_string()),
        location: Some(location.to_string()),
        experience: Some(experience.to_string()),
        status: Some(status.label().to_string()),
        posted_on: Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).single(),
        description: Some("Build things.".to_string()),
        salary: Some("$90,000 - $110,000".to_string()),
        is_remote: Some(location == "Remote"),
    }
}

/// Three pending postings plus one already approved.
pub(super) fn seeded_documents() -> Vec<ListingDocument> {
    vec![
        document("a", "Frontend Developer", "Remote", "2+ years", PostingStatus::Pending),
        document("b", "Backend Developer", "New York", "5+ years", PostingStatus::Pending),
        document("c", "Data Scientist", "San Francisco", "2+ years", PostingStatus::Pending),
        document("d", "Product Manager", "Remote", "5+ years", PostingStatus::Approved),
    ]
}

#[derive(Default)]
pub(super) struct MemoryStore {
    documents: Mutex<BTreeMap<JobPostingId, ListingDocument>>,
    update_calls: AtomicUsize,
    fail_updates: AtomicBool,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub(super) fn with_documents(documents: Vec<ListingDocument>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.documents.lock().expect("store mutex poisoned");
            for document in documents {
                guard.insert(document.id.clone(), document);
            }
        }
        store
    }

    pub(super) fn seeded() -> Self {
        Self::with_documents(seeded_documents())
    }

    pub(super) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(super) fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub(super) fn status_of(&self, id: &str) -> Option<String> {
        let guard = self.documents.lock().expect("store mutex poisoned");
        guard
            .get(&JobPostingId::from(id))
            .and_then(|document| document.status.clone())
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError> {
        let guard = self.documents.lock().expect("store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    async fn update_status(
        &self,
        id: &JobPostingId,
        status: PostingStatus,
    ) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }

        let mut guard = self.documents.lock().expect("store mutex poisoned");
        let document = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let current = document
            .status
            .as_deref()
            .and_then(PostingStatus::parse)
            .unwrap_or(PostingStatus::Pending);
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: current,
                to: status,
            });
        }
        document.status = Some(status.label().to_string());
        Ok(())
    }

    async fn create(&self, posting: NewPosting) -> Result<JobPostingId, StoreError> {
        let next = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = JobPostingId(format!("new-{next}"));
        let document = posting.into_document(id.clone(), Utc::now());
        self.documents
            .lock()
            .expect("store mutex poisoned")
            .insert(id.clone(), document);
        Ok(id)
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl ListingStore for UnavailableStore {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn update_status(
        &self,
        _id: &JobPostingId,
        _status: PostingStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn create(&self, _posting: NewPosting) -> Result<JobPostingId, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Holds every status update (and optionally every fetch) until released.
pub(super) struct GatedStore {
    pub(super) inner: MemoryStore,
    pub(super) entered: Notify,
    pub(super) release: Notify,
    hold_fetches: bool,
}

impl GatedStore {
    pub(super) fn seeded() -> Self {
        Self {
            inner: MemoryStore::seeded(),
            entered: Notify::new(),
            release: Notify::new(),
            hold_fetches: false,
        }
    }

    pub(super) fn holding_fetches() -> Self {
        Self {
            hold_fetches: true,
            ..Self::seeded()
        }
    }
}

#[async_trait]
impl ListingStore for GatedStore {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError> {
        if self.hold_fetches {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_all().await
    }

    async fn update_status(
        &self,
        id: &JobPostingId,
        status: PostingStatus,
    ) -> Result<(), StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.update_status(id, status).await
    }

    async fn create(&self, posting: NewPosting) -> Result<JobPostingId, StoreError> {
        self.inner.create(posting).await
    }
}

#[derive(Default)]
pub(super) struct MemoryIdentity {
    accounts: Mutex<HashMap<String, (String, UserId)>>,
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let mut accounts = self.accounts.lock().expect("identity mutex poisoned");
        if accounts.contains_key(email) {
            return Err(IdentityError::EmailTaken(email.to_string()));
        }
        let uid = UserId(format!("uid-{}", accounts.len() + 1));
        accounts.insert(email.to_string(), (password.to_string(), uid.clone()));
        Ok(uid)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let accounts = self.accounts.lock().expect("identity mutex poisoned");
        match accounts.get(email) {
            Some((stored, uid)) if stored == password => Ok(uid.clone()),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    records: Mutex<HashMap<UserId, UserRecord>>,
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn save(&self, record: UserRecord) -> Result<(), DirectoryError> {
        self.records
            .lock()
            .expect("directory mutex poisoned")
            .insert(record.uid.clone(), record);
        Ok(())
    }

    async fn find(&self, uid: &UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self
            .records
            .lock()
            .expect("directory mutex poisoned")
            .get(uid)
            .cloned())
    }
}

pub(super) struct Harness<S: ?Sized> {
    pub(super) store: Arc<S>,
    pub(super) sessions: Arc<SessionRegistry>,
    pub(super) desks: Arc<ModerationDesks<S>>,
}

impl<S> Harness<S>
where
    S: ListingStore + 'static,
{
    pub(super) fn new(store: S) -> Self {
        let store = Arc::new(store);
        let desks = Arc::new(ModerationDesks::new(
            Arc::clone(&store),
            ModerationConfig::default(),
        ));
        let sessions = Arc::new(
            SessionRegistry::new(
                Arc::new(MemoryIdentity::default()),
                Arc::new(MemoryDirectory::default()),
            )
            .with_observer(desks.clone()),
        );
        Self {
            store,
            sessions,
            desks,
        }
    }

    pub(super) fn router(&self) -> Router {
        listings_router(Arc::new(ListingsState::new(
            Arc::clone(&self.store),
            Arc::clone(&self.sessions),
            Arc::clone(&self.desks),
        )))
    }

    pub(super) async fn sign_in_as(&self, role: Role) -> SessionToken {
        let email = format!("{}@example.com", role.label());
        let registration = Registration {
            full_name: format!("Test {}", role.label()),
            email: email.clone(),
            password: "hunter22".to_string(),
            role,
        };
        self.sessions
            .register(registration)
            .await
            .expect("registration succeeds");
        self.sessions
            .sign_in(Credentials {
                email,
                password: "hunter22".to_string(),
            })
            .await
            .expect("sign in succeeds")
            .token
    }
}

pub(super) fn authorized(
    builder: axum::http::request::Builder,
    token: &SessionToken,
) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {}", token.as_str()))
}

pub(super) fn empty_request(
    method: &str,
    uri: &str,
    token: Option<&SessionToken>,
) -> Request<axum::body::Body> {
    let builder = Request::builder().method(method).uri(uri);
    let builder = match token {
        Some(token) => authorized(builder, token),
        None => builder,
    };
    builder
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    token: Option<&SessionToken>,
    body: &Value,
) -> Request<axum::body::Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let builder = match token {
        Some(token) => authorized(builder, token),
        None => builder,
    };
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("json body"),
        ))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

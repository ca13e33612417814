use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use jobboard::candidates::{
    ApplicationDesk, ApplicationId, ApplicationInbox, ApplicationRecord, InboxError,
    ResumeLayout,
};
use jobboard::config::{ModerationConfig, ResumeConfig};
use jobboard::listings::{
    JobPostingId, ListingDocument, ListingStore, ModerationDesks, NewPosting, PostingStatus,
    StoreError,
};
use jobboard::session::{
    DirectoryError, IdentityError, IdentityProvider, SessionRegistry, UserDirectory, UserId,
    UserRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process adapters wired behind the domain routers.
pub(crate) struct Services {
    pub(crate) store: Arc<InMemoryListingStore>,
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) desks: Arc<ModerationDesks<InMemoryListingStore>>,
    pub(crate) inbox: Arc<InMemoryApplicationInbox>,
    pub(crate) resume_layout: ResumeLayout,
}

impl Services {
    pub(crate) fn in_memory(
        store: InMemoryListingStore,
        moderation: &ModerationConfig,
        resume: &ResumeConfig,
    ) -> Self {
        let store = Arc::new(store);
        let desks = Arc::new(ModerationDesks::new(Arc::clone(&store), moderation.clone()));
        let sessions = Arc::new(
            SessionRegistry::new(
                Arc::new(InMemoryIdentityProvider::default()),
                Arc::new(InMemoryUserDirectory::default()),
            )
            .with_observer(desks.clone()),
        );

        Self {
            store,
            sessions,
            desks,
            inbox: Arc::new(InMemoryApplicationInbox::default()),
            resume_layout: ResumeLayout::from_config(resume),
        }
    }

    pub(crate) fn application_desk(
        &self,
    ) -> ApplicationDesk<InMemoryListingStore, InMemoryApplicationInbox> {
        ApplicationDesk::new(Arc::clone(&self.store), Arc::clone(&self.inbox))
    }
}

/// Listing documents kept in insertion order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingStore {
    documents: Arc<Mutex<Vec<ListingDocument>>>,
}

impl InMemoryListingStore {
    pub(crate) fn with_documents(documents: Vec<ListingDocument>) -> Self {
        Self {
            documents: Arc::new(Mutex::new(documents)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.lock().expect("listing mutex poisoned").len()
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn fetch_all(&self) -> Result<Vec<ListingDocument>, StoreError> {
        let guard = self.documents.lock().expect("listing mutex poisoned");
        Ok(guard.clone())
    }

    async fn update_status(
        &self,
        id: &JobPostingId,
        status: PostingStatus,
    ) -> Result<(), StoreError> {
        let mut guard = self.documents.lock().expect("listing mutex poisoned");
        let document = guard
            .iter_mut()
            .find(|document| &document.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let current = match document.status.as_deref() {
            None | Some("") => PostingStatus::Pending,
            Some(raw) => PostingStatus::parse(raw).ok_or_else(|| {
                StoreError::Malformed(format!("posting {id} has unknown status '{raw}'"))
            })?,
        };
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
        let id = JobPostingId(uuid::Uuid::new_v4().to_string());
        let document = posting.into_document(id.clone(), Utc::now());
        self.documents
            .lock()
            .expect("listing mutex poisoned")
            .push(document);
        Ok(id)
    }
}

/// Email/password accounts with Argon2id password hashes.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, (UserId, String)>>>,
}

impl InMemoryIdentityProvider {
    fn hash_password(password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| IdentityError::Unavailable(format!("password hashing failed: {err}")))
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|err| IdentityError::Unavailable(format!("invalid password hash: {err}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(IdentityError::Unavailable(format!(
                "password verification failed: {err}"
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let key = email.trim().to_ascii_lowercase();
        let hash = Self::hash_password(password)?;

        let mut guard = self.accounts.lock().expect("identity mutex poisoned");
        if guard.contains_key(&key) {
            return Err(IdentityError::EmailTaken(email.to_string()));
        }
        let uid = UserId(uuid::Uuid::new_v4().to_string());
        guard.insert(key, (uid.clone(), hash));
        Ok(uid)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let key = email.trim().to_ascii_lowercase();
        let account = self
            .accounts
            .lock()
            .expect("identity mutex poisoned")
            .get(&key)
            .cloned();

        match account {
            Some((uid, hash)) if Self::verify_password(password, &hash)? => Ok(uid),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    records: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn save(&self, record: UserRecord) -> Result<(), DirectoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        guard.insert(record.uid.clone(), record);
        Ok(())
    }

    async fn find(&self, uid: &UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        Ok(guard.get(uid).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationInbox {
    records: Arc<Mutex<Vec<ApplicationRecord>>>,
}

impl InMemoryApplicationInbox {
    pub(crate) fn records(&self) -> Vec<ApplicationRecord> {
        self.records.lock().expect("inbox mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationInbox for InMemoryApplicationInbox {
    async fn submit(&self, record: ApplicationRecord) -> Result<ApplicationId, InboxError> {
        let id = record.id.clone();
        self.records
            .lock()
            .expect("inbox mutex poisoned")
            .push(record);
        Ok(id)
    }
}

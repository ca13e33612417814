use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Capability, Credentials, Registration, Role, SessionToken, UserId, UserProfile, UserRecord,
};
use super::provider::{DirectoryError, IdentityError, IdentityProvider, UserDirectory};
use crate::forms::FieldErrors;

/// Everything a request needs to know about its caller, resolved once at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub token: SessionToken,
    pub user: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.user.role.allows(capability)
    }
}

/// Notified when a session ends so per-session state can be torn down.
pub trait SessionObserver: Send + Sync {
    fn session_ended(&self, token: &SessionToken);
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("registration is incomplete: {0}")]
    Invalid(#[from] FieldErrors),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("no usable profile for user {0}")]
    ProfileMissing(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("sign in required")]
    Unauthenticated,
    #[error("{role} accounts cannot {capability}")]
    Forbidden { role: Role, capability: Capability },
}

/// Active sessions keyed by bearer token.
pub struct SessionRegistry {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn UserDirectory>,
    sessions: RwLock<HashMap<SessionToken, SessionContext>>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionRegistry {
    pub fn new(identity: Arc<dyn IdentityProvider>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            identity,
            directory,
            sessions: RwLock::new(HashMap::new()),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub async fn register(&self, registration: Registration) -> Result<UserProfile, SessionError> {
        registration.validate()?;
        let Registration {
            full_name,
            email,
            password,
            role,
        } = registration;

        let uid = self.identity.create_account(&email, &password).await?;
        let profile = UserProfile {
            uid,
            full_name,
            email,
            role,
        };
        self.directory.save(UserRecord::from(profile.clone())).await?;
        info!(uid = %profile.uid, role = %profile.role, "account registered");
        Ok(profile)
    }

    /// Verify credentials and load the profile. The role is read here and nowhere else.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SessionContext, SessionError> {
        let uid = self
            .identity
            .verify(&credentials.email, &credentials.password)
            .await?;
        let user = self
            .directory
            .find(&uid)
            .await?
            .and_then(UserRecord::into_profile)
            .ok_or_else(|| SessionError::ProfileMissing(uid.clone()))?;

        let context = SessionContext {
            token: SessionToken::generate(),
            user,
            signed_in_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context.token.clone(), context.clone());
        info!(uid = %uid, role = %context.role(), "session started");
        Ok(context)
    }

    /// End a session. Returns whether the token was active.
    pub fn sign_out(&self, token: &SessionToken) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);

        match removed {
            Some(context) => {
                for observer in &self.observers {
                    observer.session_ended(token);
                }
                info!(uid = %context.user.uid, "session ended");
                true
            }
            None => false,
        }
    }

    pub fn context(&self, token: &SessionToken) -> Option<SessionContext> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    pub fn authorize(
        &self,
        token: Option<&SessionToken>,
        capability: Capability,
    ) -> Result<SessionContext, AccessError> {
        let context = token
            .and_then(|token| self.context(token))
            .ok_or(AccessError::Unauthenticated)?;

        if context.can(capability) {
            Ok(context)
        } else {
            warn!(uid = %context.user.uid, role = %context.role(), %capability, "access denied");
            Err(AccessError::Forbidden {
                role: context.role(),
                capability,
            })
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Capability handle passed to code that needs the current user and nothing else.
#[derive(Clone)]
pub struct SessionHandle {
    registry: Arc<SessionRegistry>,
    context: SessionContext,
}

impl SessionHandle {
    pub fn resolve(registry: Arc<SessionRegistry>, token: &SessionToken) -> Option<Self> {
        let context = registry.context(token)?;
        Some(Self { registry, context })
    }

    pub fn current_user(&self) -> &UserProfile {
        &self.context.user
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn sign_out(self) -> bool {
        self.registry.sign_out(&self.context.token)
    }
}

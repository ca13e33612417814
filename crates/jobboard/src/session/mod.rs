//! Accounts, roles, and the per-request session context.

pub mod domain;
pub mod navigation;
pub mod provider;
pub mod registry;
pub mod router;

pub use domain::{
    Capability, Credentials, Registration, Role, SessionToken, UserId, UserProfile, UserRecord,
    MIN_PASSWORD_LEN,
};
pub use navigation::{resolve_redirect, NavLink, NavigationProfile, SignInVariant};
pub use provider::{DirectoryError, IdentityError, IdentityProvider, UserDirectory};
pub use registry::{
    AccessError, SessionContext, SessionError, SessionHandle, SessionObserver, SessionRegistry,
};
pub use router::{bearer_token, session_router};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::forms::{looks_like_email, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer token handed out at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Account role chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Candidate,
    Employer,
    Counselor,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Employer => "employer",
            Role::Counselor => "counselor",
        }
    }

    /// Accepts any casing; "student" is the legacy name for candidates.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "candidate" | "student" => Some(Role::Candidate),
            "employer" => Some(Role::Employer),
            "counselor" => Some(Role::Counselor),
            _ => None,
        }
    }

    pub const fn allows(self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Role::Counselor, Capability::Moderate)
                | (Role::Counselor, Capability::PostJobs)
                | (Role::Employer, Capability::PostJobs)
                | (Role::Candidate, Capability::Apply)
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| format!("unknown role '{value}'"))
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.label().to_string()
    }
}

/// Things a signed-in user may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Moderate,
    PostJobs,
    Apply,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Capability::Moderate => "moderate postings",
            Capability::PostJobs => "post jobs",
            Capability::Apply => "apply to jobs",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// Directory document; older rows may be missing any field but the uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: UserId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserRecord {
    /// A usable profile needs a recognizable role; name and email fall back to placeholders.
    pub fn into_profile(self) -> Option<UserProfile> {
        let role = self.role.as_deref().and_then(Role::parse)?;
        Some(UserProfile {
            uid: self.uid,
            full_name: self
                .full_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "No Name".to_string()),
            email: self
                .email
                .filter(|email| !email.is_empty())
                .unwrap_or_else(|| "No Email".to_string()),
            role,
        })
    }
}

impl From<UserProfile> for UserRecord {
    fn from(profile: UserProfile) -> Self {
        Self {
            uid: profile.uid,
            full_name: Some(profile.full_name),
            email: Some(profile.email),
            role: Some(profile.role.label().to_string()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Candidate
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Registration {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("full_name", &self.full_name);
        if errors.require("email", &self.email) && !looks_like_email(&self.email) {
            errors.insert("email", "Invalid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_legacy_and_cased_names() {
        assert_eq!(Role::parse("Student"), Some(Role::Candidate));
        assert_eq!(Role::parse("COUNSELOR"), Some(Role::Counselor));
        assert_eq!(Role::parse("admin"), None);

        let role: Role = serde_json::from_str("\"Employer\"").expect("role deserializes");
        assert_eq!(role, Role::Employer);
        assert_eq!(serde_json::to_string(&role).expect("serializes"), "\"employer\"");
    }

    #[test]
    fn only_counselors_moderate() {
        assert!(Role::Counselor.allows(Capability::Moderate));
        assert!(!Role::Employer.allows(Capability::Moderate));
        assert!(Role::Employer.allows(Capability::PostJobs));
        assert!(!Role::Candidate.allows(Capability::PostJobs));
        assert!(Role::Candidate.allows(Capability::Apply));
    }

    #[test]
    fn records_without_a_role_are_unusable() {
        let record = UserRecord {
            uid: UserId("u-1".to_string()),
            full_name: None,
            email: None,
            role: Some("Counselor".to_string()),
        };
        let profile = record.clone().into_profile().expect("profile with role");
        assert_eq!(profile.full_name, "No Name");
        assert_eq!(profile.email, "No Email");

        let missing = UserRecord { role: None, ..record };
        assert!(missing.into_profile().is_none());
    }

    #[test]
    fn registration_validation_reports_each_field() {
        let registration = Registration {
            full_name: String::new(),
            email: "not-an-email".to_string(),
            password: "abc".to_string(),
            role: Role::Employer,
        };
        let errors = registration.validate().expect_err("invalid registration");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("email"), Some("Invalid email address"));
    }
}

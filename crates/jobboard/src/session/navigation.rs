use serde::Serialize;

use super::domain::Role;
use super::registry::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const fn link(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href }
}

const ANONYMOUS_LINKS: [NavLink; 2] = [link("Help", "/help"), link("Login", "/login")];

const SIGNED_IN_LINKS: [NavLink; 4] = [
    link("Grades", "/grades"),
    link("GPA", "/gpa"),
    link("Help", "/help"),
    link("Logout", "/logout"),
];

/// Navigation entries for the current visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationProfile {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub links: Vec<NavLink>,
}

impl NavigationProfile {
    pub fn anonymous() -> Self {
        Self {
            signed_in: false,
            display_name: None,
            role: None,
            links: ANONYMOUS_LINKS.to_vec(),
        }
    }

    pub fn for_session(context: &SessionContext) -> Self {
        let role = context.role();
        let mut links = role_links(role).to_vec();
        links.extend_from_slice(&SIGNED_IN_LINKS);
        Self {
            signed_in: true,
            display_name: Some(context.user.full_name.clone()),
            role: Some(role),
            links,
        }
    }

    pub fn resolve(context: Option<&SessionContext>) -> Self {
        context.map_or_else(Self::anonymous, Self::for_session)
    }
}

fn role_links(role: Role) -> &'static [NavLink] {
    const CANDIDATE: [NavLink; 2] = [
        link("Apply", "/submit"),
        link("Résumé builder", "/quick-find"),
    ];
    const EMPLOYER: [NavLink; 1] = [link("Post a job", "/createJob")];
    const COUNSELOR: [NavLink; 2] = [
        link("Moderation", "/adminpanel"),
        link("Post a job", "/createJob"),
    ];

    match role {
        Role::Candidate => &CANDIDATE,
        Role::Employer => &EMPLOYER,
        Role::Counselor => &COUNSELOR,
    }
}

/// The two sign-in screens. Both share one credential flow and differ only in copy and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInVariant {
    Candidate,
    Employer,
}

impl SignInVariant {
    pub const fn path(self) -> &'static str {
        match self {
            SignInVariant::Candidate => "/login",
            SignInVariant::Employer => "/employee-login",
        }
    }

    pub const fn heading(self) -> &'static str {
        match self {
            SignInVariant::Candidate => "Student Login",
            SignInVariant::Employer => "Employer Login",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/login" => Some(SignInVariant::Candidate),
            "/employee-login" => Some(SignInVariant::Employer),
            _ => None,
        }
    }
}

/// Post-login destination. Only same-site relative paths are honoured.
pub fn resolve_redirect(redirect: Option<&str>) -> String {
    let target = redirect.map(str::trim).unwrap_or_default();
    if target.starts_with("//") || target.contains("://") || target.contains('\\') {
        return "/".to_string();
    }
    match target.strip_prefix('/').unwrap_or(target) {
        "" => "/".to_string(),
        path => format!("/{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::domain::{SessionToken, UserId, UserProfile};
    use chrono::Utc;

    fn context(role: Role) -> SessionContext {
        SessionContext {
            token: SessionToken("t".to_string()),
            user: UserProfile {
                uid: UserId("u".to_string()),
                full_name: "Dana Reyes".to_string(),
                email: "dana@example.com".to_string(),
                role,
            },
            signed_in_at: Utc::now(),
        }
    }

    fn labels(profile: &NavigationProfile) -> Vec<&'static str> {
        profile.links.iter().map(|link| link.label).collect()
    }

    #[test]
    fn anonymous_visitors_see_help_and_login() {
        assert_eq!(labels(&NavigationProfile::resolve(None)), vec!["Help", "Login"]);
    }

    #[test]
    fn counselors_get_moderation_ahead_of_common_links() {
        let profile = NavigationProfile::for_session(&context(Role::Counselor));
        assert_eq!(
            labels(&profile),
            vec!["Moderation", "Post a job", "Grades", "GPA", "Help", "Logout"]
        );
        assert_eq!(profile.display_name.as_deref(), Some("Dana Reyes"));
    }

    #[test]
    fn candidates_never_see_moderation() {
        let profile = NavigationProfile::for_session(&context(Role::Candidate));
        assert!(!labels(&profile).contains(&"Moderation"));
        assert!(labels(&profile).contains(&"Apply"));
    }

    #[test]
    fn redirects_stay_on_site() {
        assert_eq!(resolve_redirect(Some("adminpanel")), "/adminpanel");
        assert_eq!(resolve_redirect(Some("/createJob")), "/createJob");
        assert_eq!(resolve_redirect(None), "/");
        assert_eq!(resolve_redirect(Some("//evil.example")), "/");
        assert_eq!(resolve_redirect(Some("https://evil.example")), "/");
    }

    #[test]
    fn sign_in_variants_map_to_paths() {
        assert_eq!(SignInVariant::from_path("/employee-login"), Some(SignInVariant::Employer));
        assert_eq!(SignInVariant::Candidate.path(), "/login");
        assert_eq!(SignInVariant::from_path("/signup"), None);
    }
}

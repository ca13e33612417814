use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Credentials, Registration, SessionToken};
use super::navigation::{resolve_redirect, NavigationProfile};
use super::provider::IdentityError;
use super::registry::{AccessError, SessionError, SessionRegistry};
use crate::error::json_error;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| SessionToken(token.to_string()))
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match self {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden { .. } => StatusCode::FORBIDDEN,
        };
        json_error(status, self.to_string())
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match self {
            SessionError::Invalid(fields) => {
                let payload = json!({
                    "error": "registration is incomplete",
                    "fields": fields,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
            }
            SessionError::Identity(IdentityError::EmailTaken(_)) => {
                json_error(StatusCode::CONFLICT, self.to_string())
            }
            SessionError::Identity(IdentityError::InvalidCredentials) => {
                json_error(StatusCode::UNAUTHORIZED, self.to_string())
            }
            SessionError::ProfileMissing(_) => json_error(StatusCode::FORBIDDEN, self.to_string()),
            SessionError::Identity(IdentityError::Unavailable(_)) | SessionError::Directory(_) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        }
    }
}

/// Account, sign-in, and navigation endpoints.
pub fn session_router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/api/v1/accounts", post(register_handler))
        .route("/api/v1/sessions", post(sign_in_handler))
        .route(
            "/api/v1/sessions/current",
            get(current_session_handler).delete(sign_out_handler),
        )
        .route("/api/v1/navigation", get(navigation_handler))
        .with_state(registry)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RedirectQuery {
    #[serde(default)]
    redirect: Option<String>,
}

pub(crate) async fn register_handler(
    State(registry): State<Arc<SessionRegistry>>,
    Json(registration): Json<Registration>,
) -> Response {
    match registry.register(registration).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn sign_in_handler(
    State(registry): State<Arc<SessionRegistry>>,
    Query(query): Query<RedirectQuery>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match registry.sign_in(credentials).await {
        Ok(context) => {
            let payload = json!({
                "token": context.token,
                "user": context.user,
                "redirect_to": resolve_redirect(query.redirect.as_deref()),
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn current_session_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    match bearer_token(&headers).and_then(|token| registry.context(&token)) {
        Some(context) => {
            let payload = json!({
                "navigation": NavigationProfile::for_session(&context),
                "session": context,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        None => AccessError::Unauthenticated.into_response(),
    }
}

pub(crate) async fn sign_out_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    match bearer_token(&headers) {
        Some(token) if registry.sign_out(&token) => StatusCode::NO_CONTENT.into_response(),
        _ => AccessError::Unauthenticated.into_response(),
    }
}

pub(crate) async fn navigation_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    let context = bearer_token(&headers).and_then(|token| registry.context(&token));
    let profile = NavigationProfile::resolve(context.as_ref());
    (StatusCode::OK, Json(profile)).into_response()
}

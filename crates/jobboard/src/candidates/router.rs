use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::application::{ApplicationDesk, ApplicationError, ApplicationForm, ApplicationInbox};
use super::resume::{ResumeDraft, ResumeExporter, ResumeLayout};
use crate::error::json_error;
use crate::listings::{ListingStore, StoreError};
use crate::session::{bearer_token, Capability, SessionRegistry};

pub struct CandidatesState<S: ?Sized, I: ?Sized> {
    pub sessions: Arc<SessionRegistry>,
    pub applications: ApplicationDesk<S, I>,
    pub layout: ResumeLayout,
    pub exporter: Arc<dyn ResumeExporter>,
}

/// Router builder for candidate applications and the résumé builder.
pub fn candidates_router<S, I>(state: Arc<CandidatesState<S, I>>) -> Router
where
    S: ListingStore + ?Sized + 'static,
    I: ApplicationInbox + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(apply_handler::<S, I>))
        .route("/api/v1/resume", post(resume_handler::<S, I>))
        .with_state(state)
}

pub(crate) async fn apply_handler<S, I>(
    State(state): State<Arc<CandidatesState<S, I>>>,
    headers: HeaderMap,
    Json(form): Json<ApplicationForm>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
    I: ApplicationInbox + ?Sized + 'static,
{
    let token = bearer_token(&headers);
    let context = match state.sessions.authorize(token.as_ref(), Capability::Apply) {
        Ok(context) => context,
        Err(err) => return err.into_response(),
    };

    match state.applications.submit(&context.user.uid, form).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(ApplicationError::Invalid(fields)) => {
            let payload = json!({
                "error": "application is incomplete",
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(err @ ApplicationError::PostingClosed(_)) => {
            json_error(StatusCode::NOT_FOUND, err.to_string())
        }
        Err(err @ ApplicationError::Store(StoreError::Unavailable(_)))
        | Err(err @ ApplicationError::Inbox(_)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        Err(other) => json_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn resume_handler<S, I>(
    State(state): State<Arc<CandidatesState<S, I>>>,
    Json(draft): Json<ResumeDraft>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
    I: ApplicationInbox + ?Sized + 'static,
{
    let document = state.layout.render(&draft);
    match state.exporter.export(&document) {
        Ok(exported) => {
            let content_type = HeaderValue::from_str(exported.content_type.as_ref())
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            let disposition =
                HeaderValue::from_str(&format!("attachment; filename=\"{}\"", exported.file_name))
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                exported.bytes,
            )
                .into_response()
        }
        Err(err) => json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

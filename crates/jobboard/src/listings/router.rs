use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use super::analytics::ListingSummary;
use super::browse::{browse, BrowseFilter};
use super::domain::{JobPostingId, PostingStatus};
use super::filter::FilterState;
use super::intake::{submit_posting, IntakeError, PostingDraft};
use super::moderation::{ModerationDecision, ModerationDesk, ModerationDesks, ModerationOutcome};
use super::store::{ListingStore, StoreError};
use crate::error::json_error;
use crate::session::{
    bearer_token, AccessError, Capability, SessionContext, SessionRegistry, SessionToken,
};

/// Shared state behind the listing and moderation endpoints.
pub struct ListingsState<S: ?Sized> {
    pub store: Arc<S>,
    pub sessions: Arc<SessionRegistry>,
    pub desks: Arc<ModerationDesks<S>>,
}

impl<S> ListingsState<S>
where
    S: ListingStore + ?Sized,
{
    pub fn new(
        store: Arc<S>,
        sessions: Arc<SessionRegistry>,
        desks: Arc<ModerationDesks<S>>,
    ) -> Self {
        Self {
            store,
            sessions,
            desks,
        }
    }

    async fn desk_for(&self, headers: &HeaderMap) -> Result<Arc<ModerationDesk<S>>, Response> {
        let context = self.authorize(headers, Capability::Moderate)?;
        let desk = self.desks.open(&context.token).await;
        self.still_signed_in(&context.token, desk)
    }

    /// Like `desk_for`, but the pending view is reloaded so the store's current state shows.
    async fn refreshed_desk_for(
        &self,
        headers: &HeaderMap,
    ) -> Result<Arc<ModerationDesk<S>>, Response> {
        let context = self.authorize(headers, Capability::Moderate)?;
        let desk = self.desks.refresh(&context.token).await;
        self.still_signed_in(&context.token, desk)
    }

    /// A sign-out that lands while the queue loads must not leave a desk behind.
    fn still_signed_in(
        &self,
        token: &SessionToken,
        desk: Arc<ModerationDesk<S>>,
    ) -> Result<Arc<ModerationDesk<S>>, Response> {
        if self.sessions.context(token).is_some() {
            return Ok(desk);
        }
        self.desks.close(token);
        Err(AccessError::Unauthenticated.into_response())
    }

    fn authorize(
        &self,
        headers: &HeaderMap,
        capability: Capability,
    ) -> Result<SessionContext, Response> {
        let token = bearer_token(headers);
        self.sessions
            .authorize(token.as_ref(), capability)
            .map_err(IntoResponse::into_response)
    }
}

/// Router builder for browsing, posting, and moderating job listings.
pub fn listings_router<S>(state: Arc<ListingsState<S>>) -> Router
where
    S: ListingStore + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/postings",
            get(browse_handler::<S>).post(create_posting_handler::<S>),
        )
        .route("/api/v1/moderation/queue", get(queue_handler::<S>))
        .route("/api/v1/moderation/filters", put(filters_handler::<S>))
        .route(
            "/api/v1/moderation/postings/:posting_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/moderation/postings/:posting_id/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/moderation/notifications",
            get(notifications_handler::<S>),
        )
        .route("/api/v1/moderation/summary", get(summary_handler::<S>))
        .with_state(state)
}

fn store_error_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        StoreError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.to_string())
}

pub(crate) async fn browse_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    Query(filter): Query<BrowseFilter>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    match state.store.fetch_catalog().await {
        Ok(catalog) => {
            let postings = browse(&catalog, &filter);
            (StatusCode::OK, Json(postings)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn create_posting_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
    Json(draft): Json<PostingDraft>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    if let Err(response) = state.authorize(&headers, Capability::PostJobs) {
        return response;
    }

    match submit_posting(state.store.as_ref(), draft).await {
        Ok(id) => {
            let payload = json!({
                "id": id,
                "status": PostingStatus::Pending,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(IntakeError::Invalid(fields)) => {
            let payload = json!({
                "error": "posting draft is incomplete",
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(IntakeError::Store(err)) => store_error_response(err),
    }
}

pub(crate) async fn queue_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    let desk = match state.refreshed_desk_for(&headers).await {
        Ok(desk) => desk,
        Err(response) => return response,
    };

    let payload = json!({
        "postings": desk.visible(),
        "pending": desk.pending_count(),
        "filters": desk.filters(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn filters_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
    Json(filters): Json<FilterState>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    let desk = match state.desk_for(&headers).await {
        Ok(desk) => desk,
        Err(response) => return response,
    };

    desk.update_filters(filters);
    (StatusCode::ACCEPTED, Json(desk.filters())).into_response()
}

pub(crate) async fn approve_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
    Path(posting_id): Path<String>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    decision_response(&state, &headers, posting_id, ModerationDecision::Approve).await
}

pub(crate) async fn reject_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
    Path(posting_id): Path<String>,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    decision_response(&state, &headers, posting_id, ModerationDecision::Reject).await
}

async fn decision_response<S>(
    state: &ListingsState<S>,
    headers: &HeaderMap,
    posting_id: String,
    decision: ModerationDecision,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    let desk = match state.desk_for(headers).await {
        Ok(desk) => desk,
        Err(response) => return response,
    };

    let outcome = desk.decide(&JobPostingId(posting_id), decision).await;
    let status = match &outcome {
        ModerationOutcome::Applied { .. } => StatusCode::OK,
        ModerationOutcome::NotPending { .. } => StatusCode::NOT_FOUND,
        ModerationOutcome::Failed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ModerationOutcome::Discarded { .. } => StatusCode::CONFLICT,
    };
    (status, Json(outcome)).into_response()
}

pub(crate) async fn notifications_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    match state.desk_for(&headers).await {
        Ok(desk) => (StatusCode::OK, Json(desk.take_notifications())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn summary_handler<S>(
    State(state): State<Arc<ListingsState<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + ?Sized + 'static,
{
    if let Err(response) = state.authorize(&headers, Capability::Moderate) {
        return response;
    }

    match state.store.fetch_catalog().await {
        Ok(catalog) => {
            let summary = ListingSummary::from_postings(&catalog);
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

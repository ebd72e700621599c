//! JSON HTTP surface over [`SchoolService`].
//!
//! The caller is identified by the `x-user-id` header set by the auth proxy;
//! its role comes from the stored profile, never from the request.

pub(crate) mod accounts;
pub(crate) mod admissions;
pub(crate) mod content;
pub(crate) mod payments;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::access::{AccessError, Caller};
use super::repository::{RecordStore, RepositoryError};
use super::service::{SchoolService, SchoolServiceError};
use super::storage::{ObjectStore, StorageError, Upload};

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-user-id";

pub(crate) type Shared<S, O> = State<Arc<SchoolService<S, O>>>;

/// Router builder exposing the school endpoints under `/api/v1`.
pub fn school_router<S, O>(service: Arc<SchoolService<S, O>>) -> Router
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/me",
            get(accounts::me_handler::<S, O>).post(accounts::sign_in_handler::<S, O>),
        )
        .route("/api/v1/users", get(accounts::list_users_handler::<S, O>))
        .route(
            "/api/v1/users/:user_id",
            patch(accounts::update_user_handler::<S, O>)
                .delete(accounts::delete_user_handler::<S, O>),
        )
        .route(
            "/api/v1/users/:user_id/role",
            put(accounts::change_role_handler::<S, O>),
        )
        .route(
            "/api/v1/students",
            get(admissions::all_students_handler::<S, O>),
        )
        .route(
            "/api/v1/students/mine",
            get(admissions::my_students_handler::<S, O>),
        )
        .route(
            "/api/v1/students/:student_id",
            patch(admissions::update_student_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions",
            get(admissions::list_admissions_handler::<S, O>)
                .post(admissions::create_admission_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions/mine",
            get(admissions::my_admissions_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions/:admission_id",
            get(admissions::admission_detail_handler::<S, O>)
                .patch(admissions::update_admission_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions/:admission_id/decision",
            post(admissions::decide_admission_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions/:admission_id/payments",
            get(payments::admission_payments_handler::<S, O>),
        )
        .route(
            "/api/v1/admissions/:admission_id/ledger",
            get(payments::admission_ledger_handler::<S, O>),
        )
        .route(
            "/api/v1/documents/:doc_key",
            post(admissions::upload_document_handler::<S, O>),
        )
        .route(
            "/api/v1/payments",
            get(payments::list_payments_handler::<S, O>)
                .post(payments::create_payment_handler::<S, O>),
        )
        .route(
            "/api/v1/payments/mine",
            get(payments::my_payments_handler::<S, O>),
        )
        .route(
            "/api/v1/payments/:payment_id/receipt",
            put(payments::attach_receipt_handler::<S, O>),
        )
        .route(
            "/api/v1/payments/:payment_id/verification",
            post(payments::verify_payment_handler::<S, O>),
        )
        .route("/api/v1/ledger/mine", get(payments::my_ledger_handler::<S, O>))
        .route(
            "/api/v1/events",
            get(content::list_events_handler::<S, O>).post(content::create_event_handler::<S, O>),
        )
        .route(
            "/api/v1/events/upcoming",
            get(content::upcoming_events_handler::<S, O>),
        )
        .route(
            "/api/v1/events/past",
            get(content::past_events_handler::<S, O>),
        )
        .route(
            "/api/v1/events/:event_id",
            patch(content::update_event_handler::<S, O>)
                .delete(content::delete_event_handler::<S, O>),
        )
        .route(
            "/api/v1/events/:event_id/photos",
            post(content::add_event_photo_handler::<S, O>),
        )
        .route(
            "/api/v1/announcements",
            get(content::list_announcements_handler::<S, O>)
                .post(content::create_announcement_handler::<S, O>),
        )
        .route(
            "/api/v1/announcements/:announcement_id",
            patch(content::update_announcement_handler::<S, O>)
                .delete(content::delete_announcement_handler::<S, O>),
        )
        .route(
            "/api/v1/queries",
            get(accounts::all_queries_handler::<S, O>)
                .post(accounts::submit_query_handler::<S, O>),
        )
        .route(
            "/api/v1/queries/mine",
            get(accounts::my_queries_handler::<S, O>),
        )
        .route(
            "/api/v1/queries/:query_id/reply",
            post(accounts::reply_query_handler::<S, O>),
        )
        .route(
            "/api/v1/queries/:query_id/close",
            post(accounts::close_query_handler::<S, O>),
        )
        .route(
            "/api/v1/dashboard/parent",
            get(accounts::parent_dashboard_handler::<S, O>),
        )
        .route(
            "/api/v1/dashboard/admin",
            get(accounts::admin_dashboard_handler::<S, O>),
        )
        .with_state(service)
}

/// Resolve the caller from the request headers.
pub(crate) fn authorize<S, O>(
    service: &SchoolService<S, O>,
    headers: &HeaderMap,
) -> Result<Caller, SchoolServiceError>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let user_id = user_id_header(headers).ok_or(AccessError::Unauthenticated)?;
    service.resolve_caller(&user_id)
}

pub(crate) fn user_id_header(headers: &HeaderMap) -> Option<super::domain::UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| super::domain::UserId(value.to_string()))
}

/// Query string accompanying raw upload bodies.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    pub(crate) file_name: String,
}

pub(crate) fn upload_from(params: UploadParams, headers: &HeaderMap, bytes: Vec<u8>) -> Upload {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    Upload {
        file_name: params.file_name,
        content_type,
        bytes,
    }
}

/// HTTP status for a service failure.
pub fn status_for(error: &SchoolServiceError) -> StatusCode {
    match error {
        SchoolServiceError::Access(AccessError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        SchoolServiceError::Access(_) => StatusCode::FORBIDDEN,
        SchoolServiceError::Transition(_) => StatusCode::CONFLICT,
        SchoolServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        SchoolServiceError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchoolServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SchoolServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SchoolServiceError::Storage(StorageError::AlreadyExists { .. }) => StatusCode::CONFLICT,
        SchoolServiceError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
        SchoolServiceError::Storage(StorageError::EmptyUpload) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SchoolServiceError::Repository(RepositoryError::Unavailable(_))
        | SchoolServiceError::Storage(StorageError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: SchoolServiceError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(error = %error, "school request failed");
    }
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

pub(crate) fn respond<T>(status: StatusCode, result: Result<T, SchoolServiceError>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn respond_empty(result: Result<(), SchoolServiceError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

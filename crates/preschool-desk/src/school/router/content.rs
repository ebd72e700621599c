use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{authorize, respond, respond_empty, upload_from, Shared, UploadParams};
use crate::school::domain::{
    AnnouncementForm, AnnouncementId, AnnouncementUpdate, EventForm, EventId, EventUpdate,
};
use crate::school::repository::RecordStore;
use crate::school::service::UPCOMING_EVENT_LIMIT;
use crate::school::storage::ObjectStore;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimelineParams {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl TimelineParams {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitParams {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn list_events_handler<S, O>(State(service): Shared<S, O>) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    respond(StatusCode::OK, service.list_events())
}

pub(crate) async fn upcoming_events_handler<S, O>(
    State(service): Shared<S, O>,
    Query(params): Query<TimelineParams>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let limit = params.limit.unwrap_or(UPCOMING_EVENT_LIMIT);
    respond(StatusCode::OK, service.upcoming_events(params.today(), limit))
}

pub(crate) async fn past_events_handler<S, O>(
    State(service): Shared<S, O>,
    Query(params): Query<TimelineParams>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    respond(StatusCode::OK, service.past_events(params.today()))
}

pub(crate) async fn create_event_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(form): Json<EventForm>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.create_event(&caller, form, Vec::new()));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn add_event_photo_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let upload = upload_from(params, &headers, body.to_vec());
    let result = authorize(&service, &headers)
        .and_then(|caller| service.add_event_photo(&caller, &EventId(event_id), upload));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn update_event_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Json(update): Json<EventUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.update_event(&caller, &EventId(event_id), update));
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_event_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.delete_event(&caller, &EventId(event_id)));
    respond_empty(result)
}

pub(crate) async fn list_announcements_handler<S, O>(
    State(service): Shared<S, O>,
    Query(params): Query<LimitParams>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = match params.limit {
        Some(limit) => service.recent_announcements(limit),
        None => service.list_announcements(),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_announcement_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(form): Json<AnnouncementForm>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.create_announcement(&caller, form));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn update_announcement_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(announcement_id): Path<String>,
    Json(update): Json<AnnouncementUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| {
        service.update_announcement(&caller, &AnnouncementId(announcement_id), update)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_announcement_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(announcement_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.delete_announcement(&caller, &AnnouncementId(announcement_id)));
    respond_empty(result)
}

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::{authorize, respond, upload_from, Shared, UploadParams};
use crate::school::domain::{
    AdmissionForm, AdmissionId, AdmissionUpdate, StudentId, StudentUpdate,
};
use crate::school::lifecycle::AdmissionStatus;
use crate::school::repository::RecordStore;
use crate::school::storage::ObjectStore;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdmissionFilter {
    #[serde(default)]
    pub(crate) status: Option<AdmissionStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub(crate) status: AdmissionStatus,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

pub(crate) async fn create_admission_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(form): Json<AdmissionForm>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result =
        authorize(&service, &headers).and_then(|caller| service.create_admission(&caller, form));
    respond(StatusCode::CREATED, result)
}

/// Admin listing; `?status=submitted` narrows to the review queue.
pub(crate) async fn list_admissions_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Query(filter): Query<AdmissionFilter>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| match filter.status {
        Some(AdmissionStatus::Submitted) => service.pending_admissions(&caller),
        Some(status) => service.all_admissions(&caller).map(|rows| {
            rows.into_iter()
                .filter(|row| row.admission.status == status)
                .collect()
        }),
        None => service.all_admissions(&caller),
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn my_admissions_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.my_admissions(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn admission_detail_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(admission_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.admission_detail(&caller, &AdmissionId(admission_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_admission_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(admission_id): Path<String>,
    Json(update): Json<AdmissionUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| {
        service.update_admission_details(&caller, &AdmissionId(admission_id), update)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn decide_admission_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(admission_id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| {
        service.decide_admission(&caller, &AdmissionId(admission_id), body.status, body.notes)
    });
    respond(StatusCode::OK, result)
}

/// Raw document body; `?file_name=` supplies the extension.
pub(crate) async fn upload_document_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(doc_key): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let upload = upload_from(params, &headers, body.to_vec());
    let result = authorize(&service, &headers)
        .and_then(|caller| service.upload_admission_document(&caller, &doc_key, upload));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn my_students_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.my_students(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn all_students_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.all_students(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_student_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
    Json(update): Json<StudentUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.update_student(&caller, &StudentId(student_id), update));
    respond(StatusCode::OK, result)
}

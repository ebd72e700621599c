use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::{authorize, respond, upload_from, Shared, UploadParams};
use crate::school::domain::{AdmissionId, PaymentForm, PaymentId};
use crate::school::lifecycle::{PaymentStatus, VerificationOutcome};
use crate::school::repository::RecordStore;
use crate::school::storage::ObjectStore;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaymentFilter {
    #[serde(default)]
    pub(crate) status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerificationBody {
    pub(crate) outcome: VerificationOutcome,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

/// Records the payment without a receipt; upload it with `PUT .../receipt`.
pub(crate) async fn create_payment_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(form): Json<PaymentForm>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.create_payment(&caller, form, None));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_payments_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Query(filter): Query<PaymentFilter>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| match filter.status {
        Some(PaymentStatus::UnderVerification) => service.pending_payments(&caller),
        Some(status) => service.all_payments(&caller).map(|rows| {
            rows.into_iter()
                .filter(|row| row.payment.status == status)
                .collect()
        }),
        None => service.all_payments(&caller),
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn my_payments_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.my_payments(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn admission_payments_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(admission_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.payments_for_admission(&caller, &AdmissionId(admission_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn admission_ledger_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(admission_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.admission_ledger(&caller, &AdmissionId(admission_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn my_ledger_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.my_ledger(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn attach_receipt_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let upload = upload_from(params, &headers, body.to_vec());
    let result = authorize(&service, &headers)
        .and_then(|caller| service.attach_receipt(&caller, &PaymentId(payment_id), upload));
    respond(StatusCode::OK, result)
}

pub(crate) async fn verify_payment_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
    Json(body): Json<VerificationBody>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| {
        service.verify_payment(&caller, &PaymentId(payment_id), body.outcome, body.notes)
    });
    respond(StatusCode::OK, result)
}

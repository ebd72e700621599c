use crate::infra::{content_type_for, AppState};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use preschool_desk::school::{
    school_router, Bucket, FeeSchedule, MemoryObjectStore, Money, ObjectStore, RecordStore,
    SchoolService,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub(crate) struct FeeQuery {
    pub(crate) class: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeeQuote {
    pub(crate) class: String,
    pub(crate) total_fee: Money,
    pub(crate) scheduled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignedLink {
    #[serde(default)]
    pub(crate) expires: Option<i64>,
    #[serde(default)]
    pub(crate) token: Option<String>,
}

pub(crate) fn with_school_routes<S, O>(service: Arc<SchoolService<S, O>>) -> Router
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    school_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/fees", get(fee_quote_endpoint))
        .route("/storage/:bucket/*path", get(storage_object_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn fee_quote_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<FeeQuery>,
) -> Json<FeeQuote> {
    Json(quote(&state.fees, query.class))
}

pub(crate) fn quote(fees: &FeeSchedule, class: String) -> FeeQuote {
    let scheduled = fees.lookup(&class);
    FeeQuote {
        total_fee: scheduled.unwrap_or_else(|| fees.fallback()),
        scheduled: scheduled.is_some(),
        class,
    }
}

/// Serve bytes held by the in-memory bucket service. Private buckets only
/// answer to a live signed link.
pub(crate) async fn storage_object_endpoint(
    Extension(state): Extension<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    Query(link): Query<SignedLink>,
) -> Response {
    let Some(bucket) = Bucket::from_name(&bucket) else {
        return not_found();
    };
    let path = path.trim_start_matches('/');

    if !bucket.is_public() && !signed_link_valid(&state.objects, bucket, path, &link) {
        warn!(%bucket, path, "rejected unsigned storage request");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "signed link missing or expired" })),
        )
            .into_response();
    }

    match state.objects.read(bucket, path) {
        Some(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(path))],
            bytes,
        )
            .into_response(),
        None => not_found(),
    }
}

fn signed_link_valid(
    objects: &MemoryObjectStore,
    bucket: Bucket,
    path: &str,
    link: &SignedLink,
) -> bool {
    match (link.expires, link.token.as_deref()) {
        (Some(expires), Some(token)) => objects.verify_signature(bucket, path, expires, token),
        _ => false,
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "object not found" })),
    )
        .into_response()
}

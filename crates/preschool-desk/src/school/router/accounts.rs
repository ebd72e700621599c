use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{authorize, respond, respond_empty, user_id_header, Shared};
use crate::school::access::AccessError;
use crate::school::domain::{AuthIdentity, ProfileUpdate, QueryForm, QueryId, Role, UserId};
use crate::school::repository::RecordStore;
use crate::school::service::SchoolServiceError;
use crate::school::storage::ObjectStore;

#[derive(Debug, Deserialize)]
pub(crate) struct RoleChange {
    pub(crate) role: Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyBody {
    pub(crate) reply: String,
}

/// Profile claims a client may send on first sign-in. There is no role here:
/// new accounts start as parents and only `change_role` promotes them.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignInClaims {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    pub(crate) username: Option<String>,
}

impl From<SignInClaims> for AuthIdentity {
    fn from(claims: SignInClaims) -> Self {
        AuthIdentity {
            email: claims.email,
            full_name: claims.full_name,
            username: claims.username,
            role: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardParams {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

/// First call after sign-in: returns the profile, creating it when missing.
pub(crate) async fn sign_in_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(claims): Json<SignInClaims>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = user_id_header(&headers)
        .ok_or_else(|| SchoolServiceError::from(AccessError::Unauthenticated))
        .and_then(|user_id| service.current_profile(&user_id, &AuthIdentity::from(claims)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn me_handler<S, O>(State(service): Shared<S, O>, headers: HeaderMap) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.current_profile(&caller.user_id, &AuthIdentity::default()));
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_users_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.list_profiles(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn update_user_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.update_profile(&caller, &UserId(user_id), update));
    respond(StatusCode::OK, result)
}

pub(crate) async fn change_role_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(change): Json<RoleChange>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.change_role(&caller, &UserId(user_id), change.role));
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_user_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.delete_profile(&caller, &UserId(user_id)));
    respond_empty(result)
}

pub(crate) async fn submit_query_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Json(form): Json<QueryForm>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result =
        authorize(&service, &headers).and_then(|caller| service.submit_query(&caller, form, None));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn my_queries_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.my_queries(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn all_queries_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.all_queries(&caller));
    respond(StatusCode::OK, result)
}

pub(crate) async fn reply_query_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(query_id): Path<String>,
    Json(body): Json<ReplyBody>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.reply_query(&caller, &QueryId(query_id), body.reply));
    respond(StatusCode::OK, result)
}

pub(crate) async fn close_query_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Path(query_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers)
        .and_then(|caller| service.close_query(&caller, &QueryId(query_id)));
    respond(StatusCode::OK, result)
}

pub(crate) async fn parent_dashboard_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
    Query(params): Query<DashboardParams>,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let today = params.today.unwrap_or_else(|| Utc::now().date_naive());
    let result =
        authorize(&service, &headers).and_then(|caller| service.parent_dashboard(&caller, today));
    respond(StatusCode::OK, result)
}

pub(crate) async fn admin_dashboard_handler<S, O>(
    State(service): Shared<S, O>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    let result = authorize(&service, &headers).and_then(|caller| service.admin_dashboard(&caller));
    respond(StatusCode::OK, result)
}

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    PaymentDraft, PaymentId, PaymentUpdate, Room, RoomDraft, RoomId, RoomStatus, RoomUpdate,
    TenantDraft, TenantId, TenantUpdate,
};
use super::repository::PropertyRepository;
use super::search::{PaymentFilter, RoomFilter, TenantFilter};
use super::service::{PropertyService, PropertyServiceError};
use super::status::parse_status_list;
use crate::auth::{require_admin, AuthError, Authenticator, SessionToken, UserIdentity};
use crate::media::{ImageUpload, ImageUploader};

/// Handler state: the property service plus the authenticator guarding it.
pub struct PropertyState<R, U> {
    pub service: Arc<PropertyService<R, U>>,
    pub auth: Arc<dyn Authenticator>,
}

impl<R, U> Clone for PropertyState<R, U> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Router builder exposing the dashboard, tenant, room, and payment endpoints.
pub fn property_router<R, U>(
    service: Arc<PropertyService<R, U>>,
    auth: Arc<dyn Authenticator>,
) -> Router
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<R, U>))
        .route("/api/v1/auth/logout", post(logout_handler::<R, U>))
        .route("/api/v1/dashboard", get(dashboard_handler::<R, U>))
        .route(
            "/api/v1/tenants",
            get(list_tenants_handler::<R, U>).post(create_tenant_handler::<R, U>),
        )
        .route(
            "/api/v1/tenants/:tenant_id",
            get(tenant_handler::<R, U>)
                .patch(update_tenant_handler::<R, U>)
                .delete(delete_tenant_handler::<R, U>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/room",
            put(place_tenant_handler::<R, U>).delete(vacate_tenant_handler::<R, U>),
        )
        .route(
            "/api/v1/rooms",
            get(list_rooms_handler::<R, U>).post(create_room_handler::<R, U>),
        )
        .route(
            "/api/v1/rooms/:room_id",
            get(room_handler::<R, U>)
                .patch(update_room_handler::<R, U>)
                .delete(delete_room_handler::<R, U>),
        )
        .route(
            "/api/v1/rooms/:room_id/images",
            post(upload_room_image_handler::<R, U>),
        )
        .route(
            "/api/v1/payments",
            get(list_payments_handler::<R, U>).post(create_payment_handler::<R, U>),
        )
        .route(
            "/api/v1/payments/:payment_id",
            patch(update_payment_handler::<R, U>),
        )
        .route(
            "/api/v1/payments/:payment_id/:transition",
            post(payment_transition_handler::<R, U>),
        )
        .with_state(PropertyState { service, auth })
}

/// Room as rendered to clients, with the derived status alongside.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub status: RoomStatus,
    pub occupants: usize,
}

impl From<Room> for RoomView {
    fn from(room: Room) -> Self {
        Self {
            status: room.status(),
            occupants: room.occupants(),
            room,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlacementRequest {
    room_id: RoomId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaymentQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    status: Option<String>,
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for PropertyServiceError {
    fn into_response(self) -> Response {
        error_body(self.status_code(), self.to_string())
    }
}

fn auth_failure(err: AuthError) -> Response {
    let status = match err {
        AuthError::InvalidCredentials | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_body(status, err.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Result<SessionToken, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| SessionToken(token.to_string()))
        .ok_or(AuthError::NotAuthenticated)
}

fn signed_in<R, U>(state: &PropertyState<R, U>, headers: &HeaderMap) -> Result<UserIdentity, Response> {
    bearer_token(headers)
        .and_then(|token| state.auth.resolve(&token))
        .map_err(auth_failure)
}

fn admin<R, U>(state: &PropertyState<R, U>, headers: &HeaderMap) -> Result<UserIdentity, Response> {
    bearer_token(headers)
        .and_then(|token| require_admin(state.auth.as_ref(), &token))
        .map_err(auth_failure)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, PropertyServiceError>,
) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn login_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    match state.auth.login(&request.email, &request.password) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => auth_failure(err),
    }
}

pub(crate) async fn logout_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    match bearer_token(&headers).and_then(|token| state.auth.logout(&token)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => auth_failure(err),
    }
}

pub(crate) async fn dashboard_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }
    respond(StatusCode::OK, state.service.dashboard())
}

pub(crate) async fn list_tenants_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Query(filter): Query<TenantFilter>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }
    respond(StatusCode::OK, state.service.tenants(&filter))
}

pub(crate) async fn tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }
    respond(StatusCode::OK, state.service.tenant(&TenantId(tenant_id)))
}

pub(crate) async fn create_tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Json(draft): Json<TenantDraft>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(StatusCode::CREATED, state.service.register_tenant(draft))
}

pub(crate) async fn update_tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
    Json(update): Json<TenantUpdate>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state.service.update_tenant(&TenantId(tenant_id), update),
    )
}

pub(crate) async fn delete_tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state.service.remove_tenant(&TenantId(tenant_id)),
    )
}

pub(crate) async fn place_tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
    Json(request): Json<PlacementRequest>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    let result = state
        .service
        .place_tenant(&TenantId(tenant_id), &request.room_id)
        .map(|placed| json!({ "tenant": placed.tenant, "room": RoomView::from(placed.room) }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn vacate_tenant_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    let result = state
        .service
        .vacate_tenant(&TenantId(tenant_id))
        .map(|released| json!({ "tenant": released.tenant, "room": RoomView::from(released.room) }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_rooms_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Query(filter): Query<RoomFilter>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }
    let result = state
        .service
        .rooms(&filter)
        .map(|rooms| rooms.into_iter().map(RoomView::from).collect::<Vec<_>>());
    respond(StatusCode::OK, result)
}

pub(crate) async fn room_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(room_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state.service.room(&RoomId(room_id)).map(RoomView::from),
    )
}

pub(crate) async fn create_room_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Json(draft): Json<RoomDraft>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::CREATED,
        state.service.add_room(draft).map(RoomView::from),
    )
}

pub(crate) async fn update_room_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(room_id): Path<String>,
    Json(update): Json<RoomUpdate>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state
            .service
            .update_room(&RoomId(room_id), update)
            .map(RoomView::from),
    )
}

pub(crate) async fn delete_room_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(room_id): Path<String>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state.service.remove_room(&RoomId(room_id)).map(RoomView::from),
    )
}

pub(crate) async fn upload_room_image_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(room_id): Path<String>,
    body: Bytes,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }

    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let image = ImageUpload {
        file_name: header_text("x-file-name").unwrap_or_else(|| "upload".to_string()),
        content_type: header_text(header::CONTENT_TYPE.as_str()).unwrap_or_default(),
        bytes: body.to_vec(),
    };

    let result = state
        .service
        .attach_room_image(&RoomId(room_id), image)
        .await
        .map(RoomView::from);
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_payments_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Query(query): Query<PaymentQuery>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = signed_in(&state, &headers) {
        return denied;
    }

    let statuses = match query.status.as_deref().map(parse_status_list).transpose() {
        Ok(statuses) => statuses.unwrap_or_default(),
        Err(err) => return PropertyServiceError::from(err).into_response(),
    };
    let filter = PaymentFilter {
        query: query.q,
        statuses,
    };
    respond(StatusCode::OK, state.service.payments(&filter))
}

pub(crate) async fn create_payment_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Json(draft): Json<PaymentDraft>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::CREATED,
        state.service.record_payment(draft, today()),
    )
}

pub(crate) async fn update_payment_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
    Json(update): Json<PaymentUpdate>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }
    respond(
        StatusCode::OK,
        state.service.amend_payment(&PaymentId(payment_id), update),
    )
}

pub(crate) async fn payment_transition_handler<R, U>(
    State(state): State<PropertyState<R, U>>,
    headers: HeaderMap,
    Path((payment_id, transition)): Path<(String, String)>,
) -> Response
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    if let Err(denied) = admin(&state, &headers) {
        return denied;
    }

    let id = PaymentId(payment_id);
    let result = match transition.as_str() {
        "paid" => state.service.settle_payment(&id, today()),
        "unpaid" => state.service.reopen_payment(&id),
        "overdue" => state.service.flag_overdue(&id),
        other => {
            return error_body(
                StatusCode::NOT_FOUND,
                format!("unknown payment transition `{other}`"),
            )
        }
    };
    respond(StatusCode::OK, result)
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cqrs_es::persist::ViewRepository;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::Authenticated;
use crate::domain::booking::{BookingError, PassengerDetail};
use crate::domain::commands::NewBooking;
use crate::domain::fields::MutableField;
use crate::domain::pricing::AddonSelection;
use crate::engine::EngineError;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::ApplicationState;

pub fn router(state: ApplicationState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/addons", get(list_addons))
        .route("/bookings", post(create_booking))
        .route(
            "/bookings/{booking_id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route(
            "/bookings/{booking_id}/passenger-details",
            post(complete_passenger_details),
        )
        .route("/bookings/{booking_id}/cancel", post(cancel_booking))
        .route(
            "/bookings/{booking_id}/refund",
            get(refund_status).post(issue_refund),
        )
        .route("/bookings/{booking_id}/transactions", get(list_transactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_addons(
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    let addons = state
        .engine
        .list_addons()
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(Json(addons))
}

async fn create_booking(
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
    ApiJson(request): ApiJson<NewBooking>,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .engine
        .create_booking(&actor, request)
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": booking.id(),
            "status": booking.status(),
            "schedule": booking.schedule(),
        })),
    ))
}

// Reads are served from the persisted view; access is re-checked against the
// stored owner and pilot on every request.
async fn get_booking(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    let view = state
        .booking_views
        .load(&booking_id.to_string())
        .await
        .map_err(|e| ApiError::for_actor(EngineError::Store(e.to_string()), &actor))?
        .ok_or_else(|| {
            ApiError::for_actor(BookingError::NotFound("booking".to_string()).into(), &actor)
        })?;
    let booking = view
        .readable_by(&actor)
        .map_err(|e| ApiError::for_actor(e.into(), &actor))?;
    Ok(Json(booking.clone()))
}

async fn update_booking(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> ApiResult<impl IntoResponse> {
    let (booking, changed) = state
        .engine
        .update_booking(&actor, booking_id, fields)
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    let changed: Vec<&str> = changed.into_iter().map(MutableField::wire_name).collect();
    Ok(Json(json!({ "changed": changed, "booking": booking })))
}

/// Body of the passenger-details step. Anything else the client sends,
/// including price fields, is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassengerDetailsRequest {
    #[serde(alias = "passenger_details")]
    passenger_details: Vec<PassengerDetail>,
    #[serde(default, alias = "selected_addons")]
    selected_addons: Vec<AddonSelection>,
}

async fn complete_passenger_details(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
    ApiJson(request): ApiJson<PassengerDetailsRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .engine
        .complete_passenger_details(
            &actor,
            booking_id,
            request.passenger_details,
            request.selected_addons,
        )
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(Json(booking))
}

async fn cancel_booking(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .engine
        .cancel_booking(&actor, booking_id)
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(Json(booking))
}

async fn delete_booking(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    state
        .engine
        .delete_booking(&actor, booking_id)
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundRequest {
    #[serde(default)]
    amount: Option<Decimal>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default, alias = "payment_method", alias = "method")]
    payment_method: String,
}

async fn issue_refund(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
    ApiJson(request): ApiJson<RefundRequest>,
) -> ApiResult<impl IntoResponse> {
    let (refund, transaction) = state
        .engine
        .issue_refund(
            &actor,
            booking_id,
            request.amount,
            request.reason,
            request.payment_method,
        )
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(Json(json!({ "refund": refund, "transaction": transaction })))
}

async fn refund_status(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    let summary = state
        .engine
        .refund_status(&actor, booking_id)
        .await
        .map_err(|e| ApiError::for_actor(e, &actor))?;
    Ok(Json(summary))
}

async fn list_transactions(
    Path(booking_id): Path<Uuid>,
    State(state): State<ApplicationState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<impl IntoResponse> {
    if !actor.is_admin() {
        return Err(ApiError::for_actor(BookingError::Forbidden.into(), &actor));
    }
    let transactions = state
        .ledger
        .load_for_booking(&booking_id)
        .await
        .map_err(|e| ApiError::for_actor(EngineError::Store(e.to_string()), &actor))?;
    Ok(Json(transactions))
}

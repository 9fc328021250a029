use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::auth::AuthError;
use crate::domain::authorization::Actor;
use crate::domain::booking::BookingError;
use crate::engine::EngineError;

/// Error response body: `{ "error": kind, "message": text, "detail"?: {...} }`.
/// `detail` names the offending field or state and is only filled in for
/// admins.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    detail: Option<Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// Maps an engine error for the given caller, attaching diagnostics when
    /// the caller is an admin.
    #[must_use]
    pub fn for_actor(err: EngineError, actor: &Actor) -> Self {
        let (mut api_error, detail) = describe(err);
        if actor.is_admin() {
            api_error.detail = detail;
        }
        api_error
    }
}

fn describe(err: EngineError) -> (ApiError, Option<Value>) {
    match err {
        EngineError::Domain(err) => describe_domain(err),
        EngineError::Conflict => (
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "conflict",
                "The booking was changed by another request. Please try again.",
            ),
            None,
        ),
        EngineError::Store(reason) => {
            tracing::error!(%reason, "request failed on the event store");
            (
                ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "The booking service is temporarily unavailable. Please try again.",
                ),
                Some(json!({ "reason": reason })),
            )
        }
    }
}

fn describe_domain(err: BookingError) -> (ApiError, Option<Value>) {
    use StatusCode as S;
    match err {
        BookingError::Forbidden => (
            ApiError::new(S::FORBIDDEN, "forbidden", "You are not allowed to do this."),
            None,
        ),
        BookingError::NotFound(what) => (
            ApiError::new(S::NOT_FOUND, "not_found", "The requested item does not exist."),
            Some(json!({ "resource": what })),
        ),
        BookingError::InvalidField { field, role } => (
            ApiError::new(
                S::UNPROCESSABLE_ENTITY,
                "invalid_field",
                "The request changes a field you may not edit.",
            ),
            Some(json!({ "field": field, "role": role })),
        ),
        BookingError::InvalidTransition { from, to, reason } => (
            ApiError::new(
                S::CONFLICT,
                "invalid_transition",
                "The booking cannot move to the requested status.",
            ),
            Some(json!({ "from": from, "to": to, "reason": reason })),
        ),
        BookingError::Validation(reason) => (
            ApiError::new(S::UNPROCESSABLE_ENTITY, "validation_error", reason),
            None,
        ),
        BookingError::NotPaid => (
            ApiError::new(S::CONFLICT, "not_paid", "The booking has not been paid."),
            None,
        ),
        BookingError::AlreadyRefunded => (
            ApiError::new(
                S::CONFLICT,
                "already_refunded",
                "The booking has already been fully refunded.",
            ),
            None,
        ),
        BookingError::ExceedsBookingTotal {
            requested,
            refunded,
            total,
        } => (
            ApiError::new(
                S::CONFLICT,
                "exceeds_booking_total",
                "The refund is larger than the amount left on the booking.",
            ),
            Some(json!({
                "requested": requested,
                "refunded": refunded,
                "total": total,
                "remaining": total - refunded,
            })),
        ),
        BookingError::AlreadyExists => (
            ApiError::new(S::CONFLICT, "already_exists", "The booking already exists."),
            None,
        ),
        BookingError::CatalogUnavailable(reason) => (
            ApiError::new(
                S::SERVICE_UNAVAILABLE,
                "catalog_unavailable",
                "The add-on catalog is temporarily unavailable.",
            ),
            Some(json!({ "reason": reason })),
        ),
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
    }
}

// Malformed or mistyped bodies get the same error shape as domain errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, "validation_error", rejection.body_text())
    }
}

/// `Json` extractor whose rejection is an [`ApiError`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.kind,
            message: &self.message,
            detail: self.detail.as_ref(),
        });
        (self.status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

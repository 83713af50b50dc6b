//! `ApiError`: one `kind` enum plus a cached `StatusCode` and backtrace,
//! modeled on the teacher's `syncserver::error::ApiError` — but error
//! bodies here are always `{"error": "<message>"}` per spec.md §7, not the
//! teacher's Weave-code legacy format (that format is Sync-1.1-specific
//! and has no analogue here, recorded in DESIGN.md).

use std::fmt;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use backtrace::Backtrace;
use serde::Serialize;
use sortbench_common::{from_error, InternalError, ReportableError};
use sortbench_db::DbError;
use sortbench_engine::EngineError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    pub backtrace: Box<Backtrace>,
    pub status: StatusCode,
}

#[derive(Debug, Error)]
pub enum ApiErrorKind {
    #[error("{0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("too many jobs")]
    Admission,
    #[error("{0}")]
    Engine(EngineError),
    #[error("job canceled")]
    Canceled,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Storage(DbError),
    #[error("{0}")]
    Internal(String),
}

impl ApiErrorKind {
    fn status(&self) -> StatusCode {
        match self {
            ApiErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorKind::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorKind::Admission => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorKind::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::Canceled => StatusCode::OK,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiErrorKind::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for the `error_kind` tag on `requests_total`, per
    /// spec.md §7's error-kind taxonomy.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ApiErrorKind::Validation(_) => "validation",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::RateLimited { .. } => "rate-limited",
            ApiErrorKind::Admission => "admission",
            ApiErrorKind::Engine(_) => "engine",
            ApiErrorKind::Canceled => "canceled",
            ApiErrorKind::NotFound => "not-found",
            ApiErrorKind::Storage(_) => "storage",
            ApiErrorKind::Internal(_) => "internal",
        }
    }
}

impl From<ApiErrorKind> for ApiError {
    fn from(kind: ApiErrorKind) -> Self {
        let status = kind.status();
        Self {
            kind,
            backtrace: Box::new(Backtrace::new()),
            status,
        }
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiErrorKind::Validation(message.into()).into()
    }

    pub fn unauthorized() -> Self {
        ApiErrorKind::Unauthorized.into()
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        ApiErrorKind::RateLimited { retry_after_secs }.into()
    }

    pub fn admission() -> Self {
        ApiErrorKind::Admission.into()
    }

    pub fn not_found() -> Self {
        ApiErrorKind::NotFound.into()
    }

    pub fn metric_label(&self) -> &'static str {
        self.kind.metric_label()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for ApiError {}

impl InternalError for ApiError {
    fn internal_error(message: String) -> Self {
        ApiErrorKind::Internal(message).into()
    }
}

impl ReportableError for ApiError {
    fn error_backtrace(&self) -> String {
        format!("{:?}", self.backtrace)
    }

    fn is_sentry_event(&self) -> bool {
        self.status.is_server_error()
    }

    fn metric_label(&self) -> Option<String> {
        Some(self.kind.metric_label().to_owned())
    }
}

from_error!(EngineError, ApiError, ApiErrorKind::Engine);

impl From<DbError> for ApiError {
    fn from(inner: DbError) -> Self {
        let status = if inner.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            backtrace: Box::new(Backtrace::new()),
            kind: ApiErrorKind::Storage(inner),
        }
    }
}

/// Spec.md §7: "Error bodies have the shape `{"error": "<message>"}`."
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);

        // Unauthorized responses carry no descriptive body beyond
        // "unauthorized", per spec.md §4.3 (avoid oracle side-channels).
        let message = match &self.kind {
            ApiErrorKind::Unauthorized => "unauthorized".to_owned(),
            ApiErrorKind::RateLimited { retry_after_secs } => {
                builder.insert_header(("Retry-After", retry_after_secs.to_string()));
                "too many requests".to_owned()
            }
            ApiErrorKind::Admission => "too many jobs".to_owned(),
            _ => self.to_string(),
        };

        builder.json(ErrorBody { error: message })
    }
}

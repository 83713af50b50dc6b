//! `DbError`, modeled on `tokenserver-db-common`'s `DbError`: a `kind` plus a
//! cached backtrace and status, so a `From` impl for the web layer's
//! `ApiError` doesn't need to re-derive either.

use std::fmt;

use backtrace::Backtrace;
use sortbench_common::{InternalError, ReportableError};
use thiserror::Error;

#[derive(Debug)]
pub struct DbError {
    kind: DbErrorKind,
    pub backtrace: Box<Backtrace>,
}

#[derive(Debug, Error)]
enum DbErrorKind {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("database query error: {0}")]
    Query(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("unexpected database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::from(DbErrorKind::NotFound(id.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, DbErrorKind::NotFound(_))
    }
}

impl From<DbErrorKind> for DbError {
    fn from(kind: DbErrorKind) -> Self {
        Self {
            kind,
            backtrace: Box::new(Backtrace::new()),
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for DbError {}

impl ReportableError for DbError {
    fn error_backtrace(&self) -> String {
        format!("{:?}", self.backtrace)
    }

    fn is_sentry_event(&self) -> bool {
        !matches!(self.kind, DbErrorKind::NotFound(_))
    }

    fn metric_label(&self) -> Option<String> {
        match self.kind {
            DbErrorKind::NotFound(_) => None,
            DbErrorKind::Pool(_) => Some("storage.pool".to_owned()),
            DbErrorKind::Query(_) => Some("storage.query".to_owned()),
            DbErrorKind::Migration(_) => Some("storage.migration".to_owned()),
            DbErrorKind::Internal(_) => Some("storage.internal".to_owned()),
        }
    }
}

impl InternalError for DbError {
    fn internal_error(message: String) -> Self {
        DbErrorKind::Internal(message).into()
    }
}

sortbench_common::from_error!(diesel::result::Error, DbError, |e: diesel::result::Error| {
    DbErrorKind::Query(e.to_string())
});
sortbench_common::from_error!(
    diesel::result::ConnectionError,
    DbError,
    |e: diesel::result::ConnectionError| DbErrorKind::Query(e.to_string())
);
sortbench_common::from_error!(
    Box<dyn std::error::Error + Send + Sync>,
    DbError,
    |e: Box<dyn std::error::Error + Send + Sync>| DbErrorKind::Migration(e.to_string())
);

pub type DbResult<T> = Result<T, DbError>;

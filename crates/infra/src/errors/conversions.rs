//! Conversions from external infrastructure errors into domain errors.

use credilock_domain::CredilockError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CredilockError);

impl From<InfraError> for CredilockError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CredilockError> for InfraError {
    fn from(value: CredilockError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CredilockError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match err {
            RE::SqliteFailure(inner, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (inner.code, inner.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CredilockError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CredilockError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CredilockError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        CredilockError::Database("foreign key constraint violation".into())
                    }
                    _ => CredilockError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        inner.code, inner.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                CredilockError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                CredilockError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CredilockError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => CredilockError::Database("invalid UTF-8 returned from sqlite".into()),
            other => CredilockError::Database(other.to_string()),
        };
        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CredilockError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(CredilockError::Database(format!("connection pool error: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CredilockError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let mapped = if err.is_timeout() {
            CredilockError::Network(format!("http request timed out: {err}"))
        } else if err.is_connect() {
            CredilockError::Network(format!("http connection failed: {err}"))
        } else if err.is_builder() {
            CredilockError::Internal(format!("failed to build http request: {err}"))
        } else if err.is_decode() {
            CredilockError::Internal(format!("failed to decode http response: {err}"))
        } else {
            CredilockError::Network(format!("http error: {err}"))
        };
        InfraError(mapped)
    }
}

//! Generic result/error resprentation(s).

use std::convert::Infallible;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use storefront_core::{common::ApiResponse, error::AccountError};
use validator::ValidationErrors;

/// Standard return type out of routes / handlers
pub type AppResult<T> = std::result::Result<T, AppError>;

/// An error that ends a request.
///
/// Rendered as the failure envelope `{ "success": false, "message": ... }`
/// with `status` as the response status code. Internal errors don't leak
/// their details into the message; those only end up in the logs.
#[derive(thiserror::Error, Eq, PartialEq, Debug)]
pub struct AppError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl AppError {
    /// New instance of [AppError].
    ///
    /// Without a message, the status code's canonical reason is used.
    pub fn new<M: ToString>(status_code: StatusCode, message: Option<M>) -> AppError {
        Self {
            status: status_code,
            message: message.map(|m| m.to_string()).unwrap_or_else(|| {
                status_code
                    .canonical_reason()
                    .unwrap_or("Unknown Error")
                    .to_string()
            }),
        }
    }

    /// [AppError] for [StatusCode::INTERNAL_SERVER_ERROR].
    ///
    /// The cause is logged, the response only carries the canonical reason.
    pub fn internal(cause: impl std::fmt::Display) -> AppError {
        tracing::error!(%cause, "Internal server error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None::<String>)
    }

    /// The response status this error maps to
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message rendered in the response envelope
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, message = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "Request rejected");
        }

        (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<AccountError>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<diesel::result::Error>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<ValidationErrors>() {
            Ok(err) => return Self::from(err),
            Err(e) => e,
        };

        let err = match err.downcast::<AppError>() {
            Ok(err) => return err,
            Err(e) => e,
        };

        Self::internal(format!("{err:#}"))
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        let status = match err {
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::TokenInvalid | AccountError::AlreadyVerified => StatusCode::BAD_REQUEST,
            AccountError::NotVerified => StatusCode::FORBIDDEN,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::AlreadyRegistered => StatusCode::CONFLICT,
        };

        Self::new(status, Some(err))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                Self::new(StatusCode::NOT_FOUND, Some("Resource Not Found"))
            }
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::from(AccountError::AlreadyRegistered),
            _ => Self::internal(err),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::new(value.status(), Some(value.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(value.body_text()))
    }
}

impl From<Infallible> for AppError {
    fn from(the_impossible: Infallible) -> Self {
        match the_impossible {}
    }
}

// Needed to support thiserror::Error, outputs debug for AppError
impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
/// Parse the failure envelope out of the json body
pub(crate) async fn parse_error(response: Response) -> ApiResponse<serde_json::Value> {
    let body_bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

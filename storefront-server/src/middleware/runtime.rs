//! Middleware for runtime, [tower_http] extensions.

use crate::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;

/// Middleware function for catching runtime panics, logging
/// them, and converting them into a `500 Internal Server` response.
pub fn catch_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "Unknown panic message"
    };

    tracing::error!(details, "Request handler panicked");

    AppError::new(StatusCode::INTERNAL_SERVER_ERROR, None::<String>).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::parse_error;

    #[test_log::test(tokio::test)]
    async fn test_panics_become_failure_envelopes() {
        let response = catch_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = parse_error(response).await;
        assert!(!body.success);
        assert!(!body.message.contains("boom"));
    }
}

//! JSON extractor whose rejections render as the failure envelope.

use crate::error::AppError;
use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};

/// Drop-in replacement for [`axum::Json`].
///
/// Malformed bodies or a missing `Content-Type` are rejected with an
/// [`AppError`] instead of axum's plain text responses.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        let Self(value) = self;
        axum::Json(value).into_response()
    }
}

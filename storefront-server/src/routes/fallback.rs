//! Fallback routes.

use crate::error::AppError;
use axum::http::StatusCode;

/// 404 fallback.
pub async fn notfound_404() -> AppError {
    AppError::new(StatusCode::NOT_FOUND, Some("Route Not Found"))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{route_builder::RouteBuilder, test_context::TestContext};
    use http::{Method, StatusCode};
    use serde_json::Value;
    use storefront_core::common::ApiResponse;
    use testresult::TestResult;

    #[test_log::test(tokio::test)]
    async fn test_unknown_route() -> TestResult {
        let ctx = TestContext::new()?;

        let (status, body) = RouteBuilder::new(ctx.app(), Method::GET, "/api/user/profile")
            .into_json_response::<ApiResponse<Value>>()
            .await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert_eq!(body.message, "Route Not Found");

        Ok(())
    }
}

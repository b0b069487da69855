//! Healthcheck route.

use crate::{
    app_state::AppState,
    setups::{AccountStore, ServerSetup},
};
use axum::{self, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A healthcheck response containing diagnostic information for the service
#[derive(ToSchema, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct HealthcheckResponse {
    store_connected: bool,
}

impl HealthcheckResponse {
    /// Whether the service is healthy
    pub fn is_healthy(&self) -> bool {
        self.store_connected
    }

    /// The status code for the healthcheck response
    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET handler for checking service health.
#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "storefront-server healthy", body = HealthcheckResponse),
        (status = 503, description = "storefront-server not healthy", body = HealthcheckResponse)
    )
)]
pub async fn healthcheck<S: ServerSetup>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthcheckResponse>) {
    let store_connected = match state.accounts.is_healthy().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Account store unhealthy");
            false
        }
    };

    let response = HealthcheckResponse { store_connected };

    (response.status_code(), Json(response))
}

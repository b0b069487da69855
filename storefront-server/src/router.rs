//! Main [axum::Router] interface for webserver.

use crate::{
    app_state::AppState,
    routes::{account, fallback::notfound_404, health, ping},
    setups::ServerSetup,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Setup main router for application.
pub fn setup_app_router<S: ServerSetup>(app_state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT])
        // allow requests from any origin
        .allow_origin(Any);

    let user_router = Router::new()
        .route("/register", post(account::register::<S>))
        .route("/resend-email-link", post(account::resend_email_link::<S>))
        .route("/verify-email/:token", get(account::verify_email::<S>))
        .route("/forgot-password", post(account::forgot_password::<S>))
        .route("/reset-password/:token", post(account::reset_password::<S>))
        .route("/login", post(account::login::<S>))
        .layer(cors)
        .with_state(app_state.clone());

    Router::new()
        .route("/ping", get(ping::get))
        .route("/healthcheck", get(health::healthcheck::<S>))
        .fallback(notfound_404)
        .with_state(app_state)
        .nest("/api/user", user_router)
}

//! OpenAPI doc generation.

use crate::routes::{account, health, ping};
use storefront_core::common::{
    AccountResponse, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use utoipa::OpenApi;

/// API documentation generator.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck,
        ping::get,
        account::register,
        account::resend_email_link,
        account::verify_email,
        account::forgot_password,
        account::reset_password,
        account::login,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            EmailRequest,
            ResetPasswordRequest,
            AccountResponse,
            account::AccountEnvelope,
            account::MessageEnvelope,
            health::HealthcheckResponse
        )
    ),
    tags(
        (name = "storefront-server", description = "Account registration, email verification & password reset")
    )
)]

/// Tied to OpenAPI documentation.
#[derive(Debug)]
pub struct ApiDoc;

//! Account Routes: registration, email verification, password reset & login

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    extract::json::Json,
    models::{account::NewAccount, mail::OutboundEmail},
    password,
    setups::{AccountStore, Notifier, ServerSetup},
};
use axum::{
    self,
    extract::{Path, State},
    http::StatusCode,
};
use storefront_core::{
    common::{
        AccountResponse, ApiResponse, EmailRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest,
    },
    error::AccountError,
    token::{PlainToken, TokenKind},
};
use validator::Validate;

/// POST handler for registering a new account
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = AccountEnvelope),
        (status = 400, description = "Invalid request", body = MessageEnvelope),
        (status = 409, description = "Email or contact number already registered", body = MessageEnvelope),
    )
)]
pub async fn register<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AccountResponse>>)> {
    request.validate()?;

    let password_hash = password::hash(request.password).await?;

    let account = state
        .accounts
        .create(NewAccount {
            username: request.username,
            email: request.email,
            contact_number: request.contact_number,
            password_hash,
        })
        .await?;

    let tokens = state.tokens();
    let token = tokens.issue(TokenKind::Verification, &account).await?;
    let email = OutboundEmail::verification(
        &account.email,
        &tokens.link(TokenKind::Verification, &token),
    );

    // the account exists either way, the link can be requested again
    if let Err(e) = state.notifier.send(&email).await {
        tracing::warn!(account_id = account.id, error = %e, "Couldn't deliver verification email");
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "User Registered Successfully",
            account.to_response(),
        )),
    ))
}

/// POST handler for sending a fresh email verification link
#[utoipa::path(
    post,
    path = "/api/user/resend-email-link",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageEnvelope),
        (status = 400, description = "Invalid request or already verified", body = MessageEnvelope),
        (status = 404, description = "Email not found", body = MessageEnvelope),
        (status = 502, description = "Email could not be delivered", body = MessageEnvelope),
    )
)]
pub async fn resend_email_link<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    request.validate()?;

    let account = state
        .accounts
        .find_by_email(&request.email)
        .await?
        .ok_or(AccountError::NotFound)?;

    if account.is_verified {
        return Err(AccountError::AlreadyVerified.into());
    }

    let tokens = state.tokens();
    let token = tokens.issue(TokenKind::Verification, &account).await?;

    deliver(
        &state,
        OutboundEmail::verification(
            &account.email,
            &tokens.link(TokenKind::Verification, &token),
        ),
    )
    .await?;

    Ok(Json(ApiResponse::message(
        "Email Verification Link Sent Successfully",
    )))
}

/// GET handler for redeeming an email verification link
#[utoipa::path(
    get,
    path = "/api/user/verify-email/{token}",
    params(
        ("token" = String, Path, description = "The token from the verification email")
    ),
    responses(
        (status = 200, description = "Email verified", body = AccountEnvelope),
        (status = 400, description = "Token invalid or expired, or email already verified", body = MessageEnvelope),
    )
)]
pub async fn verify_email<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<AccountResponse>>> {
    let account = state.tokens().redeem_verification(&token).await?;

    Ok(Json(ApiResponse::with_data(
        "Email Verified Successfully",
        account.to_response(),
    )))
}

/// POST handler for requesting a password reset link
#[utoipa::path(
    post,
    path = "/api/user/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageEnvelope),
        (status = 400, description = "Invalid request", body = MessageEnvelope),
        (status = 404, description = "Email not found", body = MessageEnvelope),
        (status = 502, description = "Email could not be delivered", body = MessageEnvelope),
    )
)]
pub async fn forgot_password<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    request.validate()?;

    let account = state
        .accounts
        .find_by_email(&request.email)
        .await?
        .ok_or(AccountError::NotFound)?;

    let tokens = state.tokens();
    let token = tokens.issue(TokenKind::Reset, &account).await?;

    deliver(
        &state,
        OutboundEmail::password_reset(&account.email, &tokens.link(TokenKind::Reset, &token)),
    )
    .await?;

    Ok(Json(ApiResponse::message(
        "Reset Password Link Sent Successfully",
    )))
}

/// POST handler for choosing a new password with a reset link
#[utoipa::path(
    post,
    path = "/api/user/reset-password/{token}",
    request_body = ResetPasswordRequest,
    params(
        ("token" = String, Path, description = "The token from the password reset email")
    ),
    responses(
        (status = 200, description = "Password replaced", body = MessageEnvelope),
        (status = 400, description = "Invalid request, token invalid or expired", body = MessageEnvelope),
    )
)]
pub async fn reset_password<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    request.validate()?;

    // no point in hashing for a token that can't exist
    token.parse::<PlainToken>()?;

    let password_hash = password::hash(request.password).await?;

    state.tokens().redeem_reset(&token, password_hash).await?;

    Ok(Json(ApiResponse::message("Password Reset Successfully")))
}

/// POST handler for checking account credentials
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials valid", body = AccountEnvelope),
        (status = 400, description = "Invalid request", body = MessageEnvelope),
        (status = 401, description = "Invalid credentials", body = MessageEnvelope),
        (status = 403, description = "Email not verified", body = MessageEnvelope),
    )
)]
pub async fn login<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AccountResponse>>> {
    request.validate()?;

    let account = state
        .accounts
        .find_by_email(&request.email)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    if !password::verify(request.password, account.password_hash.clone()).await? {
        return Err(AccountError::InvalidCredentials.into());
    }

    if !account.is_verified {
        return Err(AccountError::NotVerified.into());
    }

    tracing::debug!(account_id = account.id, "Credentials accepted");

    Ok(Json(ApiResponse::with_data(
        "User Logged In Successfully",
        account.to_response(),
    )))
}

async fn deliver<S: ServerSetup>(state: &AppState<S>, email: OutboundEmail) -> AppResult<()> {
    state.notifier.send(&email).await.map_err(|e| {
        tracing::error!(error = %e, subject = %email.subject, "Email delivery failed");
        AppError::new(StatusCode::BAD_GATEWAY, Some("Email Could Not Be Sent"))
    })
}

/// Successful response carrying an account, as documented in the API docs
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AccountEnvelope {
    success: bool,
    message: String,
    data: AccountResponse,
}

/// Response carrying only a message, as documented in the API docs
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct MessageEnvelope {
    success: bool,
    message: String,
}

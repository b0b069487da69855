//! Request and response data types that are common and useful between clients of and the storefront server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Registration request struct
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 5, max = 50))]
    pub username: String,
    /// Email address, receives the verification link
    #[validate(email, length(min = 5, max = 50))]
    pub email: String,
    /// Password for logging in
    #[validate(length(min = 5, max = 50))]
    pub password: String,
    /// Ten digit mobile number
    #[validate(custom = "valid_contact_number")]
    pub contact_number: String,
}

/// Login request struct
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct LoginRequest {
    /// Email address of the account
    #[validate(email, length(min = 5, max = 50))]
    pub email: String,
    /// Password of the account
    #[validate(length(min = 5, max = 50))]
    pub password: String,
}

/// Request naming an account by email, e.g. to resend a verification link
/// or to start a password reset
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct EmailRequest {
    /// Email address of the account
    #[validate(email, length(min = 5, max = 50))]
    pub email: String,
}

/// Password reset request struct. The token travels in the path.
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct ResetPasswordRequest {
    /// The new password
    #[validate(length(min = 5, max = 50))]
    pub password: String,
}

/// Information about an account
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account identifier
    pub id: i32,
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Mobile number
    pub contact_number: String,
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

/// The envelope every response is wrapped in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Human readable outcome
    pub message: String,
    /// Payload, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn with_data(message: impl ToString, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }

    /// A successful response with only a message.
    pub fn message(message: impl ToString) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
        }
    }

    /// A failed response.
    pub fn failure(message: impl ToString) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Indian mobile numbers: ten digits, starting with 6 to 9.
fn valid_contact_number(s: &str) -> Result<(), ValidationError> {
    let mut digits = s.chars();

    let first_ok = matches!(digits.next(), Some('6'..='9'));
    let rest_ok = digits.clone().count() == 9 && digits.all(|c| c.is_ascii_digit());

    if first_ok && rest_ok {
        Ok(())
    } else {
        Err(ValidationError::new("invalid mobile number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "tyrone".to_string(),
            email: "tyrone@slothrop.com".to_string(),
            password: "rocket00000".to_string(),
            contact_number: "9876543210".to_string(),
        }
    }

    #[test]
    fn test_register_request_ok() {
        assert_matches!(register_request().validate(), Ok(()));
    }

    #[test]
    fn test_register_request_invalid_fields() {
        let short_username = RegisterRequest {
            username: "ty".to_string(),
            ..register_request()
        };
        assert_matches!(short_username.validate(), Err(_));

        let bad_email = RegisterRequest {
            email: "not an email".to_string(),
            ..register_request()
        };
        assert_matches!(bad_email.validate(), Err(_));

        let short_password = RegisterRequest {
            password: "1234".to_string(),
            ..register_request()
        };
        assert_matches!(short_password.validate(), Err(_));
    }

    #[test]
    fn test_contact_number_rules() {
        assert_matches!(valid_contact_number("6000000000"), Ok(()));
        assert_matches!(valid_contact_number("9999999999"), Ok(()));
        assert_matches!(valid_contact_number("5999999999"), Err(_));
        assert_matches!(valid_contact_number("999999999"), Err(_));
        assert_matches!(valid_contact_number("99999999999"), Err(_));
        assert_matches!(valid_contact_number("99999x9999"), Err(_));
        assert_matches!(valid_contact_number(""), Err(_));
    }

    #[test]
    fn test_register_request_is_camel_case() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "username": "tyrone",
            "email": "tyrone@slothrop.com",
            "password": "rocket00000",
            "contactNumber": "9876543210",
        }))
        .unwrap();

        assert_eq!(request.contact_number, "9876543210");
    }

    #[test]
    fn test_envelope_omits_missing_data() {
        let value = serde_json::to_value(ApiResponse::<()>::failure("Token Invalid or Expired"))
            .unwrap();

        assert_eq!(
            value,
            json!({ "success": false, "message": "Token Invalid or Expired" })
        );
    }

    #[test]
    fn test_envelope_with_data() {
        let value = serde_json::to_value(ApiResponse::with_data("ok", json!({ "id": 1 }))).unwrap();

        assert_eq!(
            value,
            json!({ "success": true, "message": "ok", "data": { "id": 1 } })
        );
    }
}

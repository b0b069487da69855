//! Account error taxonomy shared between the server and its clients

/// Expected, user-facing failures of the account flows.
///
/// A mismatched, expired or unknown token are all reported as
/// [`AccountError::TokenInvalid`], so callers can't probe which tokens or
/// accounts exist.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountError {
    /// No account matches the given email address
    #[error("Email Not Found")]
    NotFound,

    /// The token doesn't match any live token of its kind
    #[error("Token Invalid or Expired")]
    TokenInvalid,

    /// The account's email address was verified before
    #[error("Email Already Verified")]
    AlreadyVerified,

    /// The account's email address hasn't been verified yet
    #[error("Email Not Verified")]
    NotVerified,

    /// Email and password don't match
    #[error("Invalid Credentials")]
    InvalidCredentials,

    /// Email address or contact number is taken
    #[error("Email or Contact Number Already Registered")]
    AlreadyRegistered,
}

//! Outbound email

/// An email handed to a [`Notifier`](crate::setups::Notifier).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML body
    pub html: String,
}

impl OutboundEmail {
    /// The email carrying an email verification link.
    pub fn verification(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Email Verification".to_string(),
            text: format!(
                "Confirm your email address by opening the following link: {link}\n\
                 If you didn't create an account, you can ignore this email."
            ),
            html: format!(
                "<h1>Confirm your email address</h1>\
                 <p><a href=\"{link}\">Click here</a> to verify your email address.</p>\
                 <p>If you didn't create an account, you can ignore this email.</p>"
            ),
        }
    }

    /// The email carrying a password reset link.
    pub fn password_reset(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset Password".to_string(),
            text: format!(
                "Reset your password by opening the following link: {link}\n\
                 If you didn't ask for a password reset, you can ignore this email."
            ),
            html: format!(
                "<h1>Reset your password</h1>\
                 <p><a href=\"{link}\">Click here</a> to choose a new password.</p>\
                 <p>If you didn't ask for a password reset, you can ignore this email.</p>"
            ),
        }
    }
}

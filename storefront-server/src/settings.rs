//! Settings / Configuration.

use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use storefront_core::token::TokenKind;
use url::Url;

/// Names of environments for storefront-server.
/// Overrides serialization to force lower case in settings and
/// environment variables
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    /// Local environment (local testing).
    Local,
    /// Official Develop environment.
    Dev,
    /// Official environment.
    Staging,
    /// Official Production environment.
    Prod,
}

/// Implement display to force environment to lower case
impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

/// Database settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    /// Database URL
    pub url: String,
    /// Connect Timeout
    pub connect_timeout: u64,
}

/// Server settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Server [AppEnvironment].
    pub environment: AppEnvironment,
    /// Server port.
    pub port: u16,
    /// Server timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Account token settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Tokens {
    /// How long an email verification token stays redeemable, in seconds.
    pub verification_window_secs: u64,
    /// How long a password reset token stays redeemable, in seconds.
    pub reset_window_secs: u64,
    /// Base URL of the account routes as seen by users.
    /// Links in emails are built as `{link_base_url}/verify-email/{token}` etc.
    pub link_base_url: String,
}

impl Tokens {
    /// The redemption window for tokens of `kind`.
    pub fn window(&self, kind: TokenKind) -> Duration {
        let secs = match kind {
            TokenKind::Verification => self.verification_window_secs,
            TokenKind::Reset => self.reset_window_secs,
        };
        // chrono durations are capped at i64::MAX milliseconds
        Duration::seconds(secs.min(i64::MAX as u64 / 1_000) as i64)
    }
}

impl Default for Tokens {
    fn default() -> Self {
        Self {
            verification_window_secs: 600,
            reset_window_secs: 600,
            link_base_url: "http://localhost:3000/api/user".to_string(),
        }
    }
}

/// [Mailgun] settings.
///
/// [Mailgun]: https://www.mailgun.com/
#[derive(Clone, Deserialize)]
pub struct Mailgun {
    /// Mailgun API key.
    pub api_key: String,
    /// Mailgun domain.
    pub domain: String,
    /// Mailgun From Address
    pub from_address: String,
    /// Mailgun From Name
    pub from_name: String,
}

impl std::fmt::Debug for Mailgun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailgun")
            .field("domain", &self.domain)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Deserialize)]
/// Application settings.
pub struct Settings {
    /// Database settings
    pub database: Database,
    /// Server settings
    pub server: Server,
    /// Account token settings
    #[serde(default)]
    pub tokens: Tokens,
    /// Mailgun settings
    pub mailgun: Mailgun,
    /// The path where the settings file resides.
    /// This can't actually be configured in the settings file itself, for obvious reasons.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Load settings.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .unwrap_or(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/settings.toml"));
        // inject environment variables naming them properly on the settings
        // e.g. [database] url="foo"
        // would be injected with environment variable STOREFRONT_DATABASE__URL="foo".
        // Keys themselves contain underscores, hence the double underscore separator.
        let s = Config::builder()
            .add_source(File::with_name(&path.as_path().display().to_string()))
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut settings: Self = s.try_deserialize()?;

        Url::parse(&settings.tokens.link_base_url).map_err(|e| {
            ConfigError::Message(format!("tokens.link_base_url is not a valid URL: {e}"))
        })?;

        settings.path = Some(path);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_settings_file() {
        let settings = Settings::load(None).unwrap();

        assert_eq!(settings.server.environment, AppEnvironment::Local);
        assert_eq!(settings.tokens.verification_window_secs, 600);
        assert_eq!(settings.tokens.reset_window_secs, 600);
        assert!(settings.path.is_some());
    }

    #[test]
    fn test_default_token_windows() {
        let tokens = Tokens::default();

        assert_eq!(tokens.window(TokenKind::Verification), Duration::minutes(10));
        assert_eq!(tokens.window(TokenKind::Reset), Duration::minutes(10));
    }

    #[test]
    fn test_token_windows_are_independent() {
        let tokens = Tokens {
            verification_window_secs: 60,
            reset_window_secs: 3_600,
            ..Default::default()
        };

        assert_eq!(tokens.window(TokenKind::Verification), Duration::minutes(1));
        assert_eq!(tokens.window(TokenKind::Reset), Duration::hours(1));
    }

    #[test]
    fn test_mailgun_debug_hides_api_key() {
        let mailgun = Mailgun {
            api_key: "key-0123456789".to_string(),
            domain: "mg.example.com".to_string(),
            from_address: "noreply@example.com".to_string(),
            from_name: "Storefront".to_string(),
        };

        assert!(!format!("{mailgun:?}").contains("key-0123456789"));
    }

    #[test]
    fn test_environment_display_is_lowercase() {
        assert_eq!(AppEnvironment::Staging.to_string(), "staging");
    }
}

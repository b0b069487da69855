//! The Axum Application State

use crate::{settings, setups::ServerSetup, token_lifecycle::TokenLifecycle};
use anyhow::{anyhow, Result};
use std::sync::Arc;

#[derive(Clone)]
/// Global application route state.
pub struct AppState<S: ServerSetup> {
    /// Where accounts and their outstanding tokens are kept
    pub accounts: S::AccountStore,
    /// The service that delivers verification and reset emails
    pub notifier: S::Notifier,
    /// Token windows & link settings
    pub token_settings: Arc<settings::Tokens>,
}

impl<S: ServerSetup> AppState<S> {
    /// The token lifecycle manager operating on this state's account store
    pub fn tokens(&self) -> TokenLifecycle<S::AccountStore> {
        TokenLifecycle::new(self.accounts.clone(), Arc::clone(&self.token_settings))
    }
}

/// Builder for [`AppState`]
#[derive(Debug)]
pub struct AppStateBuilder<S: ServerSetup> {
    accounts: Option<S::AccountStore>,
    notifier: Option<S::Notifier>,
    token_settings: Option<settings::Tokens>,
}

impl<S: ServerSetup> Default for AppStateBuilder<S> {
    fn default() -> Self {
        Self {
            accounts: None,
            notifier: None,
            token_settings: None,
        }
    }
}

impl<S: ServerSetup> AppStateBuilder<S> {
    /// Finalize the builder and return the [`AppState`]
    pub fn finalize(self) -> Result<AppState<S>> {
        let accounts = self
            .accounts
            .ok_or_else(|| anyhow!("account store is required"))?;

        let notifier = self.notifier.ok_or_else(|| anyhow!("notifier is required"))?;

        let token_settings = Arc::new(self.token_settings.unwrap_or_default());

        Ok(AppState {
            accounts,
            notifier,
            token_settings,
        })
    }

    /// Set the account store
    pub fn with_accounts(mut self, accounts: S::AccountStore) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Set the service that delivers account emails
    pub fn with_notifier(mut self, notifier: S::Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set token windows & link settings. Defaults apply when unset.
    pub fn with_token_settings(mut self, token_settings: settings::Tokens) -> Self {
        self.token_settings = Some(token_settings);
        self
    }
}

impl<S> std::fmt::Debug for AppState<S>
where
    S: ServerSetup,
    S::AccountStore: std::fmt::Debug,
    S::Notifier: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("accounts", &self.accounts)
            .field("notifier", &self.notifier)
            .field("token_settings", &self.token_settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setups::{
        local::MemoryAccountStore,
        test::{TestNotifier, TestSetup},
    };

    #[test]
    fn test_builder_requires_collaborators() {
        assert!(AppStateBuilder::<TestSetup>::default().finalize().is_err());
        assert!(AppStateBuilder::<TestSetup>::default()
            .with_accounts(MemoryAccountStore::default())
            .finalize()
            .is_err());
    }

    #[test]
    fn test_builder_defaults_token_settings() -> Result<()> {
        let state = AppStateBuilder::<TestSetup>::default()
            .with_accounts(MemoryAccountStore::default())
            .with_notifier(TestNotifier::default())
            .finalize()?;

        assert_eq!(*state.token_settings, settings::Tokens::default());

        Ok(())
    }
}

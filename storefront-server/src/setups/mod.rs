//! This abstracts the server's side-effects into "setups".
//!
//! This module defines the traits, submodules define production, local &
//! test collections of implementations.
use crate::models::{
    account::{Account, NewAccount, Redemption},
    mail::OutboundEmail,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storefront_core::token::{OutstandingToken, TokenDigest, TokenKind};

pub mod local;
pub mod prod;
#[cfg(test)]
pub mod test;

/// This trait groups type parameters to the server's `AppState` struct.
///
/// It captures the setup of the server, distinguishing between e.g.
/// unit testing & production setups.
pub trait ServerSetup: Clone + Send + Sync + 'static {
    /// Where accounts and their outstanding tokens are kept
    type AccountStore: AccountStore;
    /// Which implementation to use to deliver account emails
    type Notifier: Notifier;
}

/// Persistence for accounts and their token pairs.
///
/// Implementations must make [`AccountStore::redeem`] atomic: the match on
/// digest and expiry, the `redemption` and the clearing of the token pair
/// happen as one step, so a token can't be consumed twice.
#[async_trait]
pub trait AccountStore: Clone + Send + Sync + 'static {
    /// Create an account.
    ///
    /// Fails with [`AccountError::AlreadyRegistered`] when the email address
    /// or contact number is taken.
    ///
    /// [`AccountError::AlreadyRegistered`]: storefront_core::error::AccountError::AlreadyRegistered
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Look an account up by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Look up the account holding a token of `kind` with this digest, regardless of expiry.
    async fn find_by_token(&self, kind: TokenKind, digest: &TokenDigest)
        -> Result<Option<Account>>;

    /// Overwrite the account's token pair of `kind`.
    ///
    /// Fails with [`AccountError::NotFound`] for unknown accounts.
    ///
    /// [`AccountError::NotFound`]: storefront_core::error::AccountError::NotFound
    async fn store_token(&self, account_id: i32, kind: TokenKind, token: &OutstandingToken)
        -> Result<()>;

    /// Atomically consume a token of `redemption.kind()`.
    ///
    /// Matches an account whose digest equals `digest` and whose expiry lies
    /// strictly after `now` (for verification, only unverified accounts),
    /// applies the `redemption`, clears the pair and returns the updated
    /// account. `None` when nothing matched.
    async fn redeem(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
        redemption: &Redemption,
    ) -> Result<Option<Account>>;

    /// Whether the store is reachable.
    async fn is_healthy(&self) -> Result<()>;
}

/// The service that delivers account emails
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    /// Deliver the email
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

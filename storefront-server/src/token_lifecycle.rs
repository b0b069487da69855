//! Issuing and redeeming single-use account tokens.
//!
//! A token is 32 random bytes, handed out hex encoded. Only its digest and
//! expiry are persisted. Redemption recomputes the digest and consumes the
//! token through one conditional update in the [`AccountStore`], so at most
//! one redemption of any token ever succeeds.
//!
//! ```text
//!   issue           redeem (before expiry)
//! ───────▶ Pending ───────────────────────▶ Consumed
//!            │ ▲
//!   issue    │ │  (old digest overwritten)
//!            └─┘
//! ```

use crate::{
    models::account::{Account, Redemption},
    settings::Tokens,
    setups::AccountStore,
};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_core::{
    error::AccountError,
    token::{OutstandingToken, PlainToken, TokenKind},
};

/// Issues and redeems verification and reset tokens against an [`AccountStore`].
///
/// Cheap to clone.
#[derive(Clone, Debug)]
pub struct TokenLifecycle<A: AccountStore> {
    accounts: A,
    settings: Arc<Tokens>,
}

impl<A: AccountStore> TokenLifecycle<A> {
    /// Create a lifecycle manager storing tokens in `accounts`,
    /// with redemption windows taken from `settings`.
    pub fn new(accounts: A, settings: Arc<Tokens>) -> Self {
        Self { accounts, settings }
    }

    /// Issue a fresh token of `kind` for `account`, invalidating any earlier token of that kind.
    ///
    /// Returns the plaintext. It's the only copy and must go straight into the outbound message.
    pub async fn issue(&self, kind: TokenKind, account: &Account) -> Result<PlainToken> {
        self.issue_at(kind, account, Utc::now()).await
    }

    /// Like [`TokenLifecycle::issue`], with an explicit clock reading.
    pub async fn issue_at(
        &self,
        kind: TokenKind,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<PlainToken> {
        let token = PlainToken::generate();
        let expires_at = now
            .checked_add_signed(self.settings.window(kind))
            .ok_or_else(|| anyhow!("{kind} token expiry is out of range"))?;

        let outstanding = OutstandingToken {
            digest: token.digest(kind),
            expires_at,
        };

        self.accounts
            .store_token(account.id, kind, &outstanding)
            .await?;

        tracing::debug!(account_id = account.id, %kind, %expires_at, "Issued token");

        Ok(token)
    }

    /// Redeem an email verification token, marking the account as verified.
    ///
    /// Fails with [`AccountError::TokenInvalid`] if the token doesn't match a
    /// live verification token, and with [`AccountError::AlreadyVerified`] if
    /// it does but the account was verified already.
    pub async fn redeem_verification(&self, token: &str) -> Result<Account> {
        self.redeem_verification_at(token, Utc::now()).await
    }

    /// Like [`TokenLifecycle::redeem_verification`], with an explicit clock reading.
    pub async fn redeem_verification_at(&self, token: &str, now: DateTime<Utc>) -> Result<Account> {
        let token: PlainToken = token.parse()?;
        let digest = token.digest(TokenKind::Verification);

        if let Some(account) = self
            .accounts
            .redeem(&digest, now, &Redemption::Verify)
            .await?
        {
            tracing::info!(account_id = account.id, "Email verified");
            return Ok(account);
        }

        let already_verified = self
            .accounts
            .find_by_token(TokenKind::Verification, &digest)
            .await?
            .is_some_and(|account| {
                account.is_verified
                    && account
                        .verification
                        .as_ref()
                        .is_some_and(|outstanding| outstanding.is_live(now))
            });

        if already_verified {
            return Err(AccountError::AlreadyVerified.into());
        }

        Err(AccountError::TokenInvalid.into())
    }

    /// Redeem a password reset token, replacing the account's password hash.
    ///
    /// The new hash is written by the same update that consumes the token.
    /// Fails with [`AccountError::TokenInvalid`] if the token doesn't match a live reset token.
    pub async fn redeem_reset(&self, token: &str, password_hash: String) -> Result<Account> {
        self.redeem_reset_at(token, password_hash, Utc::now()).await
    }

    /// Like [`TokenLifecycle::redeem_reset`], with an explicit clock reading.
    pub async fn redeem_reset_at(
        &self,
        token: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        let token: PlainToken = token.parse()?;
        let digest = token.digest(TokenKind::Reset);

        let account = self
            .accounts
            .redeem(&digest, now, &Redemption::ResetPassword { password_hash })
            .await?
            .ok_or(AccountError::TokenInvalid)?;

        tracing::info!(account_id = account.id, "Password reset");

        Ok(account)
    }

    /// The link a user follows to redeem `token` of `kind`.
    pub fn link(&self, kind: TokenKind, token: &PlainToken) -> String {
        let base = self.settings.link_base_url.trim_end_matches('/');
        match kind {
            TokenKind::Verification => format!("{base}/verify-email/{token}"),
            TokenKind::Reset => format!("{base}/reset-password/{token}"),
        }
    }
}

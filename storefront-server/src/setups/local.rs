//! Server setup for local development & easier integration testing

use crate::{
    models::{
        account::{Account, NewAccount, Redemption},
        mail::OutboundEmail,
    },
    setups::{AccountStore, Notifier, ServerSetup},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};
use storefront_core::{
    error::AccountError,
    token::{OutstandingToken, TokenDigest, TokenKind},
};

/// Implementation of `ServerSetup` for local environments.
/// Accounts live in memory and emails are only logged, so the server
/// runs without postgres or a mailgun account.
#[derive(Debug, Clone)]
pub struct LocalSetup;

impl ServerSetup for LocalSetup {
    type AccountStore = MemoryAccountStore;
    type Notifier = LogNotifier;
}

/// An [`AccountStore`] keeping accounts in process memory.
///
/// Every operation runs under a single lock, which is what makes
/// [`AccountStore::redeem`] atomic here.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    inner: Arc<Mutex<Accounts>>,
}

#[derive(Debug, Default)]
struct Accounts {
    last_id: i32,
    by_id: BTreeMap<i32, Account>,
}

impl MemoryAccountStore {
    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    /// Whether no account was created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut accounts = self.inner.lock();

        let taken = accounts.by_id.values().any(|existing| {
            existing.email == account.email || existing.contact_number == account.contact_number
        });
        if taken {
            return Err(AccountError::AlreadyRegistered.into());
        }

        accounts.last_id += 1;
        let now = Utc::now();
        let account = Account {
            id: accounts.last_id,
            username: account.username,
            email: account.email,
            contact_number: account.contact_number,
            password_hash: account.password_hash,
            is_verified: false,
            verification: None,
            reset: None,
            inserted_at: now,
            updated_at: now,
        };

        accounts.by_id.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .inner
            .lock()
            .by_id
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_token(
        &self,
        kind: TokenKind,
        digest: &TokenDigest,
    ) -> Result<Option<Account>> {
        Ok(self
            .inner
            .lock()
            .by_id
            .values()
            .find(|account| {
                account
                    .outstanding(kind)
                    .is_some_and(|token| &token.digest == digest)
            })
            .cloned())
    }

    async fn store_token(
        &self,
        account_id: i32,
        kind: TokenKind,
        token: &OutstandingToken,
    ) -> Result<()> {
        let mut accounts = self.inner.lock();
        let account = accounts
            .by_id
            .get_mut(&account_id)
            .ok_or(AccountError::NotFound)?;

        match kind {
            TokenKind::Verification => account.verification = Some(token.clone()),
            TokenKind::Reset => account.reset = Some(token.clone()),
        }
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn redeem(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
        redemption: &Redemption,
    ) -> Result<Option<Account>> {
        let kind = redemption.kind();
        let mut accounts = self.inner.lock();

        let Some(account) = accounts.by_id.values_mut().find(|account| {
            account
                .outstanding(kind)
                .is_some_and(|token| token.redeemable_with(digest, now))
        }) else {
            return Ok(None);
        };

        match redemption {
            Redemption::Verify => {
                if account.is_verified {
                    return Ok(None);
                }
                account.is_verified = true;
                account.verification = None;
            }
            Redemption::ResetPassword { password_hash } => {
                account.password_hash = password_hash.clone();
                account.reset = None;
            }
        }
        account.updated_at = now;

        Ok(Some(account.clone()))
    }

    async fn is_healthy(&self) -> Result<()> {
        Ok(())
    }
}

/// A [`Notifier`] that doesn't actually send emails, but logs them via tracing.
///
/// The log line carries the link, which is the point of running locally.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            text = %email.text,
            "Email (not sent, local environment)"
        );
        Ok(())
    }
}

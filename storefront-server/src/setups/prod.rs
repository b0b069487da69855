//! Production server setup code

use crate::{
    db::{self, Pool},
    models::{
        account::{Account, AccountRecord, NewAccount, Redemption},
        mail::OutboundEmail,
    },
    settings,
    setups::{AccountStore, Notifier, ServerSetup},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use mailgun_rs::{EmailAddress, Mailgun, MailgunRegion, Message};
use storefront_core::{
    error::AccountError,
    token::{OutstandingToken, TokenDigest, TokenKind},
};

/// Production implementation of `ServerSetup`.
/// Keeps accounts in postgres and sends emails via mailgun, both configured in `settings.toml`.
#[derive(Clone, Debug, Default)]
pub struct ProdSetup;

impl ServerSetup for ProdSetup {
    type AccountStore = PgAccountStore;
    type Notifier = MailgunNotifier;
}

/// An [`AccountStore`] backed by postgres.
#[derive(Clone, Debug)]
pub struct PgAccountStore {
    pool: Pool,
}

impl PgAccountStore {
    /// Use accounts stored in the database behind `pool`
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let conn = &mut db::connect(&self.pool).await?;

        match AccountRecord::insert(conn, &account).await {
            Ok(record) => Ok(record.into()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(AccountError::AlreadyRegistered.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = &mut db::connect(&self.pool).await?;

        Ok(AccountRecord::find_by_email(conn, email)
            .await?
            .map(Account::from))
    }

    async fn find_by_token(
        &self,
        kind: TokenKind,
        digest: &TokenDigest,
    ) -> Result<Option<Account>> {
        let conn = &mut db::connect(&self.pool).await?;

        Ok(AccountRecord::find_by_digest(conn, kind, digest)
            .await?
            .map(Account::from))
    }

    async fn store_token(
        &self,
        account_id: i32,
        kind: TokenKind,
        token: &OutstandingToken,
    ) -> Result<()> {
        let conn = &mut db::connect(&self.pool).await?;

        match AccountRecord::store_token(conn, account_id, kind, token).await? {
            0 => Err(AccountError::NotFound.into()),
            _ => Ok(()),
        }
    }

    async fn redeem(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
        redemption: &Redemption,
    ) -> Result<Option<Account>> {
        let conn = &mut db::connect(&self.pool).await?;

        Ok(AccountRecord::redeem(conn, digest, now, redemption)
            .await?
            .map(Account::from))
    }

    async fn is_healthy(&self) -> Result<()> {
        let conn = &mut db::connect(&self.pool).await?;

        diesel::sql_query("SELECT 1")
            .execute(conn)
            .await
            .map_err(|e| anyhow!("Database is unreachable: {e}"))?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Delivers account emails via mailgun
pub struct MailgunNotifier {
    settings: settings::Mailgun,
}

impl MailgunNotifier {
    /// Create a new MailgunNotifier
    pub fn new(settings: settings::Mailgun) -> Self {
        Self { settings }
    }

    fn sender(&self) -> EmailAddress {
        EmailAddress::name_address(&self.settings.from_name, &self.settings.from_address)
    }

    fn message(&self, email: &OutboundEmail) -> Message {
        Message {
            to: vec![EmailAddress::address(&email.to)],
            subject: email.subject.clone(),
            text: email.text.clone(),
            html: email.html.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        tracing::debug!(to = %email.to, subject = %email.subject, "Sending email via mailgun");

        let client = Mailgun {
            message: self.message(email),
            api_key: self.settings.api_key.clone(),
            domain: self.settings.domain.clone(),
        };

        client
            .async_send(MailgunRegion::US, &self.sender())
            .await
            .map_err(|e| anyhow!("Mailgun delivery failed: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ephemeral_db::EphemeralDb;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use storefront_core::token::PlainToken;
    use testresult::TestResult;

    fn new_account(email: &str, contact_number: &str) -> NewAccount {
        NewAccount {
            username: "shopper".to_string(),
            email: email.to_string(),
            contact_number: contact_number.to_string(),
            password_hash: "$argon2id$v=19$placeholder".to_string(),
        }
    }

    #[test]
    fn test_mailgun_message_carries_both_bodies() {
        let notifier = MailgunNotifier::new(settings::Mailgun {
            api_key: "key".to_string(),
            domain: "mg.example.com".to_string(),
            from_address: "noreply@example.com".to_string(),
            from_name: "Storefront".to_string(),
        });
        let email = OutboundEmail::verification("shopper@example.com", "http://x/verify-email/t");

        let message = notifier.message(&email);

        assert_eq!(message.subject, email.subject);
        assert_eq!(message.text, email.text);
        assert_eq!(message.html, email.html);
        assert_eq!(message.to.len(), 1);
    }

    #[test_log::test(tokio::test)]
    #[ignore = "needs a local postgres"]
    async fn test_pg_duplicate_email_is_already_registered() -> TestResult {
        let db = EphemeralDb::create().await?;
        let store = PgAccountStore::new(db.pool().clone());

        store
            .create(new_account("shopper@example.com", "9876543210"))
            .await?;
        let err = store
            .create(new_account("shopper@example.com", "9876543211"))
            .await
            .unwrap_err();

        assert_matches!(
            err.downcast_ref::<AccountError>(),
            Some(AccountError::AlreadyRegistered)
        );

        Ok(())
    }

    #[test_log::test(tokio::test)]
    #[ignore = "needs a local postgres"]
    async fn test_pg_redeem_is_conditional_and_single_use() -> TestResult {
        let db = EphemeralDb::create().await?;
        let store = PgAccountStore::new(db.pool().clone());
        let account = store
            .create(new_account("shopper@example.com", "9876543210"))
            .await?;

        let now = Utc::now();
        let token = PlainToken::generate();
        let digest = token.digest(TokenKind::Verification);
        store
            .store_token(
                account.id,
                TokenKind::Verification,
                &OutstandingToken {
                    digest: digest.clone(),
                    expires_at: now + Duration::minutes(10),
                },
            )
            .await?;

        // past the expiry nothing matches
        let expired = now + Duration::minutes(10);
        assert_eq!(store.redeem(&digest, expired, &Redemption::Verify).await?, None);

        let redeemed = store
            .redeem(&digest, now, &Redemption::Verify)
            .await?
            .expect("live token redeems");
        assert!(redeemed.is_verified);
        assert_eq!(redeemed.verification, None);

        assert_eq!(store.redeem(&digest, now, &Redemption::Verify).await?, None);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    #[ignore = "needs a local postgres"]
    async fn test_pg_store_token_for_unknown_account() -> TestResult {
        let db = EphemeralDb::create().await?;
        let store = PgAccountStore::new(db.pool().clone());

        let err = store
            .store_token(
                4242,
                TokenKind::Reset,
                &OutstandingToken {
                    digest: PlainToken::generate().digest(TokenKind::Reset),
                    expires_at: Utc::now(),
                },
            )
            .await
            .unwrap_err();

        assert_matches!(err.downcast_ref::<AccountError>(), Some(AccountError::NotFound));
        assert!(store.is_healthy().await.is_ok());

        Ok(())
    }
}

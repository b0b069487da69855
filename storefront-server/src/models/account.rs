//! Account model
use crate::db::{schema::accounts, Conn};
use chrono::{DateTime, Utc};
use diesel::{
    pg::Pg, ExpressionMethods, Insertable, OptionalExtension, QueryDsl, Queryable, Selectable,
    SelectableHelper,
};
use diesel_async::RunQueryDsl;
use storefront_core::{
    common::AccountResponse,
    token::{OutstandingToken, TokenDigest, TokenKind},
};

/// A user account, with its outstanding verification and reset tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Internal Database Identifier
    pub id: i32,
    /// Display name
    pub username: String,
    /// Email address, unique across accounts
    pub email: String,
    /// Contact number, unique across accounts
    pub contact_number: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Whether the email address was confirmed. Never reverts once set.
    pub is_verified: bool,
    /// Outstanding email verification token, if any
    pub verification: Option<OutstandingToken>,
    /// Outstanding password reset token, if any
    pub reset: Option<OutstandingToken>,
    /// Inserted at timestamp
    pub inserted_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// The outstanding token of `kind`, if one was issued and not redeemed yet.
    ///
    /// The token may already be expired.
    pub fn outstanding(&self, kind: TokenKind) -> Option<&OutstandingToken> {
        match kind {
            TokenKind::Verification => self.verification.as_ref(),
            TokenKind::Reset => self.reset.as_ref(),
        }
    }

    /// Public representation, without the password hash or token state.
    pub fn to_response(&self) -> AccountResponse {
        AccountResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            contact_number: self.contact_number.clone(),
            is_verified: self.is_verified,
            created_at: self.inserted_at,
        }
    }
}

/// What a successful redemption does to the account, besides clearing the token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redemption {
    /// Mark the email address as verified.
    Verify,
    /// Replace the password hash.
    ResetPassword {
        /// The new argon2 PHC string
        password_hash: String,
    },
}

impl Redemption {
    /// The kind of token this redemption consumes.
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Verify => TokenKind::Verification,
            Self::ResetPassword { .. } => TokenKind::Reset,
        }
    }
}

/// New Account (for creating new accounts)
#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Contact number
    pub contact_number: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Account Record, as stored in postgres
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(Pg))]
pub struct AccountRecord {
    /// Internal Database Identifier
    pub id: i32,
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Contact number
    pub contact_number: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Email confirmed
    pub is_verified: bool,
    /// Verification token digest
    pub verification_digest: Option<String>,
    /// Verification token expiry
    pub verification_expires_at: Option<DateTime<Utc>>,
    /// Reset token digest
    pub reset_digest: Option<String>,
    /// Reset token expiry
    pub reset_expires_at: Option<DateTime<Utc>>,
    /// Inserted at timestamp
    pub inserted_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            contact_number: record.contact_number,
            password_hash: record.password_hash,
            is_verified: record.is_verified,
            verification: OutstandingToken::from_parts(
                record.verification_digest,
                record.verification_expires_at,
            ),
            reset: OutstandingToken::from_parts(record.reset_digest, record.reset_expires_at),
            inserted_at: record.inserted_at,
            updated_at: record.updated_at,
        }
    }
}

impl AccountRecord {
    /// Insert a new account.
    pub async fn insert(
        conn: &mut Conn<'_>,
        account: &NewAccount,
    ) -> Result<Self, diesel::result::Error> {
        tracing::debug!(email = %account.email, "Creating new account record");

        diesel::insert_into(accounts::table)
            .values(account)
            .returning(AccountRecord::as_returning())
            .get_result(conn)
            .await
    }

    /// Find an account by email address.
    pub async fn find_by_email(
        conn: &mut Conn<'_>,
        email: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        accounts::table
            .filter(accounts::email.eq(email))
            .select(AccountRecord::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Find the account holding a token of `kind` with the given digest, expired or not.
    pub async fn find_by_digest(
        conn: &mut Conn<'_>,
        kind: TokenKind,
        digest: &TokenDigest,
    ) -> Result<Option<Self>, diesel::result::Error> {
        match kind {
            TokenKind::Verification => {
                accounts::table
                    .filter(accounts::verification_digest.eq(digest.as_str()))
                    .select(AccountRecord::as_select())
                    .first(conn)
                    .await
                    .optional()
            }
            TokenKind::Reset => {
                accounts::table
                    .filter(accounts::reset_digest.eq(digest.as_str()))
                    .select(AccountRecord::as_select())
                    .first(conn)
                    .await
                    .optional()
            }
        }
    }

    /// Overwrite the token pair of `kind`. Returns the number of updated rows.
    pub async fn store_token(
        conn: &mut Conn<'_>,
        id: i32,
        kind: TokenKind,
        token: &OutstandingToken,
    ) -> Result<usize, diesel::result::Error> {
        let target = accounts::table.filter(accounts::id.eq(id));

        match kind {
            TokenKind::Verification => {
                diesel::update(target)
                    .set((
                        accounts::verification_digest.eq(token.digest.as_str()),
                        accounts::verification_expires_at.eq(token.expires_at),
                        accounts::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await
            }
            TokenKind::Reset => {
                diesel::update(target)
                    .set((
                        accounts::reset_digest.eq(token.digest.as_str()),
                        accounts::reset_expires_at.eq(token.expires_at),
                        accounts::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await
            }
        }
    }

    /// Consume a token in a single conditional update.
    ///
    /// Only a row whose digest matches and whose expiry lies after `now` is
    /// touched. The token pair is cleared in the same statement that applies
    /// the `redemption`, so out of any number of concurrent calls at most one
    /// gets a row back.
    pub async fn redeem(
        conn: &mut Conn<'_>,
        digest: &TokenDigest,
        now: DateTime<Utc>,
        redemption: &Redemption,
    ) -> Result<Option<Self>, diesel::result::Error> {
        match redemption {
            Redemption::Verify => {
                diesel::update(
                    accounts::table
                        .filter(accounts::verification_digest.eq(digest.as_str()))
                        .filter(accounts::verification_expires_at.gt(now))
                        .filter(accounts::is_verified.eq(false)),
                )
                .set((
                    accounts::is_verified.eq(true),
                    accounts::verification_digest.eq(None::<String>),
                    accounts::verification_expires_at.eq(None::<DateTime<Utc>>),
                    accounts::updated_at.eq(now),
                ))
                .returning(AccountRecord::as_returning())
                .get_result(conn)
                .await
                .optional()
            }
            Redemption::ResetPassword { password_hash } => {
                diesel::update(
                    accounts::table
                        .filter(accounts::reset_digest.eq(digest.as_str()))
                        .filter(accounts::reset_expires_at.gt(now)),
                )
                .set((
                    accounts::password_hash.eq(password_hash.as_str()),
                    accounts::reset_digest.eq(None::<String>),
                    accounts::reset_expires_at.eq(None::<DateTime<Utc>>),
                    accounts::updated_at.eq(now),
                ))
                .returning(AccountRecord::as_returning())
                .get_result(conn)
                .await
                .optional()
            }
        }
    }
}

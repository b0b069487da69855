//! Single-use account tokens: generation, digests and outstanding token pairs.
//!
//! A [`PlainToken`] only ever leaves the server inside an outbound message.
//! What gets persisted is its [`TokenDigest`], paired with an expiry as an
//! [`OutstandingToken`].

use chrono::{DateTime, Utc};
use hex::ToHex;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AccountError;

/// Number of random bytes backing a token. Hex encoded this gives 64 characters.
pub const TOKEN_BYTES: usize = 32;

/// Which account flow a token belongs to.
///
/// Both kinds share one algorithm but have independent lifecycles, and
/// their digests are derived under distinct contexts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Email address verification
    Verification,
    /// Password reset
    Reset,
}

impl TokenKind {
    /// Key derivation context used when digesting tokens of this kind.
    fn context(self) -> &'static str {
        match self {
            Self::Verification => "storefront 2024-03-11 email verification tokens",
            Self::Reset => "storefront 2024-03-11 password reset tokens",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verification => f.write_str("verification"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

/// A plaintext token, as handed to the user.
///
/// The `Debug` implementation is redacted so tokens don't end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainToken {
    inner: String,
}

impl PlainToken {
    /// Generate a fresh token from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            inner: bytes.encode_hex(),
        }
    }

    /// The token as it appears in links.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Compute the digest that gets stored for this token.
    pub fn digest(&self, kind: TokenKind) -> TokenDigest {
        TokenDigest::compute(kind, self)
    }
}

impl std::fmt::Debug for PlainToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PlainToken").field(&"<redacted>").finish()
    }
}

impl std::fmt::Display for PlainToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl FromStr for PlainToken {
    type Err = AccountError;

    /// Parses a token received in a request.
    ///
    /// Anything that couldn't have been produced by [`PlainToken::generate`]
    /// is rejected as [`AccountError::TokenInvalid`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed =
            s.len() == TOKEN_BYTES * 2 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        if !well_formed {
            return Err(AccountError::TokenInvalid);
        }

        Ok(Self {
            inner: s.to_string(),
        })
    }
}

/// A one-way digest of a [`PlainToken`], hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Derive the digest of `token` for the given `kind`.
    ///
    /// Deterministic, so redemption can recompute it and look the account up.
    pub fn compute(kind: TokenKind, token: &PlainToken) -> Self {
        let digest = blake3::derive_key(kind.context(), token.as_str().as_bytes());
        Self(digest.encode_hex())
    }

    /// Wrap a digest loaded back from storage.
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    /// Hex representation, as persisted.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// The persisted half of an issued token: its digest and when it stops being redeemable.
///
/// Digest and expiry only ever exist together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutstandingToken {
    /// Digest of the issued plaintext
    pub digest: TokenDigest,
    /// Redemption must happen strictly before this instant
    pub expires_at: DateTime<Utc>,
}

impl OutstandingToken {
    /// Rebuild the pair from two nullable columns.
    ///
    /// Returns `None` unless both halves are present.
    pub fn from_parts(digest: Option<String>, expires_at: Option<DateTime<Utc>>) -> Option<Self> {
        match (digest, expires_at) {
            (Some(digest), Some(expires_at)) => Some(Self {
                digest: TokenDigest::from_stored(digest),
                expires_at,
            }),
            _ => None,
        }
    }

    /// Whether the token can still be redeemed at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether a redemption presenting `digest` at `now` matches this token.
    pub fn redeemable_with(&self, digest: &TokenDigest, now: DateTime<Utc>) -> bool {
        &self.digest == digest && self.is_live(now)
    }
}

//! Test server setup code

use crate::{
    models::mail::OutboundEmail,
    setups::{local::MemoryAccountStore, Notifier, ServerSetup},
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use storefront_core::token::{TokenKind, TOKEN_BYTES};

#[derive(Clone, Debug, Default)]
pub struct TestSetup;

impl ServerSetup for TestSetup {
    type AccountStore = MemoryAccountStore;
    type Notifier = TestNotifier;
}

/// Records every email instead of sending it. Can be told to fail deliveries.
#[derive(Debug, Clone, Default)]
pub struct TestNotifier {
    emails: Arc<Mutex<Vec<OutboundEmail>>>,
    failing: Arc<AtomicBool>,
}

impl TestNotifier {
    pub fn get_emails(&self) -> Vec<OutboundEmail> {
        self.emails.lock().clone()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The plaintext token in the most recent email carrying a link of `kind`.
    pub fn last_token(&self, kind: TokenKind) -> Option<String> {
        let marker = match kind {
            TokenKind::Verification => "/verify-email/",
            TokenKind::Reset => "/reset-password/",
        };

        self.emails.lock().iter().rev().find_map(|email| {
            let start = email.text.find(marker)? + marker.len();
            email
                .text
                .get(start..start + TOKEN_BYTES * 2)
                .map(str::to_string)
        })
    }
}

#[async_trait]
impl Notifier for TestNotifier {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Delivery to {} failed", email.to);
        }

        self.emails.lock().push(email.clone());
        Ok(())
    }
}

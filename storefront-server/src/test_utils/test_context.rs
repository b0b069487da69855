//! Helpers for running isolated webserver instances
use crate::{
    app_state::{AppState, AppStateBuilder},
    router::setup_app_router,
    setups::{
        local::MemoryAccountStore,
        test::{TestNotifier, TestSetup},
    },
};
use anyhow::Result;
use axum::Router;

/// A reference to an isolated server instance, backed by an in-memory account store
#[derive(Debug)]
pub struct TestContext {
    app: Router,
    app_state: AppState<TestSetup>,
}

impl TestContext {
    /// Create a new test context
    pub fn new() -> Result<Self> {
        Self::new_with_state(|builder| builder)
    }

    pub fn new_with_state<F>(f: F) -> Result<Self>
    where
        F: FnOnce(AppStateBuilder<TestSetup>) -> AppStateBuilder<TestSetup>,
    {
        let builder = AppStateBuilder::default()
            .with_accounts(MemoryAccountStore::default())
            .with_notifier(TestNotifier::default());

        let app_state = f(builder).finalize()?;

        let app = setup_app_router(app_state.clone());

        Ok(Self { app, app_state })
    }

    pub fn app(&self) -> Router {
        self.app.clone()
    }

    pub fn notifier(&self) -> &TestNotifier {
        &self.app_state.notifier
    }

    pub fn accounts(&self) -> &MemoryAccountStore {
        &self.app_state.accounts
    }
}

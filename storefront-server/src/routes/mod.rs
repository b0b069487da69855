//! Routes for [axum::Router].

pub mod account;
pub mod fallback;
pub mod health;
pub mod ping;

//! Testing utilities
pub mod ephemeral_db;
pub mod route_builder;
pub mod test_context;

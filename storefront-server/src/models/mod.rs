//! This module contains all the models used in the application.
pub mod account;
pub mod mail;

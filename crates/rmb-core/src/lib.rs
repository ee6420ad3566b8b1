//! Core domain + application logic for the RecapMaker account bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / MongoDB live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod store;

pub use errors::{Error, Result};

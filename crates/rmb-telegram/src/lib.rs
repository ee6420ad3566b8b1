//! Telegram adapter (teloxide).
//!
//! Maps incoming Telegram updates onto `rmb-core` commands and sends back the
//! reply text. One reply per inbound message.

pub mod handlers;
pub mod router;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so handlers can
/// tell the "normal branch" cases apart from failures that warrant a generic
/// user-visible error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    /// A record for this external id already exists. Raised atomically by the
    /// store's unique key, so two racing registrations cannot both insert.
    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

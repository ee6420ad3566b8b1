use serde::{Deserialize, Serialize};

/// A user's persisted document in the `users` collection.
///
/// Field names match the documents the dashboard already reads, so both apps
/// can share a database.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub telegram_id: String,
    pub login_username: String,
    // TODO: hash before storing once the dashboard login flow verifies hashes.
    pub password: String,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub daily_usage_count: i64,
    #[serde(default)]
    pub last_usage_date: String,
}

impl UserRecord {
    /// A fresh record with registration defaults. Users registering through
    /// the bot are auto-verified.
    pub fn new(
        telegram_id: impl Into<String>,
        login_username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            telegram_id: telegram_id.into(),
            login_username: login_username.into(),
            password: password.into(),
            coins: 0,
            is_verified: true,
            is_banned: false,
            daily_usage_count: 0,
            last_usage_date: String::new(),
        }
    }
}

/// Singleton settings document in the `system_config` collection, keyed by
/// `setting_name = "global_config"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub daily_free_limit: i64,
}

/// The sender of an inbound message, as supplied by the messaging transport.
#[derive(Clone, Debug)]
pub struct Identity {
    /// Stable external id (stringified Telegram user id).
    pub external_id: String,
    pub display_name: Option<String>,
}

use async_trait::async_trait;

use crate::{
    domain::{GlobalSettings, UserRecord},
    Result,
};

/// Port over the persistent user collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` is the normal "not registered yet" branch.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>>;

    /// Insert a new record. The store enforces a unique key on the external
    /// id, so a conflicting insert fails with [`crate::Error::AlreadyRegistered`]
    /// instead of creating a duplicate.
    async fn insert(&self, user: &UserRecord) -> Result<()>;
}

/// Port over the singleton settings document.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` means "no limit configured", not an error.
    async fn global_settings(&self) -> Result<Option<GlobalSettings>>;
}

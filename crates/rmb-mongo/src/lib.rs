//! MongoDB adapter.
//!
//! Implements the `rmb-core` store ports over the `users` and `system_config`
//! collections. Connecting also creates the unique key on `telegram_id`, which
//! is what makes duplicate registrations fail atomically instead of racing.

use async_trait::async_trait;

use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, IndexModel,
};

use rmb_core::{
    domain::{GlobalSettings, UserRecord},
    errors::Error,
    store::{ConfigStore, UserStore},
    Result,
};

const USERS_COLLECTION: &str = "users";
const CONFIG_COLLECTION: &str = "system_config";
const GLOBAL_SETTINGS_KEY: &str = "global_config";

pub struct MongoUserStore {
    coll: Collection<UserRecord>,
}

pub struct MongoConfigStore {
    coll: Collection<GlobalSettings>,
}

/// Both adapters, connected and ready. Construction is fallible on purpose:
/// handlers only ever see stores that finished initializing.
pub struct MongoStores {
    pub users: MongoUserStore,
    pub config: MongoConfigStore,
}

impl MongoStores {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await.map_err(store_err)?;
        let db = client.database(database);

        // Client construction is lazy; ping so a bad URI fails here, at
        // startup, rather than on the first user command.
        db.run_command(doc! { "ping": 1 }).await.map_err(store_err)?;

        let users: Collection<UserRecord> = db.collection(USERS_COLLECTION);
        let config: Collection<GlobalSettings> = db.collection(CONFIG_COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "telegram_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(index).await.map_err(store_err)?;

        tracing::info!(database, "connected to MongoDB");

        Ok(Self {
            users: MongoUserStore { coll: users },
            config: MongoConfigStore { coll: config },
        })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>> {
        self.coll
            .find_one(doc! { "telegram_id": external_id })
            .await
            .map_err(store_err)
    }

    async fn insert(&self, user: &UserRecord) -> Result<()> {
        match self.coll.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(Error::AlreadyRegistered(user.telegram_id.clone()))
            }
            Err(e) => Err(store_err(e)),
        }
    }
}

#[async_trait]
impl ConfigStore for MongoConfigStore {
    async fn global_settings(&self) -> Result<Option<GlobalSettings>> {
        self.coll
            .find_one(doc! { "setting_name": GLOBAL_SETTINGS_KEY })
            .await
            .map_err(store_err)
    }
}

fn store_err(e: mongodb::error::Error) -> Error {
    Error::Store(format!("mongodb: {e}"))
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        &*e.kind,
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

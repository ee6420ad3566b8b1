use std::sync::Arc;

use rmb_core::{commands::AccountService, config::Config};
use rmb_mongo::MongoStores;

#[tokio::main]
async fn main() -> Result<(), rmb_core::Error> {
    rmb_core::logging::init("rmb")?;

    let cfg = Arc::new(Config::load()?);

    // Store bootstrap is fatal here; handlers never run against a store that
    // did not finish initializing.
    let stores = MongoStores::connect(&cfg.mongo_uri, &cfg.mongo_database).await?;

    let service = Arc::new(AccountService::new(
        Arc::new(stores.users),
        Arc::new(stores.config),
        cfg.dashboard_url.clone(),
        cfg.password_length,
    ));

    rmb_telegram::router::run_polling(cfg, service)
        .await
        .map_err(|e| rmb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

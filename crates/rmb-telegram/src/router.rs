use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use rmb_core::{commands::AccountService, config::Config};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<AccountService>,
}

/// Long-poll Telegram for updates until the process is stopped.
pub async fn run_polling(cfg: Arc<Config>, service: Arc<AccountService>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(bot = %me.username(), "bot started, waiting for messages"),
        Err(e) => tracing::warn!(error = %e, "get_me failed at startup"),
    }

    let state = Arc::new(AppState { cfg, service });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

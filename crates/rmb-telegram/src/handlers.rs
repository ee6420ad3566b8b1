use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use rmb_core::{commands::Command, domain::Identity};

use crate::router::AppState;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    // Non-text updates (stickers, photos, ...) are ignored; free text gets the
    // fallback reply from the dispatcher.
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let who = Identity {
        external_id: user.id.0.to_string(),
        display_name: non_empty(&user.first_name),
    };

    let reply = state.service.dispatch(Command::parse(text), &who).await;

    let mut req = bot.send_message(msg.chat.id, reply.text);
    if reply.html {
        req = req.parse_mode(ParseMode::Html);
    }
    if let Err(e) = req.await {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to send reply");
    }

    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

//! Bot construction and the manual long-polling loop.

use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use mistok_config::TelegramConfig;

use crate::{dispatch::Dispatcher, handlers};

/// Build the bot with a client timeout longer than the long-polling timeout
/// (30s) so the HTTP client doesn't abort the request before Telegram
/// responds.
pub fn build_bot(config: &TelegramConfig) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Verify credentials, register commands, and spawn the polling loop.
///
/// The loop runs until `cancel` fires, or cancels the token itself when
/// another instance grabs the same token.
pub async fn start_polling(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    let username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Головне меню"),
        BotCommand::new("consultations", "Список консультацій (для адміністраторів)"),
        BotCommand::new("users", "Список користувачів (для адміністраторів)"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?username, "telegram bot connected (webhook cleared)");

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(msg, &dispatcher).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            }
                            UpdateKind::CallbackQuery(query) => {
                                debug!(callback_data = ?query.data, "received callback query");
                                if let Err(e) =
                                    handlers::handle_callback_query(query, &dispatcher).await
                                {
                                    error!(error = %e, "error handling callback query");
                                }
                            }
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            }
                        }
                    }
                }
                Err(e) => {
                    // Another instance polling with the same token: stand down
                    // rather than fight over updates.
                    let is_conflict =
                        matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates));
                    if is_conflict {
                        warn!("another bot instance is already running with this token, stopping");
                        cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    });

    Ok(())
}

//! Outbound message sending.
//!
//! The dispatcher talks to a [`Transport`] trait; [`TelegramTransport`]
//! implements it over teloxide with bounded RetryAfter handling.

use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{
            ButtonRequest, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
            KeyboardMarkup as ReplyKeyboardMarkup, KeyboardRemove as ReplyKeyboardRemove,
            MessageId, ReplyMarkup,
        },
    },
    tracing::warn,
};

use mistok_common::PartyId;

use crate::{
    error::{Error, Result},
    menus::{self, Menu},
};

/// Transport-level handle of an inbound message, used for verbatim copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef(pub i32);

/// What the dispatcher needs from the messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to `to`, optionally attaching a button layout.
    async fn send_text(&self, to: PartyId, text: &str, menu: Option<Menu>) -> Result<()>;

    /// Copy a message verbatim (any content type) from `from` to `to`.
    async fn copy_message(&self, to: PartyId, from: PartyId, message: MessageRef) -> Result<()>;

    /// Replace the text of a previously sent message (callback responses).
    async fn edit_text(&self, chat: PartyId, message: MessageRef, text: &str) -> Result<()>;

    /// Acknowledge a callback query so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}

const RETRY_AFTER_MAX_RETRIES: usize = 4;

/// teloxide-backed transport.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Run a request, honoring RetryAfter up to a bounded retry count.
    /// Any other failure surfaces immediately; retry policy beyond rate
    /// limits belongs to the caller.
    async fn run_with_retry<T, F, Fut>(
        &self,
        to: PartyId,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = to.0,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = to.0,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, to: PartyId, text: &str, menu: Option<Menu>) -> Result<()> {
        let chat_id = ChatId(to.0);
        let markup = menu.as_ref().map(resolve_menu);
        self.run_with_retry(to, "send message", || {
            let mut req = self.bot.send_message(chat_id, text);
            if let Some(markup) = markup.clone() {
                req = req.reply_markup(markup);
            }
            async move { req.await }
        })
        .await
        .map_err(Error::Telegram)?;
        Ok(())
    }

    async fn copy_message(&self, to: PartyId, from: PartyId, message: MessageRef) -> Result<()> {
        self.run_with_retry(to, "copy message", || {
            let req = self
                .bot
                .copy_message(ChatId(to.0), ChatId(from.0), MessageId(message.0));
            async move { req.await }
        })
        .await
        .map_err(Error::Telegram)?;
        Ok(())
    }

    async fn edit_text(&self, chat: PartyId, message: MessageRef, text: &str) -> Result<()> {
        self.run_with_retry(chat, "edit message", || {
            let req = self
                .bot
                .edit_message_text(ChatId(chat.0), MessageId(message.0), text);
            async move { req.await }
        })
        .await
        .map_err(Error::Telegram)?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.bot.answer_callback_query(callback_id.to_owned()).await?;
        Ok(())
    }
}

/// Resolve a logical menu to the native Telegram widget.
fn resolve_menu(menu: &Menu) -> ReplyMarkup {
    match menu {
        Menu::Main => reply_keyboard(&[
            &[menus::BTN_CONTEXT_ADS, menus::BTN_SITE_CREATION],
            &[menus::BTN_CONSULTATIONS, menus::BTN_MAP_PINS],
        ]),
        Menu::ServiceOptions => reply_keyboard(&[
            &[menus::BTN_CONTACT_ADMINS],
            &[menus::BTN_BACK_TO_MAIN],
        ]),
        Menu::Admin => reply_keyboard(&[
            &[menus::BTN_LIST_CONSULTATIONS, menus::BTN_LIST_USERS],
            &[menus::BTN_DELETE_ACCOUNT],
            &[menus::BTN_END_CHAT],
        ]),
        Menu::SharePhone => {
            let share =
                KeyboardButton::new(menus::BTN_SHARE_PHONE).request(ButtonRequest::Contact);
            ReplyMarkup::Keyboard(
                ReplyKeyboardMarkup::new([[share]])
                    .resize_keyboard()
                    .one_time_keyboard(),
            )
        }
        Menu::Remove => ReplyMarkup::KeyboardRemove(ReplyKeyboardRemove::new()),
        Menu::Inline(rows) => {
            let buttons = rows.iter().map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
                    .collect::<Vec<_>>()
            });
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(buttons))
        }
    }
}

fn reply_keyboard(rows: &[&[&str]]) -> ReplyMarkup {
    let keyboard = rows
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>());
    ReplyMarkup::Keyboard(ReplyKeyboardMarkup::new(keyboard).resize_keyboard())
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

//! Telegram transport adapter and the event dispatcher.
//!
//! Receives updates via manual long polling, classifies each one through
//! the fixed priority policy (contact → phone gate → relay session → menu)
//! and executes the resulting action against the transport and the stores.

pub mod access;
pub mod admin;
pub mod bot;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod menus;
pub mod outbound;
pub mod texts;

#[cfg(test)]
pub(crate) mod testkit;

pub use {
    dispatch::Dispatcher,
    error::{Error, Result},
    outbound::{TelegramTransport, Transport},
};

//! The session/relay core: the symmetric pairing table that turns a single
//! bot into N independent two-party conversations, the per-party menu state
//! machine, and the normalized command table.
//!
//! This crate is transport-free. It decides; the telegram crate executes.

pub mod command;
pub mod error;
pub mod menu;
pub mod session;

pub use {
    command::{AdminCommand, CommandTable, UserCommand},
    error::Error,
    menu::{MenuAction, MenuFlow, MenuState, MenuStates},
    session::{SessionTable, StartOutcome},
};

//! Per-party menu state and the finite-state transition that interprets
//! free text arriving outside of an active relay session.
//!
//! The state is a single slot per identity: a new transition fully replaces
//! whatever was pending, and the pending datum is cleared when consumed.
//! Administrators never hold a state; their input resolves through the
//! admin command table instead.

use dashmap::DashMap;

use mistok_common::PartyId;

use crate::command::{AdminCommand, CommandTable, UserCommand};

/// A pending expectation for a party's next free-text message.
/// Absence of an entry is the "no pending state" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// The bot asked for a consultation date/time; the next free text is
    /// consumed as the answer.
    AwaitingDatetime,
}

/// Concurrent party → state map. Entry operations are atomic per identity,
/// which is exactly the read-modify-write granularity the dispatcher needs;
/// there are no cross-party guarantees and none are required.
#[derive(Debug, Default)]
pub struct MenuStates {
    inner: DashMap<PartyId, MenuState>,
}

impl MenuStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending state for the party.
    pub fn set(&self, party: PartyId, state: MenuState) {
        self.inner.insert(party, state);
    }

    /// Consume and clear the party's pending state.
    pub fn take(&self, party: PartyId) -> Option<MenuState> {
        self.inner.remove(&party).map(|(_, state)| state)
    }

    pub fn get(&self, party: PartyId) -> Option<MenuState> {
        self.inner.get(&party).map(|entry| *entry.value())
    }

    pub fn clear(&self, party: PartyId) {
        self.inner.remove(&party);
    }
}

/// What the dispatcher must do with a message that reached menu dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Reply with the description for a service entry, switching the user
    /// to the service-options keyboard.
    ShowService(UserCommand),
    /// Prompt for a consultation date/time; the awaiting state is already
    /// set when this is returned.
    PromptDatetime,
    /// Persist the consultation request carrying this date/time text and
    /// notify every administrator; the state is already cleared.
    SubmitConsultation(String),
    /// Confirm to the user and notify every administrator.
    ContactAdmins,
    /// Show the main menu again.
    BackToMain,
    /// Execute an administrator action.
    Admin(AdminCommand),
    /// Unrecognized input; reply "unknown command" with the caller's menu.
    Unknown,
}

/// The menu state machine: command table + per-party single-slot state.
///
/// `transition` touches only the acting party's state entry and has no
/// other side effects.
#[derive(Debug, Default)]
pub struct MenuFlow {
    states: MenuStates,
    commands: CommandTable,
}

impl MenuFlow {
    pub fn new(commands: CommandTable) -> Self {
        Self {
            states: MenuStates::new(),
            commands,
        }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &MenuStates {
        &self.states
    }

    /// Interpret `text` for `party` and return the action to execute.
    ///
    /// Administrators dispatch through the admin command table and never
    /// enter a pending state. For users, menu labels win over a pending
    /// state; only unmatched free text is consumed as the awaited datum.
    pub fn transition(&self, party: PartyId, is_admin: bool, text: &str) -> MenuAction {
        if is_admin {
            return match self.commands.admin(text) {
                Some(cmd) => MenuAction::Admin(cmd),
                None => MenuAction::Unknown,
            };
        }

        match self.commands.user(text) {
            Some(UserCommand::Consultations) => {
                self.states.set(party, MenuState::AwaitingDatetime);
                MenuAction::PromptDatetime
            }
            Some(UserCommand::ContactAdmins) => MenuAction::ContactAdmins,
            Some(UserCommand::BackToMain) => MenuAction::BackToMain,
            Some(cmd) => MenuAction::ShowService(cmd),
            None => match self.states.take(party) {
                Some(MenuState::AwaitingDatetime) => {
                    MenuAction::SubmitConsultation(text.trim().to_string())
                }
                None => MenuAction::Unknown,
            },
        }
    }
}

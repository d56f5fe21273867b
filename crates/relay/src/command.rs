//! Menu command routing.
//!
//! Routing never compares display captions directly: every caption is
//! normalized (trimmed, lowercased) into a lookup table that resolves to an
//! enumerated command, so relabeling or localizing a button changes nothing
//! but the table construction.

use std::collections::HashMap;

/// Menu entries available to regular users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCommand {
    /// «Контекстна реклама» — service description.
    ContextAds,
    /// «Створення сайту» — service description.
    SiteCreation,
    /// «Консультації» — starts the date/time collection flow.
    Consultations,
    /// «Додавання міток на карту» — service description.
    MapPins,
    /// «Зв’язатися з адміністрацією» — ping every administrator.
    ContactAdmins,
    /// «Повернутись на головну» — back to the main menu.
    BackToMain,
}

/// Menu entries available to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminCommand {
    /// «Переглянути консультації» — list consultation requests.
    ListConsultations,
    /// «Переглянути користувачів» — list users with start-chat actions.
    ListUsers,
    /// «Видалити акаунт» — list users with delete actions.
    ListUsersForDeletion,
    /// «Завершити чат» — terminate keyword shown as a menu button; outside
    /// a session it only earns a "not in a chat" reply.
    EndChat,
}

/// Label → command lookup, keyed by normalized captions.
#[derive(Debug, Default)]
pub struct CommandTable {
    user: HashMap<String, UserCommand>,
    admin: HashMap<String, AdminCommand>,
    terminate: String,
}

/// Trim and lowercase a caption or an inbound message for table lookup.
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

impl CommandTable {
    /// Build the table from display captions. The terminate keyword doubles
    /// as the in-session escape hatch and is matched the same way.
    pub fn new(
        user: &[(&str, UserCommand)],
        admin: &[(&str, AdminCommand)],
        terminate: &str,
    ) -> Self {
        Self {
            user: user
                .iter()
                .map(|(label, cmd)| (normalize(label), *cmd))
                .collect(),
            admin: admin
                .iter()
                .map(|(label, cmd)| (normalize(label), *cmd))
                .collect(),
            terminate: normalize(terminate),
        }
    }

    pub fn user(&self, text: &str) -> Option<UserCommand> {
        self.user.get(&normalize(text)).copied()
    }

    pub fn admin(&self, text: &str) -> Option<AdminCommand> {
        self.admin.get(&normalize(text)).copied()
    }

    /// Case-insensitive, whitespace-tolerant terminate-keyword check.
    pub fn is_terminate(&self, text: &str) -> bool {
        !self.terminate.is_empty() && normalize(text) == self.terminate
    }
}

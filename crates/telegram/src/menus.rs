//! Logical menus and button captions.
//!
//! The dispatcher speaks in [`Menu`] values; only the transport resolves
//! them to native Telegram widgets. Captions feed both the keyboard layout
//! and the normalized command table, so routing and display never drift
//! apart.

use mistok_common::PartyId;
use mistok_relay::{AdminCommand, CommandTable, UserCommand};

// ── captions ────────────────────────────────────────────────────────────────

pub const BTN_CONTEXT_ADS: &str = "Контекстна реклама";
pub const BTN_SITE_CREATION: &str = "Створення сайту";
pub const BTN_CONSULTATIONS: &str = "Консультації";
pub const BTN_MAP_PINS: &str = "Додавання міток на карту";
pub const BTN_CONTACT_ADMINS: &str = "Зв’язатися з адміністрацією";
pub const BTN_BACK_TO_MAIN: &str = "Повернутись на головну";
pub const BTN_LIST_CONSULTATIONS: &str = "Переглянути консультації";
pub const BTN_LIST_USERS: &str = "Переглянути користувачів";
pub const BTN_DELETE_ACCOUNT: &str = "Видалити акаунт";
pub const BTN_END_CHAT: &str = "Завершити чат";
pub const BTN_SHARE_PHONE: &str = "Поділитися номером";

/// The in-session escape hatch; same caption as the admin menu button.
pub const TERMINATE_KEYWORD: &str = BTN_END_CHAT;

// ── callback payload prefixes ───────────────────────────────────────────────

pub const CB_START_CHAT: &str = "startchat";
pub const CB_DELETE_CONSULTATION: &str = "deleteconsult";
pub const CB_DELETE_USER: &str = "deleteuser";

// ── logical menus ───────────────────────────────────────────────────────────

/// A button on an inline (per-row action) keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

/// Button layout attached to an outbound message, resolved to a native
/// widget by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Menu {
    /// The regular user's main menu.
    Main,
    /// Options shown under a service description.
    ServiceOptions,
    /// The administrator menu.
    Admin,
    /// One-time contact-request keyboard for the phone gate.
    SharePhone,
    /// Remove the reply keyboard.
    Remove,
    /// Per-row inline actions (listings).
    Inline(Vec<Vec<InlineButton>>),
}

pub fn start_chat_button(user: PartyId) -> InlineButton {
    InlineButton {
        label: format!("Почати чат з {user}"),
        data: format!("{CB_START_CHAT}:{user}"),
    }
}

pub fn delete_consultation_button(id: i64) -> InlineButton {
    InlineButton {
        label: format!("Видалити #{id}"),
        data: format!("{CB_DELETE_CONSULTATION}:{id}"),
    }
}

pub fn delete_user_button(user: PartyId) -> InlineButton {
    InlineButton {
        label: format!("Видалити {user}"),
        data: format!("{CB_DELETE_USER}:{user}"),
    }
}

/// Build the routing table from the display captions above.
pub fn command_table() -> CommandTable {
    CommandTable::new(
        &[
            (BTN_CONTEXT_ADS, UserCommand::ContextAds),
            (BTN_SITE_CREATION, UserCommand::SiteCreation),
            (BTN_CONSULTATIONS, UserCommand::Consultations),
            (BTN_MAP_PINS, UserCommand::MapPins),
            (BTN_CONTACT_ADMINS, UserCommand::ContactAdmins),
            (BTN_BACK_TO_MAIN, UserCommand::BackToMain),
        ],
        &[
            (BTN_LIST_CONSULTATIONS, AdminCommand::ListConsultations),
            (BTN_LIST_USERS, AdminCommand::ListUsers),
            (BTN_DELETE_ACCOUNT, AdminCommand::ListUsersForDeletion),
            (BTN_END_CHAT, AdminCommand::EndChat),
        ],
        TERMINATE_KEYWORD,
    )
}

//! Every user-visible reply string in one place.
//!
//! Routing never looks at these: inbound text resolves through the
//! normalized command table built in [`crate::menus`], so the copy here can
//! change without touching the dispatcher.

use mistok_common::PartyId;

// ── greetings and the phone gate ────────────────────────────────────────────

pub const WELCOME_ADMIN: &str = "Ласкаво просимо, Адміністраторе! Ось меню:";
pub const WELCOME_USER: &str = "Ласкаво просимо! Ось меню:";
pub const PHONE_PROMPT_START: &str =
    "Вітаю! Будь ласка, поділіться своїм номером телефону, щоб користуватись ботом:";
pub const PHONE_PROMPT_GATE: &str =
    "Будь ласка, спочатку поділіться своїм номером телефону, щоб користуватись ботом:";
pub const CONTACT_SAVED_ADMIN: &str = "Дякуємо! Номер отримано.";
pub const CONTACT_SAVED_USER: &str = "Дякуємо! Тепер ви можете користуватися ботом.";

// ── menus ───────────────────────────────────────────────────────────────────

pub const MAIN_MENU: &str = "Ось головне меню:";
pub const ADMIN_MENU: &str = "Адмін меню:";
pub const CHOOSE_MENU_BUTTON: &str = "Обрати кнопку меню:";
pub const UNKNOWN_COMMAND: &str = "Невідома команда. Оберіть опцію з меню.";

// ── service descriptions ────────────────────────────────────────────────────

pub const SERVICE_CONTEXT_ADS: &str =
    "📢 Контекстна реклама допоможе швидко залучити клієнтів: налаштуємо кампанії під ваш бюджет і нішу.\n";
pub const SERVICE_SITE_CREATION: &str =
    "💻 Створимо сучасний сайт під ваш бізнес: від лендінгу до інтернет-магазину.\n";
pub const SERVICE_MAP_PINS: &str =
    "🗺️ Додаємо мітки у Google Maps для вашого бізнесу, щоб клієнти знаходили вас поруч.\n";

// ── consultations ───────────────────────────────────────────────────────────

pub const CONSULTATION_INTRO: &str = "💬 На консультації я поділюсь простими порадами, як вести профіль у Google Maps та самостійно просувати свою мітку, щоб вас легко знаходили клієнти.";
pub const CONSULTATION_PROMPT: &str = "Вкажіть бажану дату та час (наприклад: 15.08 14:00):";
pub const CONSULTATION_THANKS: &str = "Дякуємо! Ми отримали ваш запит на консультацію.";
pub const NO_CONSULTATIONS: &str = "📭 Немає записів на консультації.";
pub const CONSULTATIONS_HEADER: &str = "📋 Список консультацій (останні):";

pub fn consultation_notification(user: PartyId, full_name: &str, datetime: &str) -> String {
    format!(
        "🗓 Нова заявка на консультацію:\nКористувач ID: {user}\nІм'я: {full_name}\nДата/час: {datetime}"
    )
}

pub fn consultation_deleted(id: i64) -> String {
    format!("✅ Консультацію #{id} видалено.")
}

pub fn consultation_not_found(id: i64) -> String {
    format!("❌ Консультація з ID #{id} не знайдена.")
}

// ── contacting the administration ───────────────────────────────────────────

pub const CONTACT_REQUEST_SENT: &str =
    "Запит на зв'язок відправлено адміністрації. Очікуйте відповіді.";

pub fn contact_request_notification(user: PartyId, full_name: &str) -> String {
    format!("📩 Користувач хоче зв'язатися:\nID: {user}\nІм'я: {full_name}")
}

// ── relay sessions ──────────────────────────────────────────────────────────

pub const CHAT_ENDED: &str = "Чат завершено.";
pub const NOT_IN_CHAT: &str = "Ви не перебуваєте у чаті.";
pub const CHAT_LAUNCHED: &str = "Чат запущено ✅";
pub const CHAT_STARTED_USER: &str = "👋 Адміністратор почав чат з вами. Ви можете писати. Для завершення напишіть 'завершити чат'.";
pub const RELAY_FAILED: &str = "Не вдалося переслати це повідомлення.";

pub fn chat_started_admin(user: PartyId) -> String {
    format!(
        "✅ Чат з користувачем {user} розпочато. Пиши повідомлення. Для завершення напишіть 'завершити чат'."
    )
}

// ── administrator listings and denials ──────────────────────────────────────

pub const NO_ACCESS: &str = "⛔ У вас немає доступу до цієї команди.";
pub const NO_ACCESS_SHORT: &str = "У вас немає доступу.";
pub const INVALID_DATA: &str = "Некоректні дані.";
pub const SELF_CHAT_FORBIDDEN: &str = "❌ Неможливо почати чат із самим собою.";
pub const SELF_DELETE_FORBIDDEN: &str = "❌ Неможливо видалити власний акаунт.";
pub const USERS_EMPTY: &str = "База користувачів порожня.";
pub const USERS_HEADER: &str = "👥 Користувачі:";
pub const USERS_FOR_DELETION_HEADER: &str = "👥 Користувачі для видалення:";

pub fn user_deleted(user: PartyId) -> String {
    format!("✅ Користувача {user} видалено з бази.")
}

pub fn user_not_found(user: PartyId) -> String {
    format!("❌ Користувача {user} не знайдено.")
}

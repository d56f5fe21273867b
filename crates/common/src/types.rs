/// Identity of a chat participant (user or administrator), as assigned by
/// the messaging transport. In private chats the Telegram chat id and user
/// id coincide, so one id addresses both the person and their DM chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartyId(pub i64);

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PartyId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Assemble a display name from the transport's first/last name fields.
///
/// Falls back to the username, then to the bare id, so log lines and admin
/// notifications always have something to show.
pub fn display_name(
    id: PartyId,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
) -> String {
    let name = format!("{} {}", first_name, last_name.unwrap_or("")).trim().to_string();
    if !name.is_empty() {
        return name;
    }
    match username {
        Some(u) if !u.is_empty() => format!("@{u}"),
        _ => id.to_string(),
    }
}

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use mistok_common::PartyId;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MistokConfig {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl MistokConfig {
    /// Reject configs the bot cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.telegram.token.expose_secret().is_empty() {
            anyhow::bail!(
                "telegram.token is empty (set it in mistok.toml or via ${{BOT_TOKEN}})"
            );
        }
        if self.telegram.admins.is_empty() {
            anyhow::bail!("telegram.admins is empty: at least one administrator id is required");
        }
        Ok(())
    }
}

/// Telegram bot account: token plus the static administrator allow-list.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Administrator allow-list (Telegram user ids). Membership is the
    /// only form of authentication in the system.
    pub admins: Vec<i64>,
}

impl TelegramConfig {
    pub fn admin_ids(&self) -> Vec<PartyId> {
        self.admins.iter().copied().map(PartyId).collect()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("admins", &self.admins)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            admins: Vec::new(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Keep-alive HTTP responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("mistok.db"),
        }
    }
}

//! Configuration: TOML schema, discovery, `${ENV}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{MistokConfig, ServerConfig, StorageConfig, TelegramConfig},
};

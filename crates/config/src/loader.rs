use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::MistokConfig};

const CONFIG_FILENAME: &str = "mistok.toml";

/// Load config from an explicit path.
pub fn load_config(path: &Path) -> anyhow::Result<MistokConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./mistok.toml` (project-local)
/// 2. `~/.config/mistok/mistok.toml` (user-global)
///
/// Returns `MistokConfig::default()` when no config file is found; a file
/// that exists but fails to parse is reported, not silently skipped.
pub fn discover_and_load() -> anyhow::Result<MistokConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        None => {
            warn!("no config file found, using defaults");
            Ok(MistokConfig::default())
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "mistok") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}

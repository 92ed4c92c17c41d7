//! Global configuration loader for groupmind.
//!
//! Reads `config.toml` from the data directory (`~/.groupmind/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed, then overlays API keys from the environment.

use std::path::{Path, PathBuf};

use groupmind_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GROUPMIND_DATA_DIR";
/// Environment variable holding the web search/fetch key.
pub const WEB_API_KEY_ENV: &str = "OLLAMA_API_KEY";
/// Environment variable holding the chat endpoint key.
pub const LLM_API_KEY_ENV: &str = "GROUPMIND_LLM_API_KEY";

/// Resolve the data directory: `$GROUPMIND_DATA_DIR`, else `~/.groupmind`.
pub fn data_dir() -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".groupmind"),
    }
}

/// Directory holding the LanceDB tables.
pub fn vector_dir(config: &GlobalConfig, data_dir: &Path) -> PathBuf {
    match &config.vector.path {
        Some(path) => PathBuf::from(path),
        None => data_dir.join("vectors"),
    }
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Environment keys are applied on top in every case.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overlay(&mut config, |name| std::env::var(name).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Overlay non-empty environment keys onto `config`.
///
/// `lookup` is injected so tests do not touch the process environment.
fn apply_env_overlay(config: &mut GlobalConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(WEB_API_KEY_ENV) {
        config.web.api_key = Some(key);
    }
    if let Some(key) = non_empty(LLM_API_KEY_ENV) {
        config.llm.api_key = Some(key);
    }
}

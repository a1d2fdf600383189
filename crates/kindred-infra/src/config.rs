//! Configuration loading for Kindred.
//!
//! Reads `config.toml` from the data directory (`~/.kindred/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed. The Groq API key comes from the environment,
//! never from the config file.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use kindred_types::config::AppConfig;

/// Environment variable holding the Groq API key.
pub const API_KEY_ENV: &str = "KINDRED_GROQ_API_KEY";

/// Resolve the data directory from `KINDRED_DATA_DIR`, falling back to
/// `~/.kindred`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KINDRED_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kindred")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - Otherwise returns the parsed config (missing fields filled by serde
///   defaults).
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Read the Groq API key from the environment.
///
/// Returns `None` when unset or empty; the caller decides whether that is
/// fatal (the API server requires it, tests never do).
pub fn api_key_from_env() -> Option<SecretString> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Some(SecretString::from(key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.recall_top_k, 3);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
model = "llama-3.1-8b-instant"
temperature = 0.5
recall_top_k = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert!((config.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.recall_top_k, 5);
        // Unspecified fields keep their defaults.
        assert_eq!(config.max_examples, 6);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }
}

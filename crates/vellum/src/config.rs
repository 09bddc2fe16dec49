use anyhow::Result;
use directories::ProjectDirs;
use mucore::keymap::Platform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

const DEFAULT_LARGE_FILE_WARN_BYTES: u64 = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pin the accelerator platform instead of detecting it, e.g. to get
    /// macOS menus when driving a remote session.
    #[serde(default)]
    pub keymap_platform: Option<Platform>,
    /// Keep a `.bak` copy of the previous revision on every save.
    pub backup_on_save: bool,
    pub large_file_warn_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keymap_platform: None,
            backup_on_save: true,
            large_file_warn_bytes: DEFAULT_LARGE_FILE_WARN_BYTES,
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) => {
                        if content.trim().is_empty() {
                            log::warn!("Config file is empty, creating new one");
                            let default_config = Self::default();
                            let _ = default_config.save().await;
                            return Ok(default_config);
                        }

                        match serde_json::from_str::<Self>(&content) {
                            Ok(mut config) => {
                                config.validate()?;
                                log::info!(
                                    "Successfully loaded config from: {}",
                                    config_path.display()
                                );
                                return Ok(config);
                            }
                            Err(json_err) => {
                                log::error!("Failed to parse config file: {}", json_err);

                                // Keep the broken file around for inspection.
                                let backup_path = config_path.with_extension("bak");
                                if let Err(e) = tokio::fs::copy(&config_path, &backup_path).await {
                                    log::warn!("Failed to backup broken config: {}", e);
                                } else {
                                    log::info!(
                                        "Backed up broken config to: {}",
                                        backup_path.display()
                                    );
                                }

                                let default_config = Self::default();
                                let _ = default_config.save().await;
                                return Ok(default_config);
                            }
                        }
                    }
                    Err(io_err) => {
                        log::error!("Failed to read config file: {}", io_err);
                    }
                }
            } else {
                log::info!("Config file does not exist, creating default");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_path() {
            let mut config_to_save = self.clone();
            config_to_save.validate()?;

            if let Some(parent) = config_path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    )
                })?;
            }

            let content = serde_json::to_string_pretty(&config_to_save)?;
            tokio::fs::write(&config_path, content).await.map_err(|e| {
                anyhow::anyhow!("Failed to write config {}: {}", config_path.display(), e)
            })?;
            log::info!("Successfully saved config to: {}", config_path.display());
        }
        Ok(())
    }

    /// Validate configuration values and fix invalid ones.
    pub fn validate(&mut self) -> Result<()> {
        if self.large_file_warn_bytes < 1024 {
            log::warn!(
                "Large-file threshold too low ({} bytes), using default",
                self.large_file_warn_bytes
            );
            self.large_file_warn_bytes = DEFAULT_LARGE_FILE_WARN_BYTES;
        }
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VELLUM_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("VELLUM_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        ProjectDirs::from("com", "vellum", "vellum")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn config_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn set_config_dir(path: &std::path::Path) -> (Option<String>, Option<String>) {
        let previous_dir = std::env::var("VELLUM_CONFIG_DIR").ok();
        let previous_path = std::env::var("VELLUM_CONFIG_PATH").ok();
        std::env::set_var("VELLUM_CONFIG_DIR", path);
        std::env::remove_var("VELLUM_CONFIG_PATH");
        (previous_dir, previous_path)
    }

    fn restore_config_env(previous: (Option<String>, Option<String>)) {
        match previous.0 {
            Some(value) => std::env::set_var("VELLUM_CONFIG_DIR", value),
            None => std::env::remove_var("VELLUM_CONFIG_DIR"),
        }

        match previous.1 {
            Some(value) => std::env::set_var("VELLUM_CONFIG_PATH", value),
            None => std::env::remove_var("VELLUM_CONFIG_PATH"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keymap_platform, None);
        assert!(config.backup_on_save);
        assert_eq!(config.large_file_warn_bytes, DEFAULT_LARGE_FILE_WARN_BYTES);
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default();
        config.keymap_platform = Some(Platform::MacOs);
        config.backup_on_save = false;

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"keymap_platform\""));
        assert!(json.contains("\"backup_on_save\""));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.keymap_platform, Some(Platform::MacOs));
        assert!(!parsed.backup_on_save);
    }

    #[test]
    fn test_validate_fixes_threshold() {
        let mut config = Config::default();
        config.large_file_warn_bytes = 10;
        config.validate().unwrap();
        assert_eq!(config.large_file_warn_bytes, DEFAULT_LARGE_FILE_WARN_BYTES);
    }

    #[tokio::test]
    async fn test_config_load_default_in_isolated_dir() {
        let (_temp_dir, previous_env) = {
            let _guard = config_test_lock().lock().unwrap();
            let temp_dir = TempDir::new().unwrap();
            let previous = set_config_dir(temp_dir.path());
            (temp_dir, previous)
        }; // release lock before await

        let config = Config::load().await.unwrap();
        assert!(config.backup_on_save);
        assert_eq!(config.keymap_platform, None);

        restore_config_env(previous_env);
    }
}

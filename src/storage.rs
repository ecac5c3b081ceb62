//! On-disk state: client settings and the persisted session token.

use crate::constants::{
    API_URL_ENV, CONFIG_DIR_NAME, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, SETTINGS_FILE,
    TOKEN_KEY,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Client settings read from `config.yaml`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: String::from(DEFAULT_API_BASE_URL),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Apply `KEREM_API_URL` if it is set and non-empty
    pub fn with_env_override(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::info!(url = %url, "API base URL overridden from environment");
                self.api_base_url = url.trim().to_string();
            }
        }
        self
    }
}

/// Manages the config directory: settings file and session token
pub struct Storage {
    config_dir: PathBuf,
}

impl Storage {
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Storage { config_dir }
    }

    /// Storage rooted at an explicit directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Storage {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("creating config directory {}", self.config_dir.display())
            })?;
        }
        Ok(())
    }

    fn token_path(&self) -> PathBuf {
        self.config_dir.join(TOKEN_KEY)
    }

    /// Load settings; a missing file yields defaults
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.config_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(settings)
    }

    /// Write settings back to `config.yaml`
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_yaml::to_string(settings)?;
        fs::write(self.config_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Read the persisted token, if any
    pub fn load_token(&self) -> Option<String> {
        let content = fs::read_to_string(self.token_path()).ok()?;
        let token = content.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// Persist the token readable by the owner only
    pub fn save_token(&self, token: &str) -> Result<()> {
        self.ensure_dir()?;
        write_private(&self.token_path(), token).context("writing session token")?;
        Ok(())
    }

    pub fn clear_token(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            fs::remove_file(&path).context("removing session token")?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten files left by older versions
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_token_roundtrip_and_clear() {
        let dir = tempdir().unwrap();
        let storage = Storage::with_dir(dir.path().join("kerem"));
        assert_eq!(storage.load_token(), None);

        storage.save_token("abc.def.ghi").unwrap();
        assert_eq!(storage.load_token().as_deref(), Some("abc.def.ghi"));

        storage.clear_token().unwrap();
        assert_eq!(storage.load_token(), None);
        // Clearing twice is fine
        storage.clear_token().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        std::fs::write(dir.path().join(TOKEN_KEY), "old").unwrap();
        std::fs::set_permissions(dir.path().join(TOKEN_KEY), std::fs::Permissions::from_mode(0o644))
            .unwrap();

        storage.save_token("a.b.c").unwrap();
        let mode = std::fs::metadata(dir.path().join(TOKEN_KEY)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(storage.load_token().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_settings_defaults_and_partial_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        assert_eq!(storage.load_settings().unwrap(), Settings::default());

        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "api_base_url: http://wine.test:8080\n",
        )
        .unwrap();
        let settings = storage.load_settings().unwrap();
        assert_eq!(settings.api_base_url, "http://wine.test:8080");
        assert_eq!(settings.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_settings_save_then_load() {
        let dir = tempdir().unwrap();
        let storage = Storage::with_dir(dir.path().join("nested"));
        let settings = Settings {
            api_base_url: "http://127.0.0.1:9000".into(),
            request_timeout_secs: 5,
        };
        storage.save_settings(&settings).unwrap();
        assert_eq!(storage.load_settings().unwrap(), settings);
    }

    #[test]
    fn test_invalid_settings_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "api_base_url: [1, 2").unwrap();
        assert!(Storage::with_dir(dir.path()).load_settings().is_err());
    }
}

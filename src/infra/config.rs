// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Condition;
use crate::infra::paths;

/// Salt the issued study credentials were hashed with.
pub const DEFAULT_SALT: &str = "cancer_biology_study_2025";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Cloud upload settings (optional section in config.toml).
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root under which `<data_folder>/<session_id>/` directories are created.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_salt")]
    pub salt: String,
    /// Replaces the built-in credential table when non-empty.
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            credentials: Vec::new(),
        }
    }
}

fn default_salt() -> String {
    DEFAULT_SALT.into()
}

/// One `[[auth.credentials]]` entry. Passwords are stored pre-hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub username: String,
    pub password_hash: String,
    pub condition: Condition,
    #[serde(default)]
    pub description: String,
    pub data_folder: String,
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default)]
    pub fast_test_mode: bool,
    #[serde(default)]
    pub upload_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Project base URL, e.g. https://xyz.supabase.co
    pub url: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Name of the environment variable holding the service key.
    #[serde(default = "default_key_env")]
    pub service_key_env: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_bucket() -> String {
    "interview-results".into()
}

fn default_key_env() -> String {
    "SUPABASE_SERVICE_KEY".into()
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective output root.
    pub fn output_dir(&self) -> PathBuf {
        self.storage
            .output_dir
            .clone()
            .unwrap_or_else(paths::default_output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.auth.salt, DEFAULT_SALT);
        assert!(c.auth.credentials.is_empty());
        assert!(c.upload.is_none());
        assert!(c.storage.output_dir.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.auth.salt, DEFAULT_SALT);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[storage]
output_dir = "/srv/study/output"

[auth]
salt = "pilot_2026"

[[auth.credentials]]
username = "pilot_a"
password_hash = "abc123"
condition = "generic"
description = "Pilot participant"
data_folder = "pilot_generic"

[[auth.credentials]]
username = "pilot_dev"
password_hash = "def456"
condition = "personalized"
data_folder = "pilot_dev"
dev_mode = true
upload_enabled = true

[upload]
url = "https://example.supabase.co"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("/srv/study/output"));
        assert_eq!(config.auth.salt, "pilot_2026");
        assert_eq!(config.auth.credentials.len(), 2);
        assert_eq!(config.auth.credentials[0].condition, Condition::Generic);
        assert_eq!(config.auth.credentials[1].condition, Condition::Personalised);
        assert!(config.auth.credentials[1].dev_mode);
        assert!(!config.auth.credentials[0].fast_test_mode);

        let upload = config.upload.unwrap();
        assert_eq!(upload.bucket, "interview-results");
        assert_eq!(upload.service_key_env, "SUPABASE_SERVICE_KEY");
        assert_eq!(upload.max_file_bytes, 52_428_800);
    }

    #[test]
    fn test_rejects_unknown_condition() {
        let toml_str = r#"
[[auth.credentials]]
username = "x"
password_hash = "y"
condition = "placebo"
data_folder = "z"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }
}

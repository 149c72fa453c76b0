use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::community::CommunityId;

/// Environment variable that overrides `api_base_url` from the config file.
pub const API_URL_ENV: &str = "LANDSLIDE_API_URL";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_base_url = "https://snap.example.org/api"
/// timeout_secs = 10
/// default_community = "AK91"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,

    /// Request deadline; `DEFAULT_TIMEOUT_SECS` when absent.
    pub timeout_secs: Option<u64>,

    /// Community code shown when none is given on the command line.
    pub default_community: Option<String>,
}

impl Config {
    /// Base URL of the risk API.
    pub fn api_base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().filter(|url| !url.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API base URL configured.\n\
                 Hint: run `landslide configure` or set {API_URL_ENV}."
            )
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Default community as a strongly-typed id, if one is configured.
    pub fn default_community_id(&self) -> Result<Option<CommunityId>> {
        self.default_community
            .as_deref()
            .map(|code| {
                CommunityId::try_from(code)
                    .with_context(|| format!("Invalid default_community '{code}' in config"))
            })
            .transpose()
    }

    pub fn set_default_community(&mut self, id: CommunityId) {
        self.default_community = Some(id.as_str().to_string());
    }

    /// Load config from disk (or defaults on first run), then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_or_default(&Self::config_file_path()?)?;
        cfg.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(cfg)
    }

    /// Config at `path`, or the defaults when no file exists there yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() { Self::load_from(path) } else { Ok(Self::default()) }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save to the platform config file.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write as TOML to `path`, creating missing parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// `config.toml` under the platform config directory for `landslide`.
    pub fn config_file_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "landslide-risk", "landslide-cli")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    fn apply_env_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
    }
}

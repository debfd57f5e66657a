use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::update::github::Endpoints;
use crate::update::store::VERSION_FILE;
use crate::update::{HttpRemote, UpdateSettings};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Repository page or raw-content base holding `version.json`
    #[serde(default)]
    pub repo_url: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// File to keep up to date, relative to `install_dir`
    #[serde(default)]
    pub target_file: Option<String>,

    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    #[serde(default = "default_version_file")]
    pub version_file: String,

    /// Host used for the connectivity pre-flight
    #[serde(default = "default_connectivity_url")]
    pub connectivity_url: String,

    #[serde(default = "default_connectivity_timeout")]
    pub connectivity_timeout_secs: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Check downloads against `sha256_checksum` when the remote provides one
    #[serde(default = "default_true")]
    pub verify_checksum: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_install_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_version_file() -> String {
    VERSION_FILE.to_string()
}

fn default_connectivity_url() -> String {
    "https://www.google.com".to_string()
}

fn default_connectivity_timeout() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_url: None,
            branch: default_branch(),
            target_file: None,
            install_dir: default_install_dir(),
            version_file: default_version_file(),
            connectivity_url: default_connectivity_url(),
            connectivity_timeout_secs: default_connectivity_timeout(),
            http_timeout_secs: default_http_timeout(),
            verify_checksum: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("ota")
            .join("config.toml")
    }

    pub fn version_path(&self) -> PathBuf {
        self.install_dir.join(&self.version_file)
    }

    /// Resolve where to fetch from and what to replace
    pub fn settings(&self) -> Result<UpdateSettings> {
        let repo_url = self
            .repo_url
            .as_deref()
            .ok_or_else(|| anyhow!("No repository URL configured (set repo_url or pass --repo)"))?;
        let target_file = self
            .target_file
            .as_deref()
            .ok_or_else(|| anyhow!("No target file configured (set target_file or pass --file)"))?;

        Ok(UpdateSettings {
            endpoints: Endpoints::new(repo_url, &self.branch, target_file),
            target: self.install_dir.join(target_file),
            version_file: self.version_path(),
            verify_checksum: self.verify_checksum,
        })
    }

    pub fn remote(&self) -> HttpRemote {
        HttpRemote::new(
            self.connectivity_url.clone(),
            Duration::from_secs(self.connectivity_timeout_secs),
            Duration::from_secs(self.http_timeout_secs),
        )
    }
}

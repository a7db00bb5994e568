//! Explorer configuration.
//!
//! Settings are layered: built-in defaults, a TOML file, the standard AWS
//! environment variables, and finally command line flags (applied by the
//! binary through [`Settings::apply_overrides`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExplorerError;

const CONFIG_DIR: &str = "s3explorer";
const CONFIG_FILE: &str = "config.toml";

/// S3-compatible storage providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum S3Provider {
    #[default]
    Aws,
    DigitalOcean,
    Hetzner,
    Minio,
    CloudflareR2,
    Wasabi,
}

impl S3Provider {
    /// Get the endpoint URL for this provider
    pub fn endpoint(&self, region: &str) -> Option<String> {
        match self {
            S3Provider::Aws => None, // Use default AWS endpoint
            S3Provider::DigitalOcean => Some(format!("https://{}.digitaloceanspaces.com", region)),
            S3Provider::Hetzner => Some(format!("https://{}.your-objectstorage.com", region)),
            S3Provider::Minio => Some("http://localhost:9000".to_string()),
            S3Provider::CloudflareR2 => Some(format!("https://{}.r2.cloudflarestorage.com", region)),
            S3Provider::Wasabi => Some(format!("https://s3.{}.wasabisys.com", region)),
        }
    }

    /// Get display name for the provider
    pub fn display_name(&self) -> &'static str {
        match self {
            S3Provider::Aws => "AWS S3",
            S3Provider::DigitalOcean => "DigitalOcean Spaces",
            S3Provider::Hetzner => "Hetzner Object Storage",
            S3Provider::Minio => "MinIO",
            S3Provider::CloudflareR2 => "Cloudflare R2",
            S3Provider::Wasabi => "Wasabi",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bucket: String,
    pub region: String,
    pub provider: S3Provider,
    /// Overrides the provider's endpoint.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Lifetime of the sessions vended by the credential broker.
    pub session_duration_secs: u64,
    /// Multipart chunk size handed to the object writer.
    pub part_size: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            provider: S3Provider::Aws,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_duration_secs: 900,
            part_size: 8 * 1024 * 1024,
            log_file: None,
        }
    }
}

/// Values given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Default location of the config file, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit file, or from the default location when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply AWS environment variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("AWS_ACCESS_KEY_ID") {
            self.access_key = Some(key);
        }
        if let Some(secret) = lookup("AWS_SECRET_ACCESS_KEY") {
            self.secret_key = Some(secret);
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.region = region;
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(bucket) = overrides.bucket {
            self.bucket = bucket;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = Some(log_file);
        }
    }

    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.bucket.trim().is_empty() {
            return Err(ExplorerError::InvalidConfig {
                message: "bucket must be set (config file or --bucket)".to_string(),
            });
        }
        if self.part_size == 0 {
            return Err(ExplorerError::InvalidConfig {
                message: "part_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Endpoint to talk to: the explicit override, else the provider's.
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| self.provider.endpoint(&self.region))
    }

    pub fn session_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_duration_secs as i64)
    }

    /// Static keys to vend as sessions, when both halves are configured.
    pub fn static_keys(&self) -> Option<(String, String)> {
        match (&self.access_key, &self.secret_key) {
            (Some(key), Some(secret)) if !key.is_empty() => Some((key.clone(), secret.clone())),
            _ => None,
        }
    }
}

//! Server configuration read from environment variables.

use crate::serving::artifact::RemoteLocation;
use crate::serving::store::GCS_DEFAULT_ENDPOINT;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_PATH: &str = "models/house_price_model.bin";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Error raised for an unusable configuration value.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { var, value, reason } => {
                write!(f, "Invalid {}={:?}: {}", var, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which browser origins may call the API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// No CORS headers at all.
    #[default]
    Disabled,
    /// Any origin.
    Any,
    /// Exactly these origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma separated list. `*` anywhere allows every origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else if origins.is_empty() {
            AllowedOrigins::Disabled
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

/// Settings of the `serve` binary.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Local artifact path (`MODEL_PATH`).
    pub model_path: PathBuf,
    /// Remote copy of the artifact (`MODEL_BUCKET`, `MODEL_OBJECT_KEY`).
    pub remote: Option<RemoteLocation>,
    /// Storage endpoint (`GCS_ENDPOINT`).
    pub gcs_endpoint: String,
    /// Bearer token for storage requests (`GCS_ACCESS_TOKEN`).
    pub gcs_token: Option<String>,
    /// CORS policy (`ALLOWED_ORIGINS`).
    pub allowed_origins: AllowedOrigins,
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_path = PathBuf::from(get("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()));

        let remote = match get("MODEL_BUCKET") {
            Some(bucket) => {
                let key = match get("MODEL_OBJECT_KEY") {
                    Some(key) => key,
                    None => file_name(&model_path)?,
                };
                Some(RemoteLocation { bucket, key })
            }
            None => None,
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                var: "BIND_ADDR",
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            model_path,
            remote,
            gcs_endpoint: get("GCS_ENDPOINT").unwrap_or_else(|| GCS_DEFAULT_ENDPOINT.to_string()),
            gcs_token: get("GCS_ACCESS_TOKEN"),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|raw| AllowedOrigins::parse(&raw))
                .unwrap_or_default(),
            bind_addr,
        })
    }
}

fn file_name(path: &Path) -> Result<String, ConfigError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidValue {
            var: "MODEL_PATH",
            value: path.display().to_string(),
            reason: "has no file name to use as MODEL_OBJECT_KEY".to_string(),
        })
}

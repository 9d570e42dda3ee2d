//! The per-app deployment configuration file, `baasil.json`.
//!
//! The file lives next to the app's `package.json` and is rewritten by the
//! deploy flow whenever registry details, the version tag, or scaling values
//! change. A missing or unreadable file is treated as the default
//! configuration so a fresh app can be deployed without any manual setup.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("write {path}: {err}")]
    WriteFile { err: std::io::Error, path: String },

    #[error("serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("docker auth blob is not valid base64")]
    AuthEncoding,

    #[error("docker auth blob is not a username:password pair")]
    AuthShape,
}

pub const CONFIG_FILE: &str = "baasil.json";
pub const DEFAULT_IMAGE_REPO: &str = "https://index.docker.io/v1/";

/// Registry details for the image build and push steps. The `auth` blob is
/// `username:password` in base64, the same shape Docker keeps in its own
/// config file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerConfig {
    pub image_repo: String,
    pub image_name: String,
    pub auth: String,
}

/// Process counts for one scalable service tier.
#[serde_inline_default]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScalingConfig {
    #[serde_inline_default(1)]
    pub workers: u32,
    #[serde_inline_default(1)]
    pub brokers: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        ScalingConfig {
            workers: 1,
            brokers: 1,
        }
    }
}

/// The two scalable tiers of an SCC app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTier {
    Worker,
    Broker,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentConfig {
    pub docker: DockerConfig,
    pub socket_cluster: ScalingConfig,
    pub socket_cluster_broker: ScalingConfig,
}

pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl DockerConfig {
    pub fn is_complete(&self) -> bool {
        !self.image_repo.is_empty() && !self.image_name.is_empty() && !self.auth.is_empty()
    }

    pub fn set_credentials(&mut self, username: &str, password: &str) {
        self.auth = STANDARD.encode(format!("{username}:{password}"));
    }

    pub fn credentials(&self) -> Result<RegistryCredentials, Error> {
        let decoded = STANDARD.decode(&self.auth).map_err(|_| Error::AuthEncoding)?;
        let text = String::from_utf8(decoded).map_err(|_| Error::AuthEncoding)?;
        let (username, password) = text.split_once(':').ok_or(Error::AuthShape)?;
        Ok(RegistryCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl DeploymentConfig {
    /// Reads the configuration at `path`, falling back to defaults when the
    /// file is missing or unparsable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return DeploymentConfig::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "{} is not a valid configuration file, starting over from defaults: {}",
                    path.display(),
                    err
                );
                DeploymentConfig::default()
            }
        }
    }

    /// Writes the configuration as pretty-printed JSON with a stable key
    /// order, so repeated saves of the same state are byte-identical.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut serialized = serde_json::to_string_pretty(self)?;
        serialized.push('\n');
        std::fs::write(path, serialized).map_err(|err| Error::WriteFile {
            err,
            path: path.display().to_string(),
        })
    }

    pub fn scaling(&self, tier: ServiceTier) -> &ScalingConfig {
        match tier {
            ServiceTier::Worker => &self.socket_cluster,
            ServiceTier::Broker => &self.socket_cluster_broker,
        }
    }

    pub fn scaling_mut(&mut self, tier: ServiceTier) -> &mut ScalingConfig {
        match tier {
            ServiceTier::Worker => &mut self.socket_cluster,
            ServiceTier::Broker => &mut self.socket_cluster_broker,
        }
    }
}

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use boothbook_ledger::{DocumentPaths, RetryPolicy};
use boothbook_service::RetentionPolicy;
use boothbook_store::RepoConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Everything needed to run boothbook against one repository branch.
///
/// ```toml
/// bind_addr = "0.0.0.0:8080"
/// retention_months = 1
///
/// [repo]
/// repository = "market/booths"
/// branch = "main"
///
/// [documents]
/// schedule = "data/schedule.json"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub retention_months: u32,
    pub repo: RepoConfig,
    pub documents: DocumentPaths,
    pub retry: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            retention_months: 1,
            repo: RepoConfig::default(),
            documents: DocumentPaths::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(contents: &str) -> ServerResult<Self> {
        toml::from_str(contents).map_err(|e| ServerError::Config(format!("invalid config: {e}")))
    }

    /// Read `path`, then overlay the process environment.
    ///
    /// With no path the defaults are used as the base.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .map_err(|e| ServerError::Config(format!("failed to read {}: {e}", path.display())))?;
                toml::from_str(&contents)
                    .map_err(|e| ServerError::Config(format!("failed to parse {}: {e}", path.display())))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `GITHUB_*` and `*_FILE` variables win over file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.repo.apply_env(&lookup);
        self.documents.apply_env(&lookup);
    }

    pub fn validate(&self) -> ServerResult<()> {
        self.repo.validate()?;
        for (name, path) in [
            ("vendors", &self.documents.vendors),
            ("booths", &self.documents.booths),
            ("schedule", &self.documents.schedule),
        ] {
            if path.trim().is_empty() {
                return Err(ServerError::Config(format!("documents.{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::months(self.retention_months)
    }
}

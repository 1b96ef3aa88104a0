use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Connection settings for the remote repository.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Base URL of the REST API.
    pub api_url: String,
    /// Repository in `owner/repo` form.
    pub repository: String,
    /// Branch holding the documents.
    pub branch: String,
    /// Static bearer credential sent with every request.
    pub token: String,
    /// Per-request timeout. Expiry is reported as `Unavailable`.
    pub timeout_secs: u64,
    /// `User-Agent` header; the GitHub API refuses requests without one.
    pub user_agent: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            repository: String::new(),
            branch: "main".into(),
            token: String::new(),
            timeout_secs: 30,
            user_agent: concat!("boothbook/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl RepoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Overlay `GITHUB_TOKEN`, `GITHUB_REPO` and `GITHUB_BRANCH`.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`. Empty values are
    /// ignored so an exported-but-blank variable does not wipe a file setting.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get("GITHUB_TOKEN") {
            self.token = token;
        }
        if let Some(repo) = get("GITHUB_REPO") {
            self.repository = repo;
        }
        if let Some(branch) = get("GITHUB_BRANCH") {
            self.branch = branch;
        }
    }

    /// Check that the settings can address a repository.
    pub fn validate(&self) -> StoreResult<()> {
        let mut parts = self.repository.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !well_formed {
            return Err(StoreError::InvalidConfig(format!(
                "repository must be owner/repo, got {:?}",
                self.repository
            )));
        }
        if self.branch.trim().is_empty() {
            return Err(StoreError::InvalidConfig("branch must not be empty".into()));
        }
        if self.token.trim().is_empty() {
            return Err(StoreError::InvalidConfig("token must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(StoreError::InvalidConfig("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoConfig")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> RepoConfig {
        RepoConfig {
            repository: "market/booths".into(),
            token: "ghp_secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let c = RepoConfig::default();
        assert_eq!(c.api_url, "https://api.github.com");
        assert_eq!(c.branch, "main");
        assert_eq!(c.timeout(), Duration::from_secs(30));
        assert!(c.user_agent.starts_with("boothbook/"));
    }

    #[test]
    fn validate_accepts_owner_repo() {
        valid().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_repository() {
        for repo in ["", "booths", "/booths", "market/", "a/b/c"] {
            let c = RepoConfig { repository: repo.into(), ..valid() };
            assert!(matches!(c.validate(), Err(StoreError::InvalidConfig(_))), "{repo}");
        }
    }

    #[test]
    fn validate_requires_token_and_timeout() {
        let c = RepoConfig { token: " ".into(), ..valid() };
        assert!(c.validate().is_err());
        let c = RepoConfig { timeout_secs: 0, ..valid() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn env_overrides_non_empty_values() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_TOKEN", "from-env"),
            ("GITHUB_REPO", "org/data"),
            ("GITHUB_BRANCH", ""),
        ]
        .into_iter()
        .collect();
        let mut c = valid();
        c.branch = "schedule".into();
        c.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.token, "from-env");
        assert_eq!(c.repository, "org/data");
        assert_eq!(c.branch, "schedule");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

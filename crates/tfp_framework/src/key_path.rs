//! Working directories for each scenario, relative to the repository root.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::FrameworkError;

/// Environment variable pointing at the repository root.
pub const REPO_ROOT_ENV: &str = "TFP_REPO_ROOT";

/// Each scenario keeps its own main.tf and Terraform state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Downstream clusters provisioned through Rancher
    Rancher,
    Sanity,
    Proxy,
    Airgap,
    Upgrade,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Rancher => "rancher",
            Scenario::Sanity => "sanity",
            Scenario::Proxy => "proxy",
            Scenario::Airgap => "airgap",
            Scenario::Upgrade => "upgrade",
        }
    }

    pub fn all() -> [Scenario; 5] {
        [
            Scenario::Rancher,
            Scenario::Sanity,
            Scenario::Proxy,
            Scenario::Airgap,
            Scenario::Upgrade,
        ]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::all()
            .into_iter()
            .find(|scenario| scenario.as_str() == s.to_lowercase())
            .ok_or_else(|| FrameworkError::Unsupported(format!("unknown scenario: {}", s)))
    }
}

/// `TFP_REPO_ROOT`, or the current directory when unset.
pub fn repo_root() -> PathBuf {
    std::env::var(REPO_ROOT_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<repo root>/modules/<scenario>`
pub fn key_path(scenario: Scenario) -> PathBuf {
    key_path_in(repo_root(), scenario)
}

pub fn key_path_in(repo_root: impl Into<PathBuf>, scenario: Scenario) -> PathBuf {
    repo_root.into().join("modules").join(scenario.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_in() {
        assert_eq!(
            key_path_in("/repo", Scenario::Upgrade),
            PathBuf::from("/repo/modules/upgrade")
        );
        assert_eq!(
            key_path_in("/repo", Scenario::Rancher),
            PathBuf::from("/repo/modules/rancher")
        );
    }

    #[test]
    fn test_parse_scenario() {
        assert_eq!("Proxy".parse::<Scenario>().unwrap(), Scenario::Proxy);
        assert!("staging".parse::<Scenario>().is_err());
    }
}

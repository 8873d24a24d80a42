// Service configuration: defaults < YAML file < CLI / environment

use crate::id::IdPolicy;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
    /// Directory holding the collection files
    pub data_dir: PathBuf,
    /// Allowed CORS origins; "*" allows any origin
    pub cors_origins: Vec<String>,
    pub id_policy: IdPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
            cors_origins: vec!["*".to_string()],
            id_policy: IdPolicy::Bump,
        }
    }
}

impl Config {
    /// Load config from an optional YAML file; a missing path means defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!(file = ?path, ?config, "Loaded config file");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply command line / environment overrides
    pub fn with_overrides(mut self, bind: Option<SocketAddr>, data_dir: Option<PathBuf>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        self
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.allows_any_origin());
        assert_eq!(config.id_policy, IdPolicy::Bump);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("data_dir: /srv/data\nid_policy: overwrite\n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.id_policy, IdPolicy::Overwrite);
        assert_eq!(config.bind, Config::default().bind);
    }

    #[test]
    fn test_cors_origins_from_yaml() {
        let config = Config::from_yaml("cors_origins:\n  - https://app.example.com\n").unwrap();
        assert_eq!(config.cors_origins, vec!["https://app.example.com".to_string()]);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(Config::from_yaml("bind: not-an-address").is_err());
        assert!(Config::from_yaml("id_policy: sometimes").is_err());
    }

    #[test]
    fn test_load_from_file_and_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("minibackend.yaml");
        std::fs::write(&path, "bind: 127.0.0.1:9000\ndata_dir: ./from-file\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.bind.port(), 9000);

        let config = config.with_overrides(None, Some(PathBuf::from("./from-cli")));
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.data_dir, PathBuf::from("./from-cli"));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(temp.path().join("nope.yaml").as_path())).is_err());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}

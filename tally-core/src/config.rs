//! Configuration for the ledger engine

use crate::clock::NodeId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot database path
    pub db_path: PathBuf,

    /// Writer node id (3 characters, `[0-9A-Z]`)
    pub node_id: String,

    /// Directive journal to replay at startup, if any
    pub journal_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/tally.db"),
            node_id: "LOC".to_string(),
            journal_path: None,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.node()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(db_path) = std::env::var("TALLY_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }

        if let Ok(node_id) = std::env::var("TALLY_NODE_ID") {
            config.node_id = node_id;
        }

        if let Ok(journal) = std::env::var("TALLY_JOURNAL_PATH") {
            config.journal_path = Some(PathBuf::from(journal));
        }

        config.node()?;
        Ok(config)
    }

    /// Parsed writer node id
    pub fn node(&self) -> Result<NodeId> {
        NodeId::parse(&self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.node_id, "LOC");
        assert!(config.journal_path.is_none());
        assert!(config.node().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/tally.db"
            node_id = "B7Q"
            journal_path = "/tmp/journal.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.node_id, "B7Q");
        assert_eq!(config.db_path, PathBuf::from("/tmp/tally.db"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "db_path = \"ledger.db\"\nnode_id = \"N42\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.node_id, "N42");
        assert_eq!(config.db_path, PathBuf::from("ledger.db"));

        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_bad_node_id_rejected() {
        let config = Config {
            node_id: "toolong".to_string(),
            ..Default::default()
        };
        assert!(config.node().is_err());
    }
}

/// Configuration management for the kinship engine
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerSettings,
    pub traversal: TraversalSettings,
    pub charts: ChartSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalSettings {
    pub max_visited_nodes: usize,
    pub max_generations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSettings {
    pub fan_chart_generations: u32,
    pub tree_chart_generations: u32,
    pub descendant_generations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub snapshot_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "127.0.0.1:8080".to_string(),
                request_timeout_seconds: 30,
            },
            traversal: TraversalSettings {
                max_visited_nodes: 250_000,
                max_generations: 12,
            },
            charts: ChartSettings {
                fan_chart_generations: 5,
                tree_chart_generations: 3,
                descendant_generations: 4,
            },
            store: StoreSettings {
                snapshot_path: PathBuf::from("family-tree.json"),
            },
        }
    }
}

pub const DEFAULT_CONFIG_YAML: &str = r#"# Kinship engine configuration

# HTTP server
server:
  bind_address: "127.0.0.1:8080"
  request_timeout_seconds: 30

# Bounds applied to every traversal
traversal:
  max_visited_nodes: 250000
  max_generations: 12

# Default generation counts per chart (each must be <= max_generations)
charts:
  fan_chart_generations: 5
  tree_chart_generations: 3
  descendant_generations: 4

# Exported JSON snapshot served by the binary
store:
  snapshot_path: "family-tree.json"
"#;

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields with any `KINSHIP_*` environment variables that are set
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("KINSHIP_BIND_ADDRESS") {
            self.server.bind_address = address;
        }

        if let Ok(timeout) = std::env::var("KINSHIP_REQUEST_TIMEOUT_SECONDS") {
            self.server.request_timeout_seconds = timeout.parse()?;
        }

        if let Ok(max_visited) = std::env::var("KINSHIP_MAX_VISITED_NODES") {
            self.traversal.max_visited_nodes = max_visited.parse()?;
        }

        if let Ok(max_generations) = std::env::var("KINSHIP_MAX_GENERATIONS") {
            self.traversal.max_generations = max_generations.parse()?;
        }

        if let Ok(path) = std::env::var("KINSHIP_SNAPSHOT_PATH") {
            self.store.snapshot_path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Merge with another configuration (other takes precedence where it differs from the defaults)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        if other.server.bind_address != defaults.server.bind_address {
            self.server.bind_address = other.server.bind_address;
        }
        if other.server.request_timeout_seconds != defaults.server.request_timeout_seconds {
            self.server.request_timeout_seconds = other.server.request_timeout_seconds;
        }

        if other.traversal.max_visited_nodes != defaults.traversal.max_visited_nodes {
            self.traversal.max_visited_nodes = other.traversal.max_visited_nodes;
        }
        if other.traversal.max_generations != defaults.traversal.max_generations {
            self.traversal.max_generations = other.traversal.max_generations;
        }

        if other.charts.fan_chart_generations != defaults.charts.fan_chart_generations {
            self.charts.fan_chart_generations = other.charts.fan_chart_generations;
        }
        if other.charts.tree_chart_generations != defaults.charts.tree_chart_generations {
            self.charts.tree_chart_generations = other.charts.tree_chart_generations;
        }
        if other.charts.descendant_generations != defaults.charts.descendant_generations {
            self.charts.descendant_generations = other.charts.descendant_generations;
        }

        if other.store.snapshot_path != defaults.store.snapshot_path {
            self.store.snapshot_path = other.store.snapshot_path;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        if self.traversal.max_visited_nodes == 0 {
            return Err(anyhow::anyhow!("Traversal node limit must be greater than 0"));
        }

        let charts = [
            ("fan_chart_generations", self.charts.fan_chart_generations),
            ("tree_chart_generations", self.charts.tree_chart_generations),
            ("descendant_generations", self.charts.descendant_generations),
        ];
        for (name, generations) in charts {
            if generations > self.traversal.max_generations {
                return Err(anyhow::anyhow!(
                    "charts.{} ({}) exceeds traversal.max_generations ({})",
                    name,
                    generations,
                    self.traversal.max_generations
                ));
            }
        }

        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("Invalid bind address: {}", self.server.bind_address));
        }

        Ok(())
    }

    /// Clamp a requested generation count to the configured ceiling
    pub fn clamp_generations(&self, requested: Option<u32>, default: u32) -> u32 {
        requested
            .unwrap_or(default)
            .min(self.traversal.max_generations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_save_and_load() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();

        // Save config
        config.save_to_file(temp_file.path()).await.unwrap();

        // Load config
        let loaded_config = Config::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server.bind_address, loaded_config.server.bind_address);
        assert_eq!(config.traversal.max_visited_nodes, loaded_config.traversal.max_visited_nodes);
    }

    #[test]
    fn test_default_yaml_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(DEFAULT_CONFIG_YAML).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.server.bind_address, defaults.server.bind_address);
        assert_eq!(parsed.charts.fan_chart_generations, defaults.charts.fan_chart_generations);
        assert_eq!(parsed.store.snapshot_path, defaults.store.snapshot_path);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Test invalid timeout
        config.server.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        // Reset and test a chart deeper than the ceiling
        config = Config::default();
        config.charts.fan_chart_generations = 20;
        assert!(config.validate().is_err());

        config = Config::default();
        config.server.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base_config = Config::default();
        let mut override_config = Config::default();

        override_config.server.request_timeout_seconds = 5;
        override_config.store.snapshot_path = PathBuf::from("/data/tree.json");

        base_config.merge_with(override_config);

        assert_eq!(base_config.server.request_timeout_seconds, 5);
        assert_eq!(base_config.store.snapshot_path, PathBuf::from("/data/tree.json"));
        assert_eq!(base_config.traversal.max_generations, 12);
    }

    #[test]
    fn test_clamp_generations() {
        let config = Config::default();

        assert_eq!(config.clamp_generations(None, 5), 5);
        assert_eq!(config.clamp_generations(Some(3), 5), 3);
        assert_eq!(config.clamp_generations(Some(500), 5), 12);
    }
}

use jsontree_editor::HistoryConfig;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "jsontree.config.json";

/// jsontree configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Maximum undo levels kept by edit scripts
    #[serde(default = "default_undo_depth_limit")]
    pub undo_depth_limit: NonZeroUsize,

    /// Quiet period before a burst of edits becomes an undo step
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,
}

fn default_undo_depth_limit() -> NonZeroUsize {
    HistoryConfig::default().depth_limit
}

fn default_coalesce_window_ms() -> u64 {
    HistoryConfig::default().coalesce_window.as_millis() as u64
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = Self::path_in(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", DEFAULT_CONFIG_NAME, e))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn path_in(cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_CONFIG_NAME)
    }

    pub fn history(&self) -> HistoryConfig {
        HistoryConfig {
            depth_limit: self.undo_depth_limit,
            coalesce_window: Duration::from_millis(self.coalesce_window_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undo_depth_limit: default_undo_depth_limit(),
            coalesce_window_ms: default_coalesce_window_ms(),
        }
    }
}

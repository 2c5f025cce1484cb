use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::{CatalogKind, FlowdexConfig};

/// Loads the Flowdex configuration.
#[derive(Debug)]
pub struct ConfigLoader {
    config: FlowdexConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > FLOWDEX_CONFIG env > ~/.flowdex/flowdex.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("FLOWDEX_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flowdex")
            .join("flowdex.toml")
    }

    /// Load the config from disk, falling back to defaults.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// location is not.
    pub fn load(path: Option<&Path>) -> flowdex_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            let mut config = Self::parse(&raw, &config_path)?;
            // Relative catalog paths are relative to the file that names them
            if let Some(base) = config_path.parent() {
                config.resolve_paths(base);
            }
            config
        } else if path.is_some() {
            return Err(flowdex_core::FlowdexError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        } else {
            warn!(?config_path, "config file not found, using defaults");
            FlowdexConfig::default()
        };

        Ok(Self {
            config: Self::finish(config)?,
            config_path,
        })
    }

    /// Build a loader from an in-memory config (env overrides and validation still apply).
    pub fn from_config(config: FlowdexConfig) -> flowdex_core::Result<Self> {
        Ok(Self {
            config: Self::finish(config)?,
            config_path: PathBuf::new(),
        })
    }

    fn parse(raw: &str, path: &Path) -> flowdex_core::Result<FlowdexConfig> {
        toml::from_str::<FlowdexConfig>(raw).map_err(|e| {
            flowdex_core::FlowdexError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    fn finish(config: FlowdexConfig) -> flowdex_core::Result<FlowdexConfig> {
        // Apply environment variable overrides
        let config = Self::apply_env_overrides(config);

        // Validate config, log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(flowdex_core::FlowdexError::Config(e));
            }
        }
        Ok(config)
    }

    /// Get a snapshot of the current config.
    pub fn get(&self) -> FlowdexConfig {
        self.config.clone()
    }

    /// Path the config was (or would have been) read from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (FLOWDEX_SERVER_LISTEN, FLOWDEX_LOG_LEVEL, etc.)
    fn apply_env_overrides(mut config: FlowdexConfig) -> FlowdexConfig {
        if let Ok(v) = std::env::var("FLOWDEX_SERVER_LISTEN") {
            config.server.listen = v;
        }
        if let Ok(v) = std::env::var("FLOWDEX_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("FLOWDEX_LOG_FORMAT") {
            config.logging.format = v;
        }
        // Archive overrides target the first archive catalog only.
        let archive = config
            .catalogs
            .iter_mut()
            .find(|c| c.kind == CatalogKind::Archive);
        if let Some(archive) = archive {
            if let Ok(v) = std::env::var("FLOWDEX_ARCHIVE_DIR") {
                archive.dirs = vec![PathBuf::from(v)];
            }
            if let Ok(v) = std::env::var("FLOWDEX_MAPPING_FILE") {
                archive.mapping_file = Some(PathBuf::from(v));
            }
        }
        config
    }
}
